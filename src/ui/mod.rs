//! Rendering collaborators: each view reads the aggregates cached in
//! [`crate::state::AppState`] and owns no filtering logic.

pub mod charts;
pub mod map;
pub mod panels;
pub mod timeline;
