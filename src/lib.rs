pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod state;
pub mod ui;

// Re-exports for library users
pub use config::{Args, DashboardConfig};
pub use data::aggregate::DashboardViews;
pub use data::filter::{DateRange, Dimension, FilterState, ToggleOutcome};
pub use data::model::{Dataset, Metric, Record, TenureCategory};
pub use state::AppState;
