/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet          .geojson
///        │                              │
///        ▼                              ▼
///   ┌──────────┐                  ┌──────────┐
///   │  loader   │ derive records   │   geo     │ project + hit-test
///   └──────────┘                  └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, unique values per dimension
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterState predicate → visible records
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  bars / timeline / districts / stacked pivot
///   └───────────┘
/// ```

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod geo;
pub mod loader;
pub mod model;
