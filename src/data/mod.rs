/// Data layer: core types, loading, normalization, filtering and summaries.
///
/// Architecture:
/// ```text
///  .xlsx / .ods / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read file → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  coerce, drop, relabel → IncidentTable (immutable)
///   └───────────┘
///        │            ┌───────┐
///        ├───────────▶│ cache │  one table per (path, sheet)
///        ▼            └───────┘
///   ┌──────────┐
///   │  filter   │  apply predicates → FilteredView
///   └──────────┘
///        │
///        ├──▶ summary  (counts, trend, ranking, awareness)
///        └──▶ export   (CSV)
/// ```

pub mod cache;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod summary;
