/// Data layer: core types, loading, caching and filtering.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Panel
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  PanelStore: read once, share Arc<Panel>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  year / province subsets, top-N ranking
///   └──────────┘
/// ```

pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
