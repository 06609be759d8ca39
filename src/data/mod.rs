/// Data layer: core types, loading, cleaning, aggregation and export.
///
/// Architecture:
/// ```text
///  .xlsx / .ods / .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse sheet → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean   │  drop sentinel rows, fix labels → cleaned Dataset
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌──────────┐   ┌──────────┐
///   │  stats   │   │  plot    │  raw points + GroupStats
///   └──────────┘   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export  │  Dataset / GroupStats → .xlsx
///   └──────────┘
/// ```

pub mod clean;
pub mod export;
pub mod loader;
pub mod model;
pub mod stats;
