/// Data layer: core types, ingestion, cleaning, aggregation and export.
///
/// Architecture:
/// ```text
///  .xlsx / .xls / .ods / .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse bytes → raw Dataset (category label attached)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ pipeline  │  normalize → timestamp → chronological sort
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  column selections + date range → filtered Dataset
///   └──────────┘
///        │
///        ├──────────────┬──────────────┐
///        ▼              ▼              ▼
///   ┌──────────┐  ┌──────────┐  ┌──────────┐
///   │ aggregate │  │  stats    │  │  export   │
///   └──────────┘  └──────────┘  └──────────┘
///   daily means    summaries     csv / xlsx / json
/// ```

pub mod aggregate;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod stats;
pub mod timestamp;
