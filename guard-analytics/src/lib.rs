//! Inventory health analytics for sales/stock CSV uploads.
//!
//! The crate takes a messy retail CSV and turns it into a structured
//! health report: dead-stock and slow-mover classification per
//! (product, warehouse) group, lead-time-adjusted stock-out predictions,
//! per-supplier restock aggregates, a data quality drilldown, and an
//! optional 30-day demand forecast per product slice.
//!
//! The flow is a fixed, synchronous pipeline:
//!
//! 1. `loader` reads the raw CSV into an untyped table
//! 2. `schema` maps header aliases onto the canonical column set and
//!    parses cells, rejecting structurally broken uploads
//! 3. `cleaning` drops unusable rows, forward-fills stock per group,
//!    and derives blocked value
//! 4. `pipeline` fans out into the classifier, supplier, and quality
//!    stages over the cleaned dataset
//!
//! Everything is in-memory and deterministic: the same upload and the
//! same options always produce the same report, row for row.

pub mod classifier;
pub mod cleaning;
pub mod forecast;
pub mod loader;
pub mod pipeline;
pub mod quality;
pub mod schema;
pub mod stockout;
pub mod supplier;
pub mod types;
pub mod util;

pub use classifier::{
    detect_dead_stock, DEAD_STOCK_MAX_TURNOVER, DEFAULT_WINDOW_DAYS, SLOW_MOVING_MAX_TURNOVER,
};
pub use cleaning::clean;
pub use forecast::{forecast_next_30_days, FORECAST_HORIZON_DAYS, MIN_OBSERVATIONS};
pub use loader::{load_csv, load_csv_file, sample_csv, RawTable};
pub use pipeline::{analyze, partition_by_warehouse, summarize, InventoryHealthReport, ReportSummary};
pub use quality::data_quality;
pub use schema::{normalize, SchemaError};
pub use stockout::{predict_stock_out_days, DEFAULT_LEAD_TIME_DAYS};
pub use supplier::supplier_metrics;
pub use types::{
    AnalysisOptions, Dataset, ForecastPoint, QualityReport, SalesRecord, StockStatus,
    StockStatusResult, SupplierSummary,
};
