//! The inventory health pipeline.
//!
//! Wires the analysis stages over one cleaned dataset:
//!
//! 1. Dead-stock classifier over every (product, warehouse) group
//! 2. Supplier restock aggregation
//! 3. Data quality drilldown
//!
//! Demand forecasting is deliberately not part of this fan-out: it runs
//! per filtered slice (one product/warehouse combination) on request, so
//! the caller invokes `forecast::forecast_next_30_days` directly with the
//! slice it cares about.
//!
//! Every stage is a pure function of the dataset. The pipeline holds no
//! state, so an outer layer can memoize whole reports keyed by a content
//! fingerprint of the input table.

use tracing::info;

use crate::classifier::detect_dead_stock;
use crate::quality::data_quality;
use crate::supplier::supplier_metrics;
use crate::types::{
    AnalysisOptions, Dataset, QualityReport, StockStatus, StockStatusResult, SupplierSummary,
};

/// Everything one analysis invocation produces.
#[derive(Clone, Debug, serde::Serialize)]
pub struct InventoryHealthReport {
    pub stock_status: Vec<StockStatusResult>,
    pub suppliers: Vec<SupplierSummary>,
    pub quality: QualityReport,
}

/// The four headline metrics of a report.
#[derive(Clone, Copy, Debug, Default, serde::Serialize)]
pub struct ReportSummary {
    pub dead_stock_items: usize,
    pub slow_moving_items: usize,
    pub healthy_items: usize,
    /// Value tied up in dead stock.
    pub money_blocked: i64,
}

/// Run the full analysis over a cleaned dataset.
pub fn analyze(dataset: &Dataset, options: &AnalysisOptions) -> InventoryHealthReport {
    info!(
        rows = dataset.len(),
        window_days = options.window_days,
        lead_time_days = options.lead_time_days,
        "running inventory health analysis"
    );

    InventoryHealthReport {
        stock_status: detect_dead_stock(dataset, options.window_days, options.lead_time_days),
        suppliers: supplier_metrics(dataset),
        quality: data_quality(dataset),
    }
}

/// Condense classifier output into the headline metrics.
pub fn summarize(results: &[StockStatusResult]) -> ReportSummary {
    let mut summary = ReportSummary::default();
    for result in results {
        match result.status {
            StockStatus::DeadStock => {
                summary.dead_stock_items += 1;
                summary.money_blocked += result.blocked_value;
            }
            StockStatus::SlowMoving => summary.slow_moving_items += 1,
            StockStatus::Healthy => summary.healthy_items += 1,
        }
    }
    summary
}

/// Split classifier output into one sub-report per distinct warehouse,
/// in warehouse encounter order. Rows without a warehouse value are not
/// part of any sub-report, mirroring how the per-warehouse exports in
/// the reporting layer behave.
pub fn partition_by_warehouse(
    results: &[StockStatusResult],
) -> Vec<(String, Vec<StockStatusResult>)> {
    let mut partitions: Vec<(String, Vec<StockStatusResult>)> = Vec::new();
    for result in results {
        let Some(warehouse) = result.warehouse.clone() else {
            continue;
        };
        match partitions.iter_mut().find(|(name, _)| *name == warehouse) {
            Some((_, rows)) => rows.push(result.clone()),
            None => partitions.push((warehouse, vec![result.clone()])),
        }
    }
    partitions
}
