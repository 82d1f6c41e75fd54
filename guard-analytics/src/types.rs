use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// One normalized sales/inventory row.
///
/// Produced by `schema::normalize`. Required columns are guaranteed present
/// at the column level; individual cells may still be missing, which is why
/// most fields are `Option`. `date` is never missing: a dataset with any
/// unparseable date is rejected wholesale during normalization.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub warehouse: Option<String>,
    pub supplier: Option<String>,
    pub units_sold: Option<f64>,
    pub stock_remaining: Option<f64>,
    pub restock_units: Option<f64>,
    pub cost_price: Option<f64>,
    /// Stock value tied up on this row (`stock_remaining * cost_price`).
    /// Populated by the cleaner after stock forward-fill.
    pub blocked_value: Option<f64>,
}

/// A column that was not recognized by the alias table and passed through
/// normalization untouched. Values stay aligned with `Dataset::records`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExtraColumn {
    pub name: String,
    pub values: Vec<Option<String>>,
}

/// A normalized tabular dataset for one analysis session.
///
/// The presence flags record whether the optional columns existed in the
/// upload at all. When a column was absent, every record carries `None` for
/// that field, and column-dependent stages (e.g. the supplier aggregator)
/// short-circuit to an empty result.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Dataset {
    pub records: Vec<SalesRecord>,
    pub has_warehouse: bool,
    pub has_supplier: bool,
    pub has_restock: bool,
    pub extra_columns: Vec<ExtraColumn>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

// ---------------------------------------------------------------------------
// Classification results
// ---------------------------------------------------------------------------

/// Inventory health status of a (product, warehouse) group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum StockStatus {
    #[serde(rename = "Dead Stock")]
    DeadStock,
    #[serde(rename = "Slow Moving")]
    SlowMoving,
    Healthy,
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockStatus::DeadStock => write!(f, "Dead Stock"),
            StockStatus::SlowMoving => write!(f, "Slow Moving"),
            StockStatus::Healthy => write!(f, "Healthy"),
        }
    }
}

/// One row of classifier output per (product, warehouse) group.
#[derive(Clone, Debug, Serialize)]
pub struct StockStatusResult {
    pub product: String,
    pub warehouse: Option<String>,
    pub category: Option<String>,
    /// Units sold in the trailing window over average inventory, 2 decimals.
    pub inventory_turnover: f64,
    /// Window sales divided by the fixed window length, 2 decimals.
    pub avg_daily_sales: f64,
    /// Latest `stock_remaining` of the group, truncated to an integer.
    pub current_stock: i64,
    /// `current_stock * latest cost_price`, truncated to an integer.
    pub blocked_value: i64,
    /// Days until effective stock-out, lead-time adjusted. `None` when there
    /// is no demand signal; negative when already past the reorder point.
    pub days_to_stockout: Option<i64>,
    pub status: StockStatus,
}

// ---------------------------------------------------------------------------
// Forecast / supplier / quality results
// ---------------------------------------------------------------------------

/// One forecasted day of demand.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    /// May be negative: the trend model is not clamped.
    pub forecasted_units: f64,
}

/// Restock aggregates for one supplier.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SupplierSummary {
    pub supplier: String,
    pub total_restock_units: f64,
    /// Count of restock events with positive units.
    pub purchase_orders: usize,
}

/// Summary diagnostics over a cleaned dataset. Ephemeral, never persisted.
#[derive(Clone, Debug, Serialize)]
pub struct QualityReport {
    pub missing_per_column: BTreeMap<String, usize>,
    pub negative_units_sold: usize,
    pub negative_stock_remaining: usize,
    /// Fraction of rows with zero units sold, 2 decimals.
    pub zero_sales_ratio: f64,
}

// ---------------------------------------------------------------------------
// Analysis options
// ---------------------------------------------------------------------------

/// Tunables for the classification stage.
#[derive(Clone, Copy, Debug)]
pub struct AnalysisOptions {
    /// Length of the trailing sales window in days.
    pub window_days: i64,
    /// Supplier lead time used to shift the stock-out horizon.
    pub lead_time_days: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            window_days: 60,
            lead_time_days: crate::stockout::DEFAULT_LEAD_TIME_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_status_displays_canonical_names() {
        assert_eq!(StockStatus::DeadStock.to_string(), "Dead Stock");
        assert_eq!(StockStatus::SlowMoving.to_string(), "Slow Moving");
        assert_eq!(StockStatus::Healthy.to_string(), "Healthy");
    }

    #[test]
    fn stock_status_serializes_with_spaces() {
        let json = serde_json::to_string(&StockStatus::DeadStock).unwrap();
        assert_eq!(json, "\"Dead Stock\"");
    }

    #[test]
    fn default_options_match_documented_defaults() {
        let opts = AnalysisOptions::default();
        assert_eq!(opts.window_days, 60);
        assert!((opts.lead_time_days - 7.0).abs() < f64::EPSILON);
    }
}
