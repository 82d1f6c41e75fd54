//! Data quality diagnostics.
//!
//! Read-only summary over the cleaned dataset: missing-value counts per
//! column (canonical and passthrough), negative-value counts, and the
//! zero-sales ratio. Nothing here mutates or persists anything.

use std::collections::BTreeMap;

use crate::types::{Dataset, QualityReport, SalesRecord};
use crate::util::round2;

fn count_where<F: Fn(&SalesRecord) -> bool>(records: &[SalesRecord], f: F) -> usize {
    records.iter().filter(|&r| f(r)).count()
}

/// Compute the quality drilldown for a dataset.
pub fn data_quality(dataset: &Dataset) -> QualityReport {
    let records = &dataset.records;
    let count_missing = |f: fn(&SalesRecord) -> bool| count_where(records, f);

    let mut missing_per_column = BTreeMap::new();
    // Date cells are guaranteed by normalization; the count is always 0
    // but the column is reported for completeness.
    missing_per_column.insert("Date".to_string(), 0);
    missing_per_column.insert(
        "Product_Name".to_string(),
        count_missing(|r| r.product_name.is_none()),
    );
    missing_per_column.insert(
        "Category".to_string(),
        count_missing(|r| r.category.is_none()),
    );
    missing_per_column.insert(
        "Warehouse".to_string(),
        count_missing(|r| r.warehouse.is_none()),
    );
    missing_per_column.insert(
        "Supplier".to_string(),
        count_missing(|r| r.supplier.is_none()),
    );
    missing_per_column.insert(
        "Units_Sold".to_string(),
        count_missing(|r| r.units_sold.is_none()),
    );
    missing_per_column.insert(
        "Stock_Remaining".to_string(),
        count_missing(|r| r.stock_remaining.is_none()),
    );
    missing_per_column.insert(
        "Restock_Units".to_string(),
        count_missing(|r| r.restock_units.is_none()),
    );
    missing_per_column.insert(
        "Cost_Price".to_string(),
        count_missing(|r| r.cost_price.is_none()),
    );
    missing_per_column.insert(
        "Blocked_Value".to_string(),
        count_missing(|r| r.blocked_value.is_none()),
    );
    for column in &dataset.extra_columns {
        missing_per_column.insert(
            column.name.clone(),
            column.values.iter().filter(|v| v.is_none()).count(),
        );
    }

    let negative_units_sold = records
        .iter()
        .filter(|r| matches!(r.units_sold, Some(u) if u < 0.0))
        .count();
    let negative_stock_remaining = records
        .iter()
        .filter(|r| matches!(r.stock_remaining, Some(s) if s < 0.0))
        .count();

    let zero_sales = records
        .iter()
        .filter(|r| matches!(r.units_sold, Some(u) if u == 0.0))
        .count();
    let zero_sales_ratio = if records.is_empty() {
        0.0
    } else {
        round2(zero_sales as f64 / records.len() as f64)
    };

    QualityReport {
        missing_per_column,
        negative_units_sold,
        negative_stock_remaining,
        zero_sales_ratio,
    }
}
