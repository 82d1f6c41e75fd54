//! Data cleaning.
//!
//! Runs after normalization and before any analysis:
//!   1. drop rows with no product name (dates are guaranteed present by
//!      the normalizer, so the name check is the only row drop left),
//!   2. fill missing `Units_Sold` with 0,
//!   3. forward-fill missing `Stock_Remaining` per (product, warehouse)
//!      group in date order,
//!   4. derive `Blocked_Value = Stock_Remaining * Cost_Price`.
//!
//! The fill is chronological within each group rather than dependent on
//! the upload's row order, and the blocked value is computed after the
//! fill. A group whose earliest rows have no stock value keeps `None`
//! there, since nothing earlier exists to fill from.

use std::collections::HashMap;

use crate::types::Dataset;

type GroupKey = (String, Option<String>);

/// Clean a normalized dataset in place and return it.
pub fn clean(mut dataset: Dataset) -> Dataset {
    // Row drop, applied to records and the aligned passthrough columns.
    let keep: Vec<bool> = dataset
        .records
        .iter()
        .map(|r| r.product_name.is_some())
        .collect();
    let mut keep_iter = keep.iter();
    dataset.records.retain(|_| *keep_iter.next().unwrap_or(&false));
    for column in &mut dataset.extra_columns {
        let mut keep_iter = keep.iter();
        column.values.retain(|_| *keep_iter.next().unwrap_or(&false));
    }

    for record in &mut dataset.records {
        if record.units_sold.is_none() {
            record.units_sold = Some(0.0);
        }
    }

    forward_fill_stock(&mut dataset);

    for record in &mut dataset.records {
        record.blocked_value = match (record.stock_remaining, record.cost_price) {
            (Some(stock), Some(cost)) => Some(stock * cost),
            _ => None,
        };
    }

    dataset
}

/// Forward-fill `stock_remaining` within each (product, warehouse) group,
/// walking the group's rows in ascending date order. Original row order of
/// the dataset is left untouched.
fn forward_fill_stock(dataset: &mut Dataset) {
    let mut groups: HashMap<GroupKey, Vec<usize>> = HashMap::new();
    for (idx, record) in dataset.records.iter().enumerate() {
        let Some(product) = record.product_name.clone() else {
            continue;
        };
        groups
            .entry((product, record.warehouse.clone()))
            .or_default()
            .push(idx);
    }

    for indices in groups.values_mut() {
        // Stable sort keeps upload order among same-day rows.
        indices.sort_by_key(|&idx| dataset.records[idx].date);
        let mut last: Option<f64> = None;
        for &idx in indices.iter() {
            match dataset.records[idx].stock_remaining {
                Some(stock) => last = Some(stock),
                None => dataset.records[idx].stock_remaining = last,
            }
        }
    }
}
