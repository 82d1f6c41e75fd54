//! Dead-stock classification over (product, warehouse) groups.
//!
//! Partitions the cleaned dataset into inventory groups, computes a
//! trailing-window turnover for each, classifies it as Dead Stock, Slow
//! Moving or Healthy, and attaches a lead-time-aware stock-out prediction.
//!
//! The window cutoff is anchored to the latest date in the whole dataset,
//! not per group, so a product that stopped selling months ago has an
//! empty window and surfaces as dead rather than quietly using its own
//! stale cutoff.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use tracing::debug;

use crate::stockout::predict_stock_out_days;
use crate::types::{Dataset, SalesRecord, StockStatus, StockStatusResult};
use crate::util::round2;

// ---------------------------------------------------------------------------
// Classification thresholds
// ---------------------------------------------------------------------------

/// Turnover below which stocked items count as dead.
pub const DEAD_STOCK_MAX_TURNOVER: f64 = 0.2;
/// Turnover below which items count as slow moving.
pub const SLOW_MOVING_MAX_TURNOVER: f64 = 0.5;
/// Length of the trailing sales window in days.
pub const DEFAULT_WINDOW_DAYS: i64 = 60;

/// Classify every (product, warehouse) group in the dataset.
///
/// Output order is group encounter order: the first row mentioning a group
/// fixes its position. Groups are classified in parallel, which cannot
/// change that order because each group maps to exactly one output slot.
pub fn detect_dead_stock(
    dataset: &Dataset,
    days: i64,
    lead_time_days: f64,
) -> Vec<StockStatusResult> {
    let Some(latest_date) = dataset.records.iter().map(|r| r.date).max() else {
        return Vec::new();
    };
    let cutoff = latest_date - Duration::days(days);

    // Group row indices by (product, warehouse) in encounter order.
    let mut order: Vec<(String, Option<String>)> = Vec::new();
    let mut groups: HashMap<(String, Option<String>), Vec<usize>> = HashMap::new();
    for (idx, record) in dataset.records.iter().enumerate() {
        let Some(product) = record.product_name.clone() else {
            continue;
        };
        let key = (product, record.warehouse.clone());
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key.clone());
                Vec::new()
            })
            .push(idx);
    }

    debug!(
        groups = order.len(),
        rows = dataset.records.len(),
        window_days = days,
        "classifying inventory groups"
    );

    order
        .par_iter()
        .map(|key| {
            let indices = &groups[key];
            classify_group(&dataset.records, key, indices, cutoff, days, lead_time_days)
        })
        .collect()
}

/// Classify a single inventory group.
fn classify_group(
    records: &[SalesRecord],
    key: &(String, Option<String>),
    indices: &[usize],
    cutoff: NaiveDate,
    days: i64,
    lead_time_days: f64,
) -> StockStatusResult {
    let mut sorted: Vec<&SalesRecord> = indices.iter().map(|&idx| &records[idx]).collect();
    sorted.sort_by_key(|r| r.date);

    let recent: Vec<&SalesRecord> = sorted.iter().filter(|r| r.date >= cutoff).copied().collect();

    let total_sales: f64 = recent.iter().map(|r| r.units_sold.unwrap_or(0.0)).sum();
    let avg_daily_sales = if days > 0 {
        total_sales / days as f64
    } else {
        0.0
    };

    // Average of the window's opening and closing stock. An empty window,
    // or one whose boundary rows have no stock value, yields no average
    // and therefore zero turnover.
    let opening_stock = recent.first().and_then(|r| r.stock_remaining);
    let closing_stock = recent.last().and_then(|r| r.stock_remaining);
    let avg_inventory = match (opening_stock, closing_stock) {
        (Some(open), Some(close)) => Some((open + close) / 2.0),
        _ => None,
    };

    let turnover = match avg_inventory {
        Some(avg) if avg > 0.0 => total_sales / avg,
        _ => 0.0,
    };

    // Current state comes from the latest row of the full group, not just
    // the window: an item with no recent sales still has real stock.
    let latest = sorted.last();
    let current_stock = latest.and_then(|r| r.stock_remaining).unwrap_or(0.0);
    let category = latest.and_then(|r| r.category.clone());
    let cost_price = latest.and_then(|r| r.cost_price).unwrap_or(0.0);

    // Order matters: a low-turnover item that sold out is slow moving,
    // not dead, because it has no stock left to be dead.
    let status = if turnover < DEAD_STOCK_MAX_TURNOVER && current_stock > 0.0 {
        StockStatus::DeadStock
    } else if turnover < SLOW_MOVING_MAX_TURNOVER {
        StockStatus::SlowMoving
    } else {
        StockStatus::Healthy
    };

    let days_to_stockout = predict_stock_out_days(current_stock, avg_daily_sales, lead_time_days);

    StockStatusResult {
        product: key.0.clone(),
        warehouse: key.1.clone(),
        category,
        inventory_turnover: round2(turnover),
        avg_daily_sales: round2(avg_daily_sales),
        current_stock: current_stock.trunc() as i64,
        blocked_value: (current_stock * cost_price).trunc() as i64,
        days_to_stockout,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(n)
    }

    fn row(
        date: NaiveDate,
        product: &str,
        warehouse: Option<&str>,
        units: f64,
        stock: f64,
        cost: f64,
    ) -> SalesRecord {
        SalesRecord {
            date,
            product_name: Some(product.to_string()),
            category: Some("Textile".into()),
            warehouse: warehouse.map(str::to_string),
            supplier: None,
            units_sold: Some(units),
            stock_remaining: Some(stock),
            restock_units: None,
            cost_price: Some(cost),
            blocked_value: Some(stock * cost),
        }
    }

    fn dataset(records: Vec<SalesRecord>) -> Dataset {
        Dataset {
            has_warehouse: records.iter().any(|r| r.warehouse.is_some()),
            records,
            ..Dataset::default()
        }
    }

    /// 90 days of steady sales: 5 units/day, constant stock 500, cost 450.
    fn cotton_shirt_steady() -> Dataset {
        let records = (0..90)
            .map(|n| row(day(n), "Cotton Shirt", Some("Ahmedabad_WH"), 5.0, 500.0, 450.0))
            .collect();
        dataset(records)
    }

    #[test]
    fn steady_seller_is_healthy() {
        let results = detect_dead_stock(&cotton_shirt_steady(), 60, 7.0);
        assert_eq!(results.len(), 1);
        let r = &results[0];
        // 61 rows fall in the inclusive 60-day window: days 29..=89.
        // total = 305, avg_daily = 305/60 = 5.08, turnover = 305/500 = 0.61
        assert_eq!(r.status, StockStatus::Healthy);
        assert!((r.avg_daily_sales - 5.08).abs() < 0.01);
        assert!((r.inventory_turnover - 0.61).abs() < 0.01);
        assert_eq!(r.current_stock, 500);
        assert_eq!(r.blocked_value, 500 * 450);
        // 500 / 5.083 - 7 = 91.36 -> 91
        assert_eq!(r.days_to_stockout, Some(91));
    }

    #[test]
    fn steady_seller_matches_reference_numbers_with_exclusive_window() {
        // The canonical worked example: exactly 60 in-window days of 5
        // units/day gives total 300, avg 5.0, turnover 0.6, stock-out 93.
        let mut records: Vec<SalesRecord> = (0..60)
            .map(|n| row(day(n + 30), "Cotton Shirt", Some("Ahmedabad_WH"), 5.0, 500.0, 450.0))
            .collect();
        // Anchor row far in the past so the dataset spans 90 days but only
        // 60 rows fall inside the window.
        records.push(row(day(0), "Anchor", None, 0.0, 1.0, 1.0));
        let results = detect_dead_stock(&dataset(records), 60, 7.0);
        let shirt = results
            .iter()
            .find(|r| r.product == "Cotton Shirt")
            .unwrap();
        assert!((shirt.avg_daily_sales - 5.0).abs() < 0.01);
        assert!((shirt.inventory_turnover - 0.6).abs() < 0.01);
        assert_eq!(shirt.status, StockStatus::Healthy);
        assert_eq!(shirt.blocked_value, 225_000);
        assert_eq!(shirt.days_to_stockout, Some(93));
    }

    #[test]
    fn zero_sales_with_stock_is_dead() {
        let records = (0..60)
            .map(|n| row(day(n), "Cotton Shirt", Some("Ahmedabad_WH"), 0.0, 500.0, 450.0))
            .collect();
        let results = detect_dead_stock(&dataset(records), 60, 7.0);
        let r = &results[0];
        assert_eq!(r.status, StockStatus::DeadStock);
        assert_eq!(r.inventory_turnover, 0.0);
        assert_eq!(r.avg_daily_sales, 0.0);
        assert_eq!(r.days_to_stockout, None);
        assert_eq!(r.blocked_value, 225_000);
    }

    #[test]
    fn sold_out_low_turnover_is_slow_moving_not_dead() {
        // Turnover under 0.2 but nothing left on the shelf: it sold out.
        let records = vec![
            row(day(0), "Shirt", None, 1.0, 20.0, 10.0),
            row(day(30), "Shirt", None, 0.0, 0.0, 10.0),
        ];
        let results = detect_dead_stock(&dataset(records), 60, 7.0);
        let r = &results[0];
        assert!(r.inventory_turnover < DEAD_STOCK_MAX_TURNOVER);
        assert_eq!(r.current_stock, 0);
        assert_eq!(r.status, StockStatus::SlowMoving);
    }

    #[test]
    fn mid_range_turnover_is_slow_moving() {
        // total 18 over 60 days against avg inventory 60: turnover 0.3.
        let records = (0..60)
            .map(|n| row(day(n), "Shirt", None, 0.3, 60.0, 10.0))
            .collect();
        let results = detect_dead_stock(&dataset(records), 60, 7.0);
        assert_eq!(results[0].status, StockStatus::SlowMoving);
    }

    #[test]
    fn window_cutoff_is_shared_across_groups() {
        // "Old" last sold 100 days before "Fresh"'s latest date, so the
        // shared cutoff leaves Old's window empty: no sales, zero
        // turnover, stock on hand -> dead.
        let mut records = vec![row(day(0), "Old", None, 10.0, 50.0, 5.0)];
        records.extend((95..101).map(|n| row(day(n), "Fresh", None, 10.0, 50.0, 5.0)));
        let results = detect_dead_stock(&dataset(records), 60, 7.0);
        let old = results.iter().find(|r| r.product == "Old").unwrap();
        assert_eq!(old.inventory_turnover, 0.0);
        assert_eq!(old.status, StockStatus::DeadStock);
        // Stock and value still come from the group's own latest row.
        assert_eq!(old.current_stock, 50);
        assert_eq!(old.blocked_value, 250);
        let fresh = results.iter().find(|r| r.product == "Fresh").unwrap();
        assert_ne!(fresh.status, StockStatus::DeadStock);
    }

    #[test]
    fn same_product_splits_per_warehouse() {
        let records = vec![
            row(day(0), "Shirt", Some("A"), 50.0, 100.0, 10.0),
            row(day(1), "Shirt", Some("B"), 0.0, 100.0, 10.0),
        ];
        let results = detect_dead_stock(&dataset(records), 60, 7.0);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].warehouse.as_deref(), Some("A"));
        assert_eq!(results[1].warehouse.as_deref(), Some("B"));
    }

    #[test]
    fn missing_warehouse_column_is_one_implicit_group() {
        let records = vec![
            row(day(0), "Shirt", None, 5.0, 100.0, 10.0),
            row(day(1), "Shirt", None, 5.0, 95.0, 10.0),
        ];
        let results = detect_dead_stock(&dataset(records), 60, 7.0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].warehouse, None);
    }

    #[test]
    fn output_preserves_group_encounter_order() {
        let records = vec![
            row(day(0), "Zebra Mug", None, 5.0, 10.0, 1.0),
            row(day(0), "Apple Bowl", None, 5.0, 10.0, 1.0),
            row(day(1), "Zebra Mug", None, 5.0, 5.0, 1.0),
            row(day(0), "Mid Plate", None, 5.0, 10.0, 1.0),
        ];
        let results = detect_dead_stock(&dataset(records), 60, 7.0);
        let names: Vec<&str> = results.iter().map(|r| r.product.as_str()).collect();
        assert_eq!(names, vec!["Zebra Mug", "Apple Bowl", "Mid Plate"]);
    }

    #[test]
    fn category_and_cost_come_from_latest_row() {
        let mut early = row(day(0), "Shirt", None, 5.0, 100.0, 10.0);
        early.category = Some("Old Category".into());
        let mut late = row(day(5), "Shirt", None, 5.0, 90.0, 20.0);
        late.category = Some("New Category".into());
        let results = detect_dead_stock(&dataset(vec![early, late]), 60, 7.0);
        assert_eq!(results[0].category.as_deref(), Some("New Category"));
        assert_eq!(results[0].blocked_value, 90 * 20);
    }

    #[test]
    fn empty_dataset_yields_no_results() {
        assert!(detect_dead_stock(&Dataset::default(), 60, 7.0).is_empty());
    }

    #[test]
    fn every_group_gets_exactly_one_status() {
        let results = detect_dead_stock(&cotton_shirt_steady(), 60, 7.0);
        for r in &results {
            // Exhaustiveness of the enum is the partition guarantee; the
            // dead-stock arm additionally requires stock on hand.
            if r.status == StockStatus::DeadStock {
                assert!(r.current_stock > 0);
            }
        }
    }
}
