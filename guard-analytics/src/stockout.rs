//! Lead-time-aware stock-out prediction.

/// Days a restock order takes to arrive when the caller does not say.
pub const DEFAULT_LEAD_TIME_DAYS: f64 = 7.0;

/// Predict the days until effective stock-out for one item.
///
/// Returns `None` when `avg_daily_sales <= 0`: with no demand signal
/// there is nothing to divide by. Otherwise the raw runway
/// `current_stock / avg_daily_sales` is shifted earlier by the supplier
/// lead time and truncated toward zero. A negative result means the item
/// is already past its reorder point.
pub fn predict_stock_out_days(
    current_stock: f64,
    avg_daily_sales: f64,
    lead_time_days: f64,
) -> Option<i64> {
    if avg_daily_sales <= 0.0 {
        return None;
    }
    let days_left = current_stock / avg_daily_sales;
    Some((days_left - lead_time_days).trunc() as i64)
}
