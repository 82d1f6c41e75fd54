//! Short-horizon demand forecasting.
//!
//! Aggregates a filtered slice of cleaned records into a daily sales
//! series and fits an additive-trend, no-seasonality exponential
//! smoothing model (Holt's linear method), projecting the next 30 days.
//!
//! The forecaster fails soft: an empty slice, fewer than 30 distinct
//! sale-days, or a degenerate fit all return `None`. One bad slice must
//! never take down the rest of an analysis.

use std::collections::BTreeMap;

use chrono::Duration;
use tracing::debug;

use crate::types::{ForecastPoint, SalesRecord};

/// Number of days projected ahead.
pub const FORECAST_HORIZON_DAYS: usize = 30;
/// Minimum distinct days of history the model needs to be meaningful.
pub const MIN_OBSERVATIONS: usize = 30;

/// Smoothing-parameter grid: 0.05, 0.10, .. 0.95 for both alpha and beta.
const GRID_STEPS: usize = 19;
const GRID_STEP_SIZE: f64 = 0.05;

/// Forecast the next 30 days of demand for a slice of records.
///
/// Duplicate same-day rows are summed before fitting. Forecast dates are
/// the 30 consecutive calendar days after the last observed date. Values
/// are not clamped: a falling trend may legitimately project negatives.
pub fn forecast_next_30_days(records: &[SalesRecord]) -> Option<Vec<ForecastPoint>> {
    if records.is_empty() {
        return None;
    }

    // Aggregate daily sales; BTreeMap keeps the series date-ascending.
    let mut daily: BTreeMap<chrono::NaiveDate, f64> = BTreeMap::new();
    for record in records {
        *daily.entry(record.date).or_insert(0.0) += record.units_sold.unwrap_or(0.0);
    }

    if daily.len() < MIN_OBSERVATIONS {
        debug!(
            observations = daily.len(),
            required = MIN_OBSERVATIONS,
            "not enough history to forecast"
        );
        return None;
    }

    let series: Vec<f64> = daily.values().copied().collect();
    let last_date = *daily.keys().next_back()?;

    let (level, trend) = fit_holt(&series)?;

    Some(
        (1..=FORECAST_HORIZON_DAYS)
            .map(|h| ForecastPoint {
                date: last_date + Duration::days(h as i64),
                forecasted_units: level + h as f64 * trend,
            })
            .collect(),
    )
}

/// Fit Holt's linear method by grid search over the smoothing parameters,
/// minimizing one-step-ahead squared error. Returns the final (level,
/// trend) state of the best fit, or `None` when every candidate fit
/// degenerates (the fail-soft path).
fn fit_holt(series: &[f64]) -> Option<(f64, f64)> {
    let mut best: Option<(f64, f64, f64)> = None; // (sse, level, trend)

    for a in 1..=GRID_STEPS {
        let alpha = a as f64 * GRID_STEP_SIZE;
        for b in 1..=GRID_STEPS {
            let beta = b as f64 * GRID_STEP_SIZE;
            let Some((sse, level, trend)) = smooth(series, alpha, beta) else {
                continue;
            };
            if best.map_or(true, |(best_sse, _, _)| sse < best_sse) {
                best = Some((sse, level, trend));
            }
        }
    }

    best.map(|(_, level, trend)| (level, trend))
}

/// Run one exponential-smoothing pass. Level starts at the first
/// observation and trend at the first difference.
fn smooth(series: &[f64], alpha: f64, beta: f64) -> Option<(f64, f64, f64)> {
    let mut level = *series.first()?;
    let mut trend = series.get(1)? - level;
    let mut sse = 0.0;

    for &observed in &series[1..] {
        let one_step = level + trend;
        let err = observed - one_step;
        sse += err * err;

        let prev_level = level;
        level = alpha * observed + (1.0 - alpha) * (level + trend);
        trend = beta * (level - prev_level) + (1.0 - beta) * trend;
    }

    if sse.is_finite() && level.is_finite() && trend.is_finite() {
        Some((sse, level, trend))
    } else {
        None
    }
}
