use std::env;
use std::fs;
use std::process;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use guard_analytics::pipeline::{analyze, partition_by_warehouse, summarize, ReportSummary};
use guard_analytics::types::{
    AnalysisOptions, Dataset, ForecastPoint, SalesRecord, StockStatus, StockStatusResult,
};
use guard_analytics::{clean, forecast_next_30_days, load_csv, normalize, sample_csv, SchemaError};

// ---------------------------------------------------------------------------
// JSON output contract
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct DigestJson {
    generated_at: String,
    /// SHA-256 of the raw upload bytes. Identical uploads always produce
    /// identical reports, so this doubles as a cache key.
    input_fingerprint: String,
    rows_analyzed: usize,
    window_days: i64,
    lead_time_days: f64,
    analysis_ms: u128,
    summary: ReportSummary,
    stock_status: Vec<StockStatusResult>,
    suppliers: Vec<guard_analytics::SupplierSummary>,
    quality: guard_analytics::QualityReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouses: Option<Vec<WarehouseJson>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    forecast: Option<ForecastJson>,
}

#[derive(Serialize)]
struct WarehouseJson {
    warehouse: String,
    summary: ReportSummary,
    stock_status: Vec<StockStatusResult>,
}

#[derive(Serialize)]
struct ForecastJson {
    product: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouse: Option<String>,
    /// `None` when the slice has under 30 distinct sale-days.
    points: Option<Vec<ForecastPoint>>,
}

// ---------------------------------------------------------------------------
// Human-readable output
// ---------------------------------------------------------------------------

/// Format an integer with comma thousands separators.
fn format_thousands(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let s = amount.unsigned_abs().to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    format!("{}{}", sign, result.chars().rev().collect::<String>())
}

fn status_icon(status: &StockStatus) -> &'static str {
    match status {
        StockStatus::DeadStock => "!!",
        StockStatus::SlowMoving => "! ",
        StockStatus::Healthy => "  ",
    }
}

fn print_status_rows(rows: &[StockStatusResult]) {
    for (i, r) in rows.iter().enumerate() {
        let location = r.warehouse.as_deref().unwrap_or("-");
        let stockout = match r.days_to_stockout {
            Some(d) => format!("{}d", d),
            None => "-".into(),
        };
        println!(
            "  {} {}. {:24} {:14} {:11} turn {:>5.2}  {:>6.2}/day  stock {:>8}  blocked {:>12}  out {:>6}",
            status_icon(&r.status),
            i + 1,
            r.product,
            location,
            r.status.to_string(),
            r.inventory_turnover,
            r.avg_daily_sales,
            format_thousands(r.current_stock),
            format_thousands(r.blocked_value),
            stockout,
        );
    }
}

fn print_human(
    report: &guard_analytics::InventoryHealthReport,
    options: &AnalysisOptions,
    rows_analyzed: usize,
    by_warehouse: bool,
    forecast: Option<&ForecastJson>,
    load_ms: u128,
    analysis_ms: u128,
) {
    let summary = summarize(&report.stock_status);

    println!();
    println!("  \u{2554}{}\u{2557}", "\u{2550}".repeat(62));
    println!("  \u{2551}          DEADSTOCK GUARD \u{2014} Inventory Health Digest          \u{2551}");
    println!("  \u{255a}{}\u{255d}", "\u{2550}".repeat(62));
    println!();

    println!(
        "  {} rows analyzed  \u{00b7}  {} product groups  \u{00b7}  window {}d  \u{00b7}  lead time {}d",
        rows_analyzed,
        report.stock_status.len(),
        options.window_days,
        options.lead_time_days,
    );
    println!(
        "  {} dead stock  \u{00b7}  {} slow moving  \u{00b7}  {} healthy  \u{00b7}  {} blocked in dead stock",
        summary.dead_stock_items,
        summary.slow_moving_items,
        summary.healthy_items,
        format_thousands(summary.money_blocked),
    );
    println!();

    if report.stock_status.is_empty() {
        println!("  No product groups to classify. Is the upload empty?");
    } else if by_warehouse {
        for (warehouse, rows) in partition_by_warehouse(&report.stock_status) {
            let sub = summarize(&rows);
            println!("  {:\u{2500}<64}", "");
            println!(
                "  {}  \u{00b7}  {} dead  \u{00b7}  {} slow  \u{00b7}  {} healthy  \u{00b7}  {} blocked",
                warehouse,
                sub.dead_stock_items,
                sub.slow_moving_items,
                sub.healthy_items,
                format_thousands(sub.money_blocked),
            );
            print_status_rows(&rows);
        }
        println!("  {:\u{2500}<64}", "");
    } else {
        println!("  {:\u{2500}<64}", "");
        print_status_rows(&report.stock_status);
        println!("  {:\u{2500}<64}", "");
    }

    if !report.suppliers.is_empty() {
        println!();
        println!("  Supplier restocks:");
        for s in &report.suppliers {
            println!(
                "    {:24} {:>10.0} units across {} purchase orders",
                s.supplier, s.total_restock_units, s.purchase_orders,
            );
        }
    }

    println!();
    println!(
        "  Data quality: {} negative sales cells \u{00b7} {} negative stock cells \u{00b7} {:.0}% zero-sale rows",
        report.quality.negative_units_sold,
        report.quality.negative_stock_remaining,
        report.quality.zero_sales_ratio * 100.0,
    );

    if let Some(f) = forecast {
        println!();
        match &f.points {
            Some(points) => {
                let total: f64 = points.iter().map(|p| p.forecasted_units).sum();
                println!(
                    "  30-day forecast for {}{}: {:.0} units total, {:.1}/day average",
                    f.product,
                    f.warehouse
                        .as_deref()
                        .map(|w| format!(" at {}", w))
                        .unwrap_or_default(),
                    total,
                    total / points.len() as f64,
                );
                if let (Some(first), Some(last)) = (points.first(), points.last()) {
                    println!(
                        "    {}: {:.1} units  \u{2192}  {}: {:.1} units",
                        first.date, first.forecasted_units, last.date, last.forecasted_units,
                    );
                }
            }
            None => println!(
                "  Forecast unavailable for {}: under 30 distinct sale-days of history.",
                f.product,
            ),
        }
    }

    println!();
    println!(
        "  \u{23f1}  CSV loaded in {}ms \u{00b7} Analysis ran in {}ms \u{00b7} Total {}ms",
        load_ms,
        analysis_ms,
        load_ms + analysis_ms,
    );
    println!();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn usage() -> ! {
    eprintln!("Usage: guard-server <sales.csv> [--days N] [--lead-time N] [--by-warehouse]");
    eprintln!("                    [--forecast PRODUCT [--warehouse W]] [--json]");
    eprintln!("       guard-server --sample");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --days         Trailing sales window in days (default: 60)");
    eprintln!("  --lead-time    Supplier lead time in days (default: 7)");
    eprintln!("  --by-warehouse Break the digest down per warehouse");
    eprintln!("  --forecast     Forecast 30 days of demand for one product");
    eprintln!("  --warehouse    Restrict the forecast to one warehouse");
    eprintln!("  --json         Output as JSON instead of formatted text");
    eprintln!("  --sample       Print a template CSV and exit");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  guard-server sales.csv");
    eprintln!("  guard-server sales.csv --days 90 --json");
    eprintln!("  guard-server sales.csv --forecast \"Cotton Shirt\" --warehouse Ahmedabad_WH");
    process::exit(1);
}

fn flag_value(args: &[String], i: usize, flag: &str) -> String {
    match args.get(i + 1) {
        Some(v) => v.clone(),
        None => {
            eprintln!("Error: {} requires a value", flag);
            process::exit(1);
        }
    }
}

fn forecast_slice<'a>(
    dataset: &'a Dataset,
    product: &str,
    warehouse: Option<&str>,
) -> Vec<SalesRecord> {
    dataset
        .records
        .iter()
        .filter(|r| r.product_name.as_deref() == Some(product))
        .filter(|r| warehouse.is_none() || r.warehouse.as_deref() == warehouse)
        .cloned()
        .collect()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.get(1).map(String::as_str) == Some("--sample") {
        print!("{}", sample_csv());
        return;
    }
    if args.len() < 2 || args[1].starts_with("--") {
        usage();
    }
    let csv_path = &args[1];

    let mut options = AnalysisOptions::default();
    let mut by_warehouse = false;
    let mut forecast_product: Option<String> = None;
    let mut forecast_warehouse: Option<String> = None;
    let mut json_output = false;
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--days" => {
                options.window_days = flag_value(&args, i, "--days").parse().unwrap_or_else(|_| {
                    eprintln!("Error: --days requires a positive integer");
                    process::exit(1);
                });
                i += 2;
            }
            "--lead-time" => {
                options.lead_time_days =
                    flag_value(&args, i, "--lead-time").parse().unwrap_or_else(|_| {
                        eprintln!("Error: --lead-time requires a number of days");
                        process::exit(1);
                    });
                i += 2;
            }
            "--by-warehouse" => {
                by_warehouse = true;
                i += 1;
            }
            "--forecast" => {
                forecast_product = Some(flag_value(&args, i, "--forecast"));
                i += 2;
            }
            "--warehouse" => {
                forecast_warehouse = Some(flag_value(&args, i, "--warehouse"));
                i += 2;
            }
            "--json" => {
                json_output = true;
                i += 1;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
    }
    if options.window_days <= 0 {
        eprintln!("Error: --days must be at least 1");
        process::exit(1);
    }

    // Load and validate the upload. Schema problems are user errors and get
    // reported verbatim; anything else is an I/O failure.
    let load_start = Instant::now();
    let bytes = match fs::read(csv_path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error reading {}: {}", csv_path, e);
            process::exit(1);
        }
    };
    let input_fingerprint = format!("{:x}", Sha256::digest(&bytes));
    let dataset = match load_csv(bytes.as_slice()).and_then(|t| normalize(&t)) {
        Ok(ds) => clean(ds),
        Err(e @ SchemaError::Csv(_)) => {
            eprintln!("Error loading CSV: {}", e);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Upload rejected: {}", e);
            process::exit(1);
        }
    };
    let load_ms = load_start.elapsed().as_millis();
    info!(
        path = %csv_path,
        bytes = bytes.len(),
        rows = dataset.len(),
        load_ms,
        "upload loaded and cleaned"
    );

    if dataset.is_empty() {
        eprintln!("Error: no usable rows after cleaning (every row lacked a product name?)");
        process::exit(1);
    }

    let analysis_start = Instant::now();
    let report = analyze(&dataset, &options);
    let analysis_ms = analysis_start.elapsed().as_millis();
    info!(
        groups = report.stock_status.len(),
        suppliers = report.suppliers.len(),
        analysis_ms,
        "analysis complete"
    );

    let forecast = forecast_product.map(|product| {
        let slice = forecast_slice(&dataset, &product, forecast_warehouse.as_deref());
        ForecastJson {
            points: forecast_next_30_days(&slice),
            product,
            warehouse: forecast_warehouse.clone(),
        }
    });

    if json_output {
        let digest = DigestJson {
            generated_at: Utc::now().to_rfc3339(),
            input_fingerprint,
            rows_analyzed: dataset.len(),
            window_days: options.window_days,
            lead_time_days: options.lead_time_days,
            analysis_ms,
            summary: summarize(&report.stock_status),
            warehouses: by_warehouse.then(|| {
                partition_by_warehouse(&report.stock_status)
                    .into_iter()
                    .map(|(warehouse, rows)| WarehouseJson {
                        warehouse,
                        summary: summarize(&rows),
                        stock_status: rows,
                    })
                    .collect()
            }),
            stock_status: report.stock_status,
            suppliers: report.suppliers,
            quality: report.quality,
            forecast,
        };
        match serde_json::to_string_pretty(&digest) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing digest: {}", e);
                process::exit(1);
            }
        }
    } else {
        print_human(
            &report,
            &options,
            dataset.len(),
            by_warehouse,
            forecast.as_ref(),
            load_ms,
            analysis_ms,
        );
    }
}
