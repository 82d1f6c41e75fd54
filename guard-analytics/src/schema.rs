//! Schema normalization.
//!
//! Maps arbitrary uploaded column headers onto the canonical schema,
//! validates that every required column is present, coerces cell types and
//! adds the optional columns when the upload lacks them. Any dataset that
//! fails validation is rejected wholesale; there is no partial load.

use chrono::NaiveDate;
use thiserror::Error;

use crate::loader::RawTable;
use crate::types::{Dataset, ExtraColumn, SalesRecord};

/// Columns every upload must provide (after aliasing).
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "Date",
    "Product_Name",
    "Category",
    "Units_Sold",
    "Stock_Remaining",
    "Cost_Price",
];

/// Columns filled with nulls when the upload lacks them.
pub const OPTIONAL_COLUMNS: [&str; 3] = ["Warehouse", "Supplier", "Restock_Units"];

/// Validation error raised by the normalizer. Every failure mode has a
/// named variant; the whole dataset is rejected when any of these fire.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Missing required columns after auto-mapping: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Invalid value in Date column at row {row}: {value:?}")]
    InvalidDate { row: usize, value: String },

    #[error("Invalid numeric value in {column} at row {row}: {value:?}")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Multiple uploaded columns map to {0}")]
    DuplicateColumn(String),

    #[error("CSV read error: {0}")]
    Csv(String),
}

/// Resolve a normalized header key to its canonical column name.
///
/// This alias table is a bit-exact interoperability contract: other tools
/// that produce datasets for the analytics core must match it. Keys are
/// compared after trimming, lowercasing and replacing spaces with
/// underscores.
fn resolve_alias(key: &str) -> Option<&'static str> {
    match key {
        "date" => Some("Date"),
        "product" | "item" | "product_name" => Some("Product_Name"),
        "category" => Some("Category"),
        "sales" | "qty" | "quantity" | "units" => Some("Units_Sold"),
        "stock" | "balance_stock" | "remaining" => Some("Stock_Remaining"),
        "cost" | "price" | "cost_price" => Some("Cost_Price"),
        "warehouse" => Some("Warehouse"),
        "supplier" => Some("Supplier"),
        "restock" => Some("Restock_Units"),
        _ => None,
    }
}

/// Map one uploaded header to its canonical name, or pass it through
/// (trimmed) when unrecognized.
pub fn canonical_header(header: &str) -> String {
    let trimmed = header.trim();
    let key = trimmed.to_lowercase().replace(' ', "_");
    match resolve_alias(&key) {
        Some(canonical) => canonical.to_string(),
        None => trimmed.to_string(),
    }
}

/// Date formats accepted in the `Date` column, tried in order.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y"];

fn parse_date(value: &str) -> Option<NaiveDate> {
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return Some(d);
        }
    }
    // Datetime cells keep only the calendar date.
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Normalize a raw uploaded table into a typed `Dataset`.
///
/// Steps: alias headers, verify the required set is complete, parse every
/// `Date` cell (any failure rejects the dataset), coerce numeric cells, and
/// mark which optional columns the upload actually carried. Unrecognized
/// columns pass through untouched as `ExtraColumn`s.
pub fn normalize(table: &RawTable) -> Result<Dataset, SchemaError> {
    let mapped: Vec<String> = table.headers.iter().map(|h| canonical_header(h)).collect();

    // Reject uploads where two different headers collapse onto the same
    // canonical column; the mapping would be ambiguous.
    let canonical_set: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .chain(OPTIONAL_COLUMNS.iter())
        .copied()
        .collect();
    for name in &canonical_set {
        if mapped.iter().filter(|m| m == name).count() > 1 {
            return Err(SchemaError::DuplicateColumn((*name).to_string()));
        }
    }

    let col = |name: &str| mapped.iter().position(|m| m == name);

    let required = [
        col("Date"),
        col("Product_Name"),
        col("Category"),
        col("Units_Sold"),
        col("Stock_Remaining"),
        col("Cost_Price"),
    ];
    let [Some(date_idx), Some(product_idx), Some(category_idx), Some(units_idx), Some(stock_idx), Some(cost_idx)] =
        required
    else {
        let mut missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .zip(required)
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        missing.sort();
        return Err(SchemaError::MissingColumns(missing));
    };
    let warehouse_idx = col("Warehouse");
    let supplier_idx = col("Supplier");
    let restock_idx = col("Restock_Units");

    let cell = |row: &[Option<String>], idx: usize| -> Option<String> {
        row.get(idx).cloned().flatten()
    };

    let mut records = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        // Row numbers in errors are 1-based file lines, header included.
        let line = i + 2;

        let date_cell = cell(row, date_idx).ok_or_else(|| SchemaError::InvalidDate {
            row: line,
            value: String::new(),
        })?;
        let date = parse_date(&date_cell).ok_or_else(|| SchemaError::InvalidDate {
            row: line,
            value: date_cell.clone(),
        })?;

        records.push(SalesRecord {
            date,
            product_name: cell(row, product_idx),
            category: cell(row, category_idx),
            warehouse: warehouse_idx.and_then(|idx| cell(row, idx)),
            supplier: supplier_idx.and_then(|idx| cell(row, idx)),
            units_sold: parse_number(cell(row, units_idx), "Units_Sold", line)?,
            stock_remaining: parse_number(cell(row, stock_idx), "Stock_Remaining", line)?,
            restock_units: match restock_idx {
                Some(idx) => parse_number(cell(row, idx), "Restock_Units", line)?,
                None => None,
            },
            cost_price: parse_number(cell(row, cost_idx), "Cost_Price", line)?,
            blocked_value: None,
        });
    }

    // Columns that didn't map to the canonical schema pass through.
    let extra_columns: Vec<ExtraColumn> = mapped
        .iter()
        .enumerate()
        .filter(|(_, name)| !canonical_set.contains(&name.as_str()))
        .map(|(idx, name)| ExtraColumn {
            name: name.clone(),
            values: table.rows.iter().map(|row| cell(row, idx)).collect(),
        })
        .collect();

    Ok(Dataset {
        records,
        has_warehouse: warehouse_idx.is_some(),
        has_supplier: supplier_idx.is_some(),
        has_restock: restock_idx.is_some(),
        extra_columns,
    })
}

fn parse_number(
    value: Option<String>,
    column: &str,
    row: usize,
) -> Result<Option<f64>, SchemaError> {
    // `parse::<f64>` accepts "inf" and "NaN"; those poison every downstream
    // aggregate, so only finite values count as numbers here.
    match value {
        None => Ok(None),
        Some(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(SchemaError::InvalidNumber {
                column: column.to_string(),
                row,
                value: s,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_csv;

    fn table_from(csv_text: &str) -> RawTable {
        load_csv(csv_text.as_bytes()).unwrap()
    }

    const CANONICAL_CSV: &str = "\
Date,Product_Name,Category,Warehouse,Supplier,Units_Sold,Stock_Remaining,Restock_Units,Cost_Price
2025-01-01,Cotton Shirt,Textile,Ahmedabad_WH,Supplier_A,5,500,0,450
";

    #[test]
    fn canonical_headers_are_a_no_op() {
        let ds = normalize(&table_from(CANONICAL_CSV)).unwrap();
        assert_eq!(ds.records.len(), 1);
        let r = &ds.records[0];
        assert_eq!(r.product_name.as_deref(), Some("Cotton Shirt"));
        assert_eq!(r.units_sold, Some(5.0));
        assert_eq!(r.stock_remaining, Some(500.0));
        assert_eq!(r.cost_price, Some(450.0));
        assert!(ds.has_warehouse && ds.has_supplier && ds.has_restock);
        assert!(ds.extra_columns.is_empty());
    }

    #[test]
    fn aliases_are_case_and_space_insensitive() {
        assert_eq!(canonical_header("Qty"), "Units_Sold");
        assert_eq!(canonical_header("  ITEM "), "Product_Name");
        assert_eq!(canonical_header("Balance Stock"), "Stock_Remaining");
        assert_eq!(canonical_header("cost price"), "Cost_Price");
        assert_eq!(canonical_header("restock"), "Restock_Units");
        // Unrecognized headers pass through trimmed.
        assert_eq!(canonical_header(" Region "), "Region");
    }

    #[test]
    fn aliased_upload_normalizes_like_canonical() {
        let aliased = "\
date,item,category,qty,balance stock,price
2025-01-01,Cotton Shirt,Textile,5,500,450
";
        let ds = normalize(&table_from(aliased)).unwrap();
        let r = &ds.records[0];
        assert_eq!(r.product_name.as_deref(), Some("Cotton Shirt"));
        assert_eq!(r.units_sold, Some(5.0));
        assert_eq!(r.stock_remaining, Some(500.0));
        assert_eq!(r.cost_price, Some(450.0));
        // Optional columns were absent from the upload.
        assert!(!ds.has_warehouse && !ds.has_supplier && !ds.has_restock);
        assert_eq!(r.warehouse, None);
        assert_eq!(r.supplier, None);
        assert_eq!(r.restock_units, None);
    }

    #[test]
    fn missing_required_columns_are_all_named() {
        let partial = "\
Date,Product_Name,Units_Sold
2025-01-01,Cotton Shirt,5
";
        let err = normalize(&table_from(partial)).unwrap_err();
        match err {
            SchemaError::MissingColumns(cols) => {
                assert_eq!(cols, vec!["Category", "Cost_Price", "Stock_Remaining"]);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn single_missing_column_names_exactly_that_column() {
        let partial = "\
Date,Product_Name,Category,Stock_Remaining,Cost_Price
2025-01-01,Cotton Shirt,Textile,500,450
";
        let err = normalize(&table_from(partial)).unwrap_err();
        match err {
            SchemaError::MissingColumns(cols) => assert_eq!(cols, vec!["Units_Sold"]),
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn any_bad_date_rejects_the_whole_dataset() {
        let bad = "\
Date,Product_Name,Category,Units_Sold,Stock_Remaining,Cost_Price
2025-01-01,Cotton Shirt,Textile,5,500,450
not-a-date,Cotton Shirt,Textile,5,495,450
";
        let err = normalize(&table_from(bad)).unwrap_err();
        match err {
            SchemaError::InvalidDate { row, value } => {
                assert_eq!(row, 3);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("expected InvalidDate, got {:?}", other),
        }
    }

    #[test]
    fn empty_date_cell_also_rejects() {
        let bad = "\
Date,Product_Name,Category,Units_Sold,Stock_Remaining,Cost_Price
,Cotton Shirt,Textile,5,500,450
";
        assert!(matches!(
            normalize(&table_from(bad)),
            Err(SchemaError::InvalidDate { row: 2, .. })
        ));
    }

    #[test]
    fn several_date_formats_are_accepted() {
        assert_eq!(
            parse_date("2025-01-31"),
            NaiveDate::from_ymd_opt(2025, 1, 31)
        );
        assert_eq!(
            parse_date("2025/01/31"),
            NaiveDate::from_ymd_opt(2025, 1, 31)
        );
        assert_eq!(
            parse_date("01/31/2025"),
            NaiveDate::from_ymd_opt(2025, 1, 31)
        );
        assert_eq!(
            parse_date("2025-01-31 10:30:00"),
            NaiveDate::from_ymd_opt(2025, 1, 31)
        );
        assert_eq!(parse_date("31st of Jan"), None);
    }

    #[test]
    fn non_numeric_cell_in_numeric_column_rejects() {
        let bad = "\
Date,Product_Name,Category,Units_Sold,Stock_Remaining,Cost_Price
2025-01-01,Cotton Shirt,Textile,lots,500,450
";
        let err = normalize(&table_from(bad)).unwrap_err();
        match err {
            SchemaError::InvalidNumber { column, row, value } => {
                assert_eq!(column, "Units_Sold");
                assert_eq!(row, 2);
                assert_eq!(value, "lots");
            }
            other => panic!("expected InvalidNumber, got {:?}", other),
        }
    }

    #[test]
    fn non_finite_numeric_cells_reject() {
        for bad_value in ["inf", "-inf", "NaN"] {
            let bad = format!(
                "Date,Product_Name,Category,Units_Sold,Stock_Remaining,Cost_Price\n\
                 2025-01-01,Cotton Shirt,Textile,{},500,450\n",
                bad_value
            );
            let err = normalize(&table_from(&bad)).unwrap_err();
            match err {
                SchemaError::InvalidNumber { column, row, value } => {
                    assert_eq!(column, "Units_Sold");
                    assert_eq!(row, 2);
                    assert_eq!(value, bad_value);
                }
                other => panic!("expected InvalidNumber for {:?}, got {:?}", bad_value, other),
            }
        }
    }

    #[test]
    fn unrecognized_columns_pass_through() {
        let extra = "\
Date,Product_Name,Category,Units_Sold,Stock_Remaining,Cost_Price,Region
2025-01-01,Cotton Shirt,Textile,5,500,450,West
";
        let ds = normalize(&table_from(extra)).unwrap();
        assert_eq!(ds.extra_columns.len(), 1);
        assert_eq!(ds.extra_columns[0].name, "Region");
        assert_eq!(ds.extra_columns[0].values, vec![Some("West".to_string())]);
    }

    #[test]
    fn duplicate_mapping_is_rejected() {
        let dup = "\
Date,Product_Name,Category,Qty,Sales,Stock_Remaining,Cost_Price
2025-01-01,Cotton Shirt,Textile,5,5,500,450
";
        assert!(matches!(
            normalize(&table_from(dup)),
            Err(SchemaError::DuplicateColumn(c)) if c == "Units_Sold"
        ));
    }

    #[test]
    fn missing_cells_stay_missing() {
        let gaps = "\
Date,Product_Name,Category,Units_Sold,Stock_Remaining,Cost_Price
2025-01-01,,Textile,,500,450
";
        let ds = normalize(&table_from(gaps)).unwrap();
        let r = &ds.records[0];
        assert_eq!(r.product_name, None);
        assert_eq!(r.units_sold, None);
    }
}
