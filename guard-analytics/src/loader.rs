//! CSV sales data loader.
//!
//! Reads an uploaded CSV into a `RawTable` of string cells with whatever
//! column headers the upload happens to use. Header aliasing, validation
//! and type coercion happen afterwards in `schema::normalize`; this module
//! only gets the bytes into tabular shape. XLSX and other formats are the
//! upload collaborator's problem. The core only sees tabular data.

use std::io::Read;

use crate::schema::SchemaError;

/// Raw tabular data as uploaded: arbitrary headers, string cells.
/// An empty cell is represented as `None`.
#[derive(Clone, Debug, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Load a raw table from a CSV reader.
pub fn load_csv<R: Read>(reader: R) -> Result<RawTable, SchemaError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| SchemaError::Csv(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (line_num, result) in csv_reader.records().enumerate() {
        let record = result
            .map_err(|e| SchemaError::Csv(format!("line {}: {}", line_num + 2, e)))?;
        let mut row: Vec<Option<String>> = record
            .iter()
            .map(|cell| {
                if cell.is_empty() {
                    None
                } else {
                    Some(cell.to_string())
                }
            })
            .collect();
        // Short rows pad with missing cells so every row matches the header width.
        row.resize(headers.len(), None);
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}

/// Load a raw table from a CSV file path.
pub fn load_csv_file(path: &str) -> Result<RawTable, SchemaError> {
    let file = std::fs::File::open(path)
        .map_err(|e| SchemaError::Csv(format!("failed to open '{}': {}", path, e)))?;
    load_csv(file)
}

/// The canonical one-row CSV template offered to users as a starting point.
pub fn sample_csv() -> String {
    let mut out = String::new();
    out.push_str(
        "Date,Product_Name,Category,Warehouse,Supplier,Units_Sold,Stock_Remaining,Restock_Units,Cost_Price\n",
    );
    out.push_str("2025-01-01,Cotton Shirt,Textile,Ahmedabad_WH,Supplier_A,5,500,0,450\n");
    out
}
