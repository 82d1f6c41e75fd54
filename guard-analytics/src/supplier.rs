//! Supplier restock aggregation.

use std::collections::HashMap;

use crate::types::{Dataset, SupplierSummary};

/// Aggregate restock activity per supplier.
///
/// Returns an empty result when the upload carried no `Supplier` or no
/// `Restock_Units` column, or when no row has a positive restock. Rows
/// with a positive restock but no supplier value are skipped; there is
/// no key to group them under. Output order is supplier encounter order.
pub fn supplier_metrics(dataset: &Dataset) -> Vec<SupplierSummary> {
    if !dataset.has_supplier || !dataset.has_restock {
        return Vec::new();
    }

    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, (f64, usize)> = HashMap::new();

    for record in &dataset.records {
        let Some(units) = record.restock_units else {
            continue;
        };
        if units <= 0.0 {
            continue;
        }
        let Some(supplier) = record.supplier.clone() else {
            continue;
        };
        let entry = totals.entry(supplier.clone()).or_insert_with(|| {
            order.push(supplier);
            (0.0, 0)
        });
        entry.0 += units;
        entry.1 += 1;
    }

    order
        .into_iter()
        .map(|supplier| {
            let (total_restock_units, purchase_orders) = totals[&supplier];
            SupplierSummary {
                supplier,
                total_restock_units,
                purchase_orders,
            }
        })
        .collect()
}
