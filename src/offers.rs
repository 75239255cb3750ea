//! Ranked-offers report flattening.
//!
//! The comparator service exports a JSON array with one entry per product,
//! each carrying a `BestOffers` sub-list of competitor offers. The price
//! sheet wants one flat row per product, so the sub-list is flattened into
//! a fixed set of competitor columns, padded with placeholders, and the
//! whole report is filtered down to the products present in our feed.

use std::collections::HashSet;

use serde_json::Value;

use crate::constants::{
    COL_EXECUTION_DATE, COL_PRICE, COL_PRODUCT, COL_RANK, COL_SKU, MAX_COMPETITORS, NO_COMPETITOR,
};
use crate::error::{PricewatchError, Result};
use crate::feed::FeedProduct;
use crate::table::RawTable;

/// Flatten an offers report into a sheet-shaped table.
///
/// Products whose sku is not in the feed are dropped; an empty feed drops
/// everything. `executed_at` is stamped on every row.
pub fn flatten_offers_report(
    report: &Value,
    feed: &[FeedProduct],
    executed_at: &str,
) -> Result<RawTable> {
    let entries = report.as_array().ok_or_else(|| {
        PricewatchError::Report("offers report is not a JSON array".to_string())
    })?;

    let feed_ids: HashSet<&str> = feed.iter().map(|p| p.id.as_str()).collect();

    let mut table = RawTable::new(report_columns());
    for entry in entries {
        let sku = cell_text(entry.get("Sku"));
        if !feed_ids.contains(sku.as_str()) {
            continue;
        }

        let mut row = vec![
            sku,
            cell_text(entry.get("Product")),
            cell_text(entry.get("Price")),
            cell_text(entry.get("Rank")),
            executed_at.to_string(),
        ];

        let offers = entry
            .get("BestOffers")
            .and_then(|v| v.as_array())
            .map(|a| a.as_slice())
            .unwrap_or(&[]);
        for i in 0..MAX_COMPETITORS {
            match offers.get(i) {
                Some(offer) => {
                    row.push(cell_text(offer.get("Merchant")));
                    row.push(cell_text(offer.get("Price")));
                }
                None => {
                    row.push(NO_COMPETITOR.to_string());
                    row.push("0".to_string());
                }
            }
        }

        row.push(cell_text(entry.get("Popularity")));
        row.push(cell_text(entry.get("MinPrice")));
        table.push_row(row);
    }

    Ok(table)
}

fn report_columns() -> Vec<String> {
    let mut columns = vec![
        COL_SKU.to_string(),
        COL_PRODUCT.to_string(),
        COL_PRICE.to_string(),
        COL_RANK.to_string(),
        COL_EXECUTION_DATE.to_string(),
    ];
    for i in 1..=MAX_COMPETITORS {
        columns.push(format!("Comp_{}_Name", i));
        columns.push(format!("Comp_{}_Price", i));
    }
    columns.push("Popularity".to_string());
    columns.push("MinPrice_Market".to_string());
    columns
}

/// Render a JSON scalar as a sheet cell. Objects, arrays, and nulls become
/// empty cells; numbers keep their JSON rendering.
fn cell_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}
