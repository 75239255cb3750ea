//! Analytics revenue export conversion.
//!
//! The analytics service exports per-item reports as JSON: one row per
//! item id, with ordered metric values (units purchased, then item
//! revenue). This converts such an export into the revenue sheet shape.

use chrono::NaiveDate;
use serde_json::Value;

use crate::constants::{COL_DATE, COL_REVENUE, COL_SKU, COL_UNITS};
use crate::dates::format_day_first;
use crate::error::{PricewatchError, Result};
use crate::table::RawTable;

/// Convert an analytics report into a revenue sheet table.
///
/// `recorded_on` stamps every row with a date column; `None` omits the
/// column entirely, which downstream means a sku-only revenue join.
pub fn convert_revenue_report(report: &Value, recorded_on: Option<NaiveDate>) -> Result<RawTable> {
    if !report.is_object() {
        return Err(PricewatchError::Report(
            "revenue report is not a JSON object".to_string(),
        ));
    }

    let mut columns = vec![
        COL_SKU.to_string(),
        COL_REVENUE.to_string(),
        COL_UNITS.to_string(),
    ];
    if recorded_on.is_some() {
        columns.push(COL_DATE.to_string());
    }
    let mut table = RawTable::new(columns);

    // A report with no sales period data simply has no "rows" key
    let rows = match report.get("rows").and_then(|v| v.as_array()) {
        Some(rows) => rows,
        None => return Ok(table),
    };

    for row in rows {
        let sku = dimension_value(row, 0);
        if sku.is_empty() {
            continue;
        }
        let units = metric_value(row, 0).parse::<f64>().unwrap_or(0.0).trunc() as u64;
        let revenue = metric_value(row, 1).parse::<f64>().unwrap_or(0.0);

        let mut cells = vec![sku, revenue.to_string(), units.to_string()];
        if let Some(date) = recorded_on {
            cells.push(format_day_first(date));
        }
        table.push_row(cells);
    }

    Ok(table)
}

fn dimension_value(row: &Value, index: usize) -> String {
    row.get("dimensionValues")
        .or_else(|| row.get("dimension_values"))
        .and_then(|v| v.as_array())
        .and_then(|a| a.get(index))
        .and_then(|v| v.get("value"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string()
}

fn metric_value(row: &Value, index: usize) -> String {
    row.get("metricValues")
        .or_else(|| row.get("metric_values"))
        .and_then(|v| v.as_array())
        .and_then(|a| a.get(index))
        .and_then(|v| v.get("value"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string()
}
