//! Recovery of "collapsed" exports.
//!
//! Some paste-exports arrive with fields fused together on each line: two
//! dates glued back to back, a product name running straight into a numeric
//! sku, then a count, a decimal-comma price, and a merchant name. A single
//! anchored pattern pulls the fields back apart; the 5-digit minimum on the
//! sku is what stops it from being swallowed by the product name.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::clean::parse_currency;
use crate::dates::{format_day_first, parse_day_first};
use crate::table::RawTable;

static COLLAPSED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{2}/\d{2}/\d{4})\s*(\d{2}/\d{2}/\d{4})\s*(.+?)(\d{5,})\s*(\d+)\s*(\d+,\d+)\s*(.+)$",
    )
    .unwrap()
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollapsedRow {
    pub scraped_on: Option<NaiveDate>,
    pub priced_on: Option<NaiveDate>,
    pub product: String,
    pub sku: String,
    pub competitors: u32,
    pub best_price: f64,
    pub best_competitor: String,
}

/// Recover structured rows from a collapsed export. Lines that do not match
/// the collapsed shape are skipped; input in some other format entirely
/// yields an empty result rather than an error.
pub fn parse_collapsed(raw: &str) -> Vec<CollapsedRow> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Option<CollapsedRow> {
    let captures = COLLAPSED_LINE.captures(line)?;
    Some(CollapsedRow {
        scraped_on: parse_day_first(&captures[1]),
        priced_on: parse_day_first(&captures[2]),
        product: captures[3].trim().to_string(),
        sku: captures[4].to_string(),
        competitors: captures[5].parse().unwrap_or(0),
        best_price: parse_currency(&captures[6]),
        best_competitor: captures[7].trim().to_string(),
    })
}

/// Lay recovered rows out as a table for CSV output.
pub fn to_table(rows: &[CollapsedRow]) -> RawTable {
    let headers = vec![
        "Scraped_On".to_string(),
        "Priced_On".to_string(),
        "Product".to_string(),
        "Sku".to_string(),
        "Competitors".to_string(),
        "Best_Price".to_string(),
        "Best_Competitor".to_string(),
    ];
    let mut table = RawTable::new(headers);
    for row in rows {
        let day = |date: Option<NaiveDate>| date.map(format_day_first).unwrap_or_default();
        table.push_row(vec![
            day(row.scraped_on),
            day(row.priced_on),
            row.product.clone(),
            row.sku.clone(),
            row.competitors.to_string(),
            format!("{:.2}", row.best_price),
            row.best_competitor.clone(),
        ]);
    }
    table
}
