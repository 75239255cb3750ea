use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{
    COL_CATEGORY, COL_COMP_NAME, COL_COMP_PRICE, COL_DATE, COL_PRICE, COL_PRICE_INDEX,
    COL_PRODUCT, COL_RANK, COL_REVENUE, COL_SKU, COL_UNITS, PRICE_INDEX_NEUTRAL,
};
use crate::dates::format_day_first;
use crate::table::RawTable;

/// One cleaned price observation: a single SKU on a single scrape day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRecord {
    pub sku: String,
    pub product: String,
    pub price: f64,
    pub rank: u32,
    pub competitor_price: f64,
    pub competitor_name: String,
    pub category: String,
    /// `None` when the cell carried an unparseable date; such rows are
    /// dropped before reduction.
    pub observed_on: Option<NaiveDate>,
    /// Position in the source table, the tiebreaker for same-day rows.
    #[serde(skip)]
    pub row_index: usize,
}

impl PriceRecord {
    /// Own price as a percentage of the best competitor price.
    /// A missing comparison yields the neutral index instead of a division error.
    pub fn price_index(&self) -> f64 {
        if self.competitor_price == 0.0 {
            PRICE_INDEX_NEUTRAL
        } else {
            self.price / self.competitor_price * 100.0
        }
    }
}

/// One revenue figure for a SKU, optionally pinned to a calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RevenueRecord {
    pub sku: String,
    pub revenue: f64,
    pub units_sold: u64,
    pub recorded_on: Option<NaiveDate>,
}

/// How price rows were matched to revenue rows during the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevenueJoinKey {
    /// Revenue carried dates: a revenue row attaches only to same-day prices.
    SkuAndDate,
    /// Revenue carried no date column: every price row for a sku receives
    /// the same figure. An approximation, flagged in the run report.
    SkuOnly,
    /// No revenue sheet at all.
    None,
}

/// A price observation with its revenue join applied, as consumed by the
/// history and snapshot views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub sku: String,
    pub product: String,
    pub price: f64,
    pub rank: u32,
    pub competitor_price: f64,
    pub competitor_name: String,
    pub category: String,
    pub observed_on: NaiveDate,
    pub price_index: f64,
    pub revenue: f64,
    pub units_sold: u64,
}

/// Flatten points into a canonical-column table, the shape both output
/// views are written and printed in.
pub fn points_table(points: &[PricePoint]) -> RawTable {
    let headers = vec![
        COL_SKU.to_string(),
        COL_PRODUCT.to_string(),
        COL_PRICE.to_string(),
        COL_RANK.to_string(),
        COL_COMP_PRICE.to_string(),
        COL_COMP_NAME.to_string(),
        COL_CATEGORY.to_string(),
        COL_DATE.to_string(),
        COL_PRICE_INDEX.to_string(),
        COL_REVENUE.to_string(),
        COL_UNITS.to_string(),
    ];
    let mut table = RawTable::new(headers);
    for point in points {
        table.push_row(vec![
            point.sku.clone(),
            point.product.clone(),
            format!("{:.2}", point.price),
            point.rank.to_string(),
            format!("{:.2}", point.competitor_price),
            point.competitor_name.clone(),
            point.category.clone(),
            format_day_first(point.observed_on),
            format!("{:.2}", point.price_index),
            format!("{:.2}", point.revenue),
            point.units_sold.to_string(),
        ]);
    }
    table
}

/// What one pipeline run did, for the log and the CLI summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub price_rows_in: usize,
    pub price_rows_dropped: usize,
    pub revenue_rows_in: usize,
    pub history_rows: usize,
    pub snapshot_rows: usize,
    pub join_key: RevenueJoinKey,
    pub duration_ms: u64,
    pub warnings: Vec<String>,
}
