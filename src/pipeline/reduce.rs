//! Temporal snapshot reduction: the revenue join plus the two views every
//! consumer reads, full history and latest-per-sku snapshot.

use std::collections::HashMap;
use std::time::Instant;

use chrono::NaiveDate;

use crate::domain::{PricePoint, PriceRecord, RevenueJoinKey, RevenueRecord};
use crate::observability::metrics;

#[derive(Debug, Clone)]
pub struct ReduceOutput {
    /// Every surviving observation, ordered by date then source row.
    pub history: Vec<PricePoint>,
    /// Latest observation per sku, ordered by sku.
    pub snapshot: Vec<PricePoint>,
    pub join_key: RevenueJoinKey,
    /// Rows discarded because their observation date never parsed.
    pub rows_dropped: usize,
    pub warnings: Vec<String>,
}

/// Revenue figures aggregated per join key. Duplicate keys are summed so a
/// sheet carrying several rows for one sku-day still joins one-to-one.
struct RevenueIndex {
    dated: HashMap<(String, NaiveDate), (f64, u64)>,
    undated: HashMap<String, (f64, u64)>,
    join_key: RevenueJoinKey,
}

impl RevenueIndex {
    fn build(records: &[RevenueRecord], dated: bool) -> Self {
        let join_key = if records.is_empty() {
            RevenueJoinKey::None
        } else if dated {
            RevenueJoinKey::SkuAndDate
        } else {
            RevenueJoinKey::SkuOnly
        };

        let mut index = RevenueIndex {
            dated: HashMap::new(),
            undated: HashMap::new(),
            join_key,
        };

        match join_key {
            RevenueJoinKey::SkuAndDate => {
                for record in records {
                    // Undated rows inside a dated sheet can never match a
                    // price observation; they are skipped, not broadcast.
                    if let Some(date) = record.recorded_on {
                        let entry = index
                            .dated
                            .entry((record.sku.clone(), date))
                            .or_insert((0.0, 0));
                        entry.0 += record.revenue;
                        entry.1 += record.units_sold;
                    }
                }
            }
            RevenueJoinKey::SkuOnly => {
                for record in records {
                    let entry = index.undated.entry(record.sku.clone()).or_insert((0.0, 0));
                    entry.0 += record.revenue;
                    entry.1 += record.units_sold;
                }
            }
            RevenueJoinKey::None => {}
        }

        index
    }

    fn lookup(&self, sku: &str, date: NaiveDate) -> (f64, u64) {
        match self.join_key {
            RevenueJoinKey::SkuAndDate => self
                .dated
                .get(&(sku.to_string(), date))
                .copied()
                .unwrap_or((0.0, 0)),
            RevenueJoinKey::SkuOnly => self.undated.get(sku).copied().unwrap_or((0.0, 0)),
            RevenueJoinKey::None => (0.0, 0),
        }
    }
}

/// Left-join revenue onto price records, drop undatable rows, and derive
/// the history and snapshot views.
pub fn reduce(
    prices: Vec<PriceRecord>,
    revenue: Vec<RevenueRecord>,
    revenue_dated: bool,
) -> ReduceOutput {
    let started = Instant::now();
    let mut warnings = Vec::new();

    let index = RevenueIndex::build(&revenue, revenue_dated);
    if index.join_key == RevenueJoinKey::SkuOnly {
        warnings.push(
            "revenue sheet carries no dates; figures are broadcast across each sku's full history"
                .to_string(),
        );
    }

    let rows_in = prices.len();
    let mut dated_rows: Vec<(PriceRecord, NaiveDate)> = prices
        .into_iter()
        .filter_map(|record| record.observed_on.map(|date| (record, date)))
        .collect();
    let rows_dropped = rows_in - dated_rows.len();

    // Date plus source row index keeps "latest" reproducible when a sku was
    // scraped twice on one day.
    dated_rows.sort_by_key(|(record, date)| (*date, record.row_index));

    let mut matches = 0u64;
    let history: Vec<PricePoint> = dated_rows
        .into_iter()
        .map(|(record, date)| {
            let (revenue, units_sold) = index.lookup(&record.sku, date);
            if revenue != 0.0 || units_sold != 0 {
                matches += 1;
            }
            PricePoint {
                price_index: record.price_index(),
                sku: record.sku,
                product: record.product,
                price: record.price,
                rank: record.rank,
                competitor_price: record.competitor_price,
                competitor_name: record.competitor_name,
                category: record.category,
                observed_on: date,
                revenue,
                units_sold,
            }
        })
        .collect();

    let mut latest: HashMap<String, PricePoint> = HashMap::new();
    for point in &history {
        latest.insert(point.sku.clone(), point.clone());
    }
    let mut snapshot: Vec<PricePoint> = latest.into_values().collect();
    snapshot.sort_by(|a, b| a.sku.cmp(&b.sku));

    metrics::reduce::history_rows(history.len());
    metrics::reduce::snapshot_rows(snapshot.len());
    metrics::reduce::revenue_matches(matches);
    metrics::reduce::duration(started.elapsed().as_secs_f64());

    ReduceOutput {
        history,
        snapshot,
        join_key: index.join_key,
        rows_dropped,
        warnings,
    }
}
