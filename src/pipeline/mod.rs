// Data processing pipeline: reconcile, normalize, reduce, assess

pub mod normalize;
pub mod quality;
pub mod reconcile;
pub mod reduce;

use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{PricePoint, RunReport};
use crate::pipeline::quality::Severity;
use crate::pipeline::reconcile::ColumnMap;
use crate::pipeline::reduce::ReduceOutput;
use crate::table::RawTable;

/// Everything one pipeline run produces. Serializable so cached runs can be
/// replayed without touching the workbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub history: Vec<PricePoint>,
    pub snapshot: Vec<PricePoint>,
    pub report: RunReport,
}

/// Run the full pipeline over raw sheet tables.
///
/// `run_date` stands in for rows whose source carries no date column at all;
/// callers pass the current wall-clock date outside of tests.
pub fn run(
    mut prices: RawTable,
    mut revenue: RawTable,
    run_date: NaiveDate,
    map: &ColumnMap,
) -> PipelineOutput {
    let started = Instant::now();
    let run_id = Uuid::new_v4().to_string();
    info!(run_id = %run_id, alias_map_version = map.version(), "pipeline run started");

    let price_schema = reconcile::reconcile(&mut prices, reconcile::SheetSchema::Prices, map);
    let revenue_schema = reconcile::reconcile(&mut revenue, reconcile::SheetSchema::Revenue, map);

    let price_rows_in = prices.len();
    let revenue_rows_in = revenue.len();

    let (price_records, normalize_report) = normalize::normalize_prices(&prices, run_date);
    let (revenue_records, revenue_dated) = normalize::normalize_revenue(&revenue);

    let ReduceOutput {
        history,
        snapshot,
        join_key,
        rows_dropped,
        warnings: reduce_warnings,
    } = reduce::reduce(price_records, revenue_records, revenue_dated);

    let issues = quality::assess(&price_schema, &revenue_schema, &normalize_report);
    for issue in &issues {
        match issue.severity {
            Severity::Error => error!(run_id = %run_id, column = ?issue.column, "{}", issue),
            Severity::Warning => warn!(run_id = %run_id, "{}", issue),
            Severity::Info => info!(run_id = %run_id, "{}", issue),
        }
    }
    for warning in &reduce_warnings {
        warn!(run_id = %run_id, "{}", warning);
    }

    let mut warnings: Vec<String> = issues
        .iter()
        .filter(|issue| issue.severity >= Severity::Warning)
        .map(ToString::to_string)
        .collect();
    warnings.extend(reduce_warnings);

    let report = RunReport {
        run_id: run_id.clone(),
        price_rows_in,
        price_rows_dropped: rows_dropped,
        revenue_rows_in,
        history_rows: history.len(),
        snapshot_rows: snapshot.len(),
        join_key,
        duration_ms: started.elapsed().as_millis() as u64,
        warnings,
    };

    info!(
        run_id = %run_id,
        price_rows_in = report.price_rows_in,
        rows_dropped = report.price_rows_dropped,
        history_rows = report.history_rows,
        snapshot_rows = report.snapshot_rows,
        join_key = ?report.join_key,
        duration_ms = report.duration_ms,
        "pipeline run complete"
    );

    PipelineOutput {
        history,
        snapshot,
        report,
    }
}
