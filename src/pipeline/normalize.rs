//! Value normalization: typed records out of reconciled text tables.
//!
//! Every coercion here is total. Bad cells collapse to documented defaults
//! (0.0 for currency, the sentinel for rank, `None` for a date) and are
//! counted, so a half-broken export still yields a usable run plus an
//! honest report.

use chrono::NaiveDate;

use crate::clean::{parse_currency, try_parse_currency, try_parse_rank};
use crate::constants::{
    COL_CATEGORY, COL_COMP_NAME, COL_COMP_PRICE, COL_DATE, COL_EXECUTION_DATE, COL_PRICE,
    COL_PRODUCT, COL_RANK, COL_REVENUE, COL_SKU, COL_UNITS, DEFAULT_CATEGORY, NO_COMPETITOR,
    RANK_SENTINEL,
};
use crate::dates::parse_day_first;
use crate::domain::{PriceRecord, RevenueRecord};
use crate::observability::metrics;
use crate::table::RawTable;

/// Where a table's observation dates come from.
///
/// The decision is column-level: a present-but-unparseable cell stays
/// unparseable, it does not fall through to the next candidate column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateSource {
    Column(&'static str),
    RunDate,
}

fn date_source(table: &RawTable) -> DateSource {
    if table.has_column(COL_DATE) {
        DateSource::Column(COL_DATE)
    } else if table.has_column(COL_EXECUTION_DATE) {
        DateSource::Column(COL_EXECUTION_DATE)
    } else {
        DateSource::RunDate
    }
}

#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    pub records_in: usize,
    pub currency_fallbacks: usize,
    pub rank_fallbacks: usize,
    /// Set when the table had no date column and every row was stamped with
    /// the run date.
    pub date_fallback_applied: bool,
    pub warnings: Vec<String>,
}

/// Turn a reconciled price table into typed records.
pub fn normalize_prices(
    table: &RawTable,
    run_date: NaiveDate,
) -> (Vec<PriceRecord>, NormalizeReport) {
    let mut report = NormalizeReport {
        records_in: table.len(),
        ..NormalizeReport::default()
    };

    let source = date_source(table);
    if source == DateSource::RunDate && !table.is_empty() {
        report.date_fallback_applied = true;
        report.warnings.push(format!(
            "price sheet has no date column; all {} rows stamped with run date {}",
            table.len(),
            run_date
        ));
    }

    let mut records = Vec::with_capacity(table.len());
    for row_index in 0..table.len() {
        let cell = |column: &str| table.cell(row_index, column).unwrap_or("");

        let price = match try_parse_currency(cell(COL_PRICE)) {
            Some(value) => value,
            None => {
                report.currency_fallbacks += 1;
                metrics::normalize::currency_fallback();
                0.0
            }
        };
        let competitor_price = match try_parse_currency(cell(COL_COMP_PRICE)) {
            Some(value) => value,
            None => {
                report.currency_fallbacks += 1;
                metrics::normalize::currency_fallback();
                0.0
            }
        };
        let rank = match try_parse_rank(cell(COL_RANK)) {
            Some(value) => value,
            None => {
                report.rank_fallbacks += 1;
                metrics::normalize::rank_fallback();
                RANK_SENTINEL
            }
        };

        let observed_on = match source {
            DateSource::Column(column) => parse_day_first(cell(column)),
            DateSource::RunDate => {
                metrics::normalize::date_fallback();
                Some(run_date)
            }
        };

        let competitor_name = cell(COL_COMP_NAME).trim();
        let category = cell(COL_CATEGORY).trim();

        records.push(PriceRecord {
            sku: cell(COL_SKU).trim().to_string(),
            product: cell(COL_PRODUCT).trim().to_string(),
            price,
            rank,
            competitor_price,
            competitor_name: if competitor_name.is_empty() {
                NO_COMPETITOR.to_string()
            } else {
                competitor_name.to_string()
            },
            category: if category.is_empty() {
                DEFAULT_CATEGORY.to_string()
            } else {
                category.to_string()
            },
            observed_on,
            row_index,
        });
    }

    metrics::normalize::records_processed(records.len() as u64);
    (records, report)
}

/// Turn a reconciled revenue table into typed records.
///
/// The returned flag says whether the table carried a date column; the join
/// key choice downstream depends on it.
pub fn normalize_revenue(table: &RawTable) -> (Vec<RevenueRecord>, bool) {
    let source = date_source(table);
    let dated = matches!(source, DateSource::Column(_));

    let mut records = Vec::with_capacity(table.len());
    for row_index in 0..table.len() {
        let cell = |column: &str| table.cell(row_index, column).unwrap_or("");

        let recorded_on = match source {
            DateSource::Column(column) => parse_day_first(cell(column)),
            // No manufactured dates here: an undated revenue sheet joins on
            // sku alone instead.
            DateSource::RunDate => None,
        };

        records.push(RevenueRecord {
            sku: cell(COL_SKU).trim().to_string(),
            revenue: parse_currency(cell(COL_REVENUE)),
            units_sold: parse_currency(cell(COL_UNITS)).max(0.0).trunc() as u64,
            recorded_on,
        });
    }

    (records, dated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        let mut t = RawTable::new(headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            t.push_row(row.iter().map(|c| c.to_string()).collect());
        }
        t
    }

    fn price_headers() -> Vec<&'static str> {
        vec![
            "Sku",
            "Product",
            "Price",
            "Rank",
            "Comp_1_Price",
            "Comp_1_Name",
            "Category",
            "Date",
        ]
    }

    #[test]
    fn normalizes_a_clean_row() {
        let t = table(
            &price_headers(),
            &[&["A-1", "Widget", "10,00", "2", "12,00", "Rival", "Tools", "15/01/2025"]],
        );
        let (records, report) = normalize_prices(&t, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.sku, "A-1");
        assert_eq!(r.price, 10.0);
        assert_eq!(r.rank, 2);
        assert_eq!(r.competitor_price, 12.0);
        assert_eq!(r.observed_on, NaiveDate::from_ymd_opt(2025, 1, 15));
        assert_eq!(report.currency_fallbacks, 0);
        assert!(!report.date_fallback_applied);
    }

    #[test]
    fn garbage_cells_fall_back_and_are_counted() {
        let t = table(
            &price_headers(),
            &[&["A-1", "Widget", "n/a", "worst", "12,00", "", "", "15/01/2025"]],
        );
        let (records, report) = normalize_prices(&t, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());

        let r = &records[0];
        assert_eq!(r.price, 0.0);
        assert_eq!(r.rank, 99);
        assert_eq!(r.competitor_name, "-");
        assert_eq!(r.category, "General");
        assert_eq!(report.currency_fallbacks, 1);
        assert_eq!(report.rank_fallbacks, 1);
    }

    #[test]
    fn missing_date_column_stamps_run_date() {
        let run_date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let t = table(&["Sku", "Price"], &[&["A-1", "10,00"], &["B-2", "20,00"]]);
        let (records, report) = normalize_prices(&t, run_date);

        assert!(records.iter().all(|r| r.observed_on == Some(run_date)));
        assert!(report.date_fallback_applied);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn unparseable_date_cell_stays_null() {
        let t = table(
            &["Sku", "Price", "Date"],
            &[&["A-1", "10,00", "not a date"]],
        );
        let (records, report) = normalize_prices(&t, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());

        // Cell-level failures never fall through to the run date
        assert_eq!(records[0].observed_on, None);
        assert!(!report.date_fallback_applied);
    }

    #[test]
    fn execution_date_is_the_column_fallback() {
        let t = table(
            &["Sku", "Price", "Execution_Date"],
            &[&["A-1", "10,00", "16/01/2025 08:30"]],
        );
        let (records, _) = normalize_prices(&t, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(records[0].observed_on, NaiveDate::from_ymd_opt(2025, 1, 16));
    }

    #[test]
    fn revenue_without_date_column_is_undated() {
        let t = table(
            &["Sku", "Revenue", "Units_Sold"],
            &[&["A-1", "1.234,56", "12"]],
        );
        let (records, dated) = normalize_revenue(&t);
        assert!(!dated);
        assert_eq!(records[0].revenue, 1234.56);
        assert_eq!(records[0].units_sold, 12);
        assert_eq!(records[0].recorded_on, None);
    }

    #[test]
    fn revenue_with_date_column_is_dated() {
        let t = table(
            &["Sku", "Revenue", "Units_Sold", "Date"],
            &[&["A-1", "100", "5", "16/01/2025"]],
        );
        let (records, dated) = normalize_revenue(&t);
        assert!(dated);
        assert_eq!(records[0].recorded_on, NaiveDate::from_ymd_opt(2025, 1, 16));
    }
}
