use anyhow::Result;
use chrono::NaiveDate;
use serde_json::json;
use tempfile::tempdir;

use pricewatch::config::Config;
use pricewatch::constants::{PRICES_SHEET, REVENUE_SHEET};
use pricewatch::domain::RevenueJoinKey;
use pricewatch::feed::parse_feed;
use pricewatch::offers::flatten_offers_report;
use pricewatch::pipeline;
use pricewatch::pipeline::reconcile::ColumnMap;
use pricewatch::revenue_report::convert_revenue_report;
use pricewatch::state::AppState;
use pricewatch::table::RawTable;
use pricewatch::workbook::Workbook;

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()
}

fn run(prices_csv: &str, revenue_csv: Option<&str>) -> Result<pipeline::PipelineOutput> {
    let prices = RawTable::from_csv_reader(prices_csv.as_bytes())?;
    let revenue = match revenue_csv {
        Some(csv) => RawTable::from_csv_reader(csv.as_bytes())?,
        None => RawTable::default(),
    };
    Ok(pipeline::run(prices, revenue, run_date(), &ColumnMap::default()))
}

#[test]
fn two_day_history_reduces_to_latest_snapshot() -> Result<()> {
    let dir = tempdir()?;
    let config = Config {
        workbook_dir: dir.path().display().to_string(),
        ..Config::default()
    };
    let state = AppState::new(config)?;
    std::fs::write(
        state.workbook.sheet_path(PRICES_SHEET),
        "Sku,Product,Price,Comp_1_Price,Date\n\
         A1,Widget,\"10,00\",\"12,00\",15/01/2025\n\
         A1,Widget,\"9,50\",\"12,00\",16/01/2025\n",
    )?;

    let output = state.load_views(false)?;

    assert_eq!(output.history.len(), 2);
    assert_eq!(output.snapshot.len(), 1);
    let snap = &output.snapshot[0];
    assert_eq!(snap.sku, "A1");
    assert_eq!(snap.price, 9.5);
    assert_eq!(snap.observed_on, NaiveDate::from_ymd_opt(2025, 1, 16).unwrap());
    assert_eq!(snap.revenue, 0.0);
    assert_eq!(snap.units_sold, 0);
    assert_eq!(output.report.join_key, RevenueJoinKey::None);
    Ok(())
}

#[test]
fn sheet_without_dates_keeps_every_row_on_run_date() -> Result<()> {
    let output = run(
        "Sku,Price\nA1,\"10,00\"\nB2,\"20,00\"\n",
        None,
    )?;

    assert_eq!(output.report.price_rows_dropped, 0);
    assert_eq!(output.history.len(), 2);
    assert!(output.history.iter().all(|p| p.observed_on == run_date()));
    assert!(output
        .report
        .warnings
        .iter()
        .any(|w| w.contains("no date column")));
    Ok(())
}

#[test]
fn zero_competitor_price_scores_neutral_index() -> Result<()> {
    let output = run(
        "Sku,Price,Comp_1_Price,Date\nA1,\"10,00\",0,16/01/2025\n",
        None,
    )?;
    assert_eq!(output.snapshot[0].price_index, 100.0);
    Ok(())
}

#[test]
fn legacy_headers_and_missing_rank_normalize() -> Result<()> {
    let output = run(
        "Codice,Prezzo,Data\nA1,\"10,00\",16/01/2025\n",
        None,
    )?;

    let snap = &output.snapshot[0];
    assert_eq!(snap.sku, "A1");
    assert_eq!(snap.price, 10.0);
    assert_eq!(snap.rank, 99);
    assert_eq!(snap.competitor_name, "-");
    assert_eq!(snap.category, "General");
    assert!(output
        .report
        .warnings
        .iter()
        .any(|w| w.contains("'Rank' synthesized")));
    Ok(())
}

#[test]
fn dated_revenue_joins_by_day() -> Result<()> {
    let output = run(
        "Sku,Price,Date\nA1,\"10,00\",15/01/2025\nA1,\"9,50\",16/01/2025\n",
        Some("Sku,Revenue,Units_Sold,Date\nA1,\"150,00\",3,16/01/2025\n"),
    )?;

    assert_eq!(output.report.join_key, RevenueJoinKey::SkuAndDate);
    assert_eq!(output.history[0].revenue, 0.0);
    assert_eq!(output.history[1].revenue, 150.0);
    assert_eq!(output.history[1].units_sold, 3);
    Ok(())
}

#[test]
fn undated_revenue_broadcasts_with_a_warning() -> Result<()> {
    let output = run(
        "Sku,Price,Date\nA1,\"10,00\",15/01/2025\nA1,\"9,50\",16/01/2025\n",
        Some("Sku,Revenue,Units_Sold\nA1,\"150,00\",3\n"),
    )?;

    assert_eq!(output.report.join_key, RevenueJoinKey::SkuOnly);
    assert!(output.history.iter().all(|p| p.revenue == 150.0));
    assert!(output
        .report
        .warnings
        .iter()
        .any(|w| w.contains("broadcast")));
    Ok(())
}

#[test]
fn rows_with_unparseable_dates_are_dropped_and_counted() -> Result<()> {
    let output = run(
        "Sku,Price,Date\nA1,\"10,00\",16/01/2025\nB2,\"20,00\",not a date\n",
        None,
    )?;

    assert_eq!(output.report.price_rows_in, 2);
    assert_eq!(output.report.price_rows_dropped, 1);
    assert_eq!(output.history.len(), 1);
    assert_eq!(output.history[0].sku, "A1");
    Ok(())
}

#[test]
fn offer_report_rows_flow_into_the_snapshot() -> Result<()> {
    let dir = tempdir()?;
    let report = json!([
        {
            "Sku": "10001",
            "Product": "Eau de Parfum 50ml",
            "Price": "19,90",
            "Rank": 2,
            "BestOffers": [
                {"Merchant": "ShopRival", "Price": "18,50"}
            ],
            "Popularity": "7",
            "MinPrice": "18,50"
        }
    ]);
    let feed_xml =
        "<rss><item><g:id>10001</g:id><title>Eau de Parfum 50ml</title></item></rss>";
    let products = parse_feed(feed_xml, 500);
    let table = flatten_offers_report(&report, &products, "16/01/2025 09:30")?;

    let workbook = Workbook::open(dir.path())?;
    workbook.append_rows(PRICES_SHEET, &table)?;

    let prices = workbook.read_sheet(PRICES_SHEET)?;
    let output = pipeline::run(prices, RawTable::default(), run_date(), &ColumnMap::default());

    let snap = &output.snapshot[0];
    assert_eq!(snap.sku, "10001");
    assert_eq!(snap.price, 19.9);
    assert_eq!(snap.competitor_price, 18.5);
    assert_eq!(snap.competitor_name, "ShopRival");
    assert_eq!(snap.rank, 2);
    assert_eq!(snap.observed_on, NaiveDate::from_ymd_opt(2025, 1, 16).unwrap());
    Ok(())
}

#[test]
fn revenue_report_replaces_sheet_and_joins_on_sku() -> Result<()> {
    let dir = tempdir()?;
    let workbook = Workbook::open(dir.path())?;
    std::fs::write(
        workbook.sheet_path(PRICES_SHEET),
        "Sku,Price,Date\nA1,\"10,00\",15/01/2025\nA1,\"9,50\",16/01/2025\n",
    )?;

    let report = json!({
        "rows": [
            {
                "dimensionValues": [{"value": "A1"}],
                "metricValues": [{"value": "3"}, {"value": "150.5"}]
            }
        ]
    });
    let table = convert_revenue_report(&report, None)?;
    workbook.replace_sheet(REVENUE_SHEET, &table)?;

    let prices = workbook.read_sheet(PRICES_SHEET)?;
    let revenue = workbook.read_sheet(REVENUE_SHEET)?;
    let output = pipeline::run(prices, revenue, run_date(), &ColumnMap::default());

    assert_eq!(output.report.join_key, RevenueJoinKey::SkuOnly);
    assert!(output.history.iter().all(|p| p.revenue == 150.5));
    assert!(output.history.iter().all(|p| p.units_sold == 3));
    Ok(())
}
