use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use pricewatch::config::Config;
use pricewatch::constants::{FEED_PRODUCT_LIMIT, PRICES_SHEET};
use pricewatch::feed::parse_feed;
use pricewatch::observability::init_logging;
use pricewatch::offers::flatten_offers_report;
use pricewatch::workbook::Workbook;

/// Converts a ranked-offers report plus a product feed into price-sheet rows
/// and appends them to the workbook's price sheet.
#[derive(Parser)]
#[command(name = "offers-sync")]
#[command(about = "Appends ranked-offer rows to the price sheet")]
struct Args {
    /// Ranked-offers JSON report file
    #[arg(long)]
    report: String,
    /// Product feed XML file
    #[arg(long)]
    feed: String,
    /// Workbook directory (defaults to the configured one)
    #[arg(long)]
    workbook: Option<String>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = Config::load()?;
    init_logging(&config.log_dir);
    let args = Args::parse();

    let feed_xml = fs::read_to_string(&args.feed)
        .with_context(|| format!("reading feed {}", args.feed))?;
    let products = parse_feed(&feed_xml, FEED_PRODUCT_LIMIT);
    println!("📥 {} products in the feed", products.len());

    let report_json = fs::read_to_string(&args.report)
        .with_context(|| format!("reading report {}", args.report))?;
    let report: serde_json::Value = serde_json::from_str(&report_json)?;

    let executed_at = chrono::Local::now().format("%d/%m/%Y %H:%M").to_string();
    let table = flatten_offers_report(&report, &products, &executed_at)?;

    let dir = args.workbook.unwrap_or(config.workbook_dir);
    let workbook = Workbook::open(&dir)?;
    workbook.append_rows(PRICES_SHEET, &table)?;

    info!(rows = table.len(), workbook = %dir, "offer rows appended");
    println!(
        "✅ Appended {} rows to the {} sheet in {}",
        table.len(),
        PRICES_SHEET,
        dir
    );
    Ok(())
}
