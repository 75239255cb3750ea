use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use pricewatch::config::Config;
use pricewatch::constants::REVENUE_SHEET;
use pricewatch::dates::parse_day_first;
use pricewatch::observability::init_logging;
use pricewatch::revenue_report::convert_revenue_report;
use pricewatch::workbook::Workbook;

/// Converts an analytics revenue report export into the revenue sheet,
/// replacing whatever the sheet held before.
#[derive(Parser)]
#[command(name = "revenue-sync")]
#[command(about = "Replaces the revenue sheet from an analytics report export")]
struct Args {
    /// Analytics report JSON file
    #[arg(long)]
    report: String,
    /// Workbook directory (defaults to the configured one)
    #[arg(long)]
    workbook: Option<String>,
    /// Stamp every row with this day-first date; without it rows stay
    /// undated and the pipeline joins on sku alone
    #[arg(long)]
    date: Option<String>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = Config::load()?;
    init_logging(&config.log_dir);
    let args = Args::parse();

    let recorded_on = match args.date.as_deref() {
        Some(raw) => match parse_day_first(raw) {
            Some(date) => Some(date),
            None => anyhow::bail!("--date '{}' is not a recognizable day-first date", raw),
        },
        None => None,
    };

    let report_json = fs::read_to_string(&args.report)
        .with_context(|| format!("reading report {}", args.report))?;
    let report: serde_json::Value = serde_json::from_str(&report_json)?;
    let table = convert_revenue_report(&report, recorded_on)?;

    let dir = args.workbook.unwrap_or(config.workbook_dir);
    let workbook = Workbook::open(&dir)?;
    workbook.replace_sheet(REVENUE_SHEET, &table)?;

    info!(rows = table.len(), workbook = %dir, "revenue sheet replaced");
    println!("✅ Wrote {} revenue rows to {}", table.len(), dir);
    Ok(())
}
