use std::collections::HashMap;
use std::io;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;

use pricewatch::collapsed;
use pricewatch::config::Config;
use pricewatch::domain::{points_table, PricePoint};
use pricewatch::insights::{self, SavedResponse};
use pricewatch::observability::{self, init_logging, init_metrics};
use pricewatch::state::AppState;
use pricewatch::workbook::Workbook;

#[derive(Parser)]
#[command(name = "pricewatch")]
#[command(about = "Competitor price history normalizer and snapshot builder")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write the history and snapshot views
    Report {
        /// Directory the view CSVs are written to
        #[arg(long, default_value = "output")]
        out: String,
        /// Drop cached views and re-read the workbook
        #[arg(long)]
        refresh: bool,
        /// Print rendered metrics after the run
        #[arg(long)]
        metrics: bool,
    },
    /// Print the latest observation per sku
    Snapshot {
        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,
        /// Drop cached views and re-read the workbook
        #[arg(long)]
        refresh: bool,
    },
    /// Print the price history
    History {
        /// Restrict the output to one sku
        #[arg(long)]
        sku: Option<String>,
        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,
    },
    /// Classify the snapshot into strategic clusters
    Classify {
        /// Saved model response file to parse
        #[arg(long, required_unless_present = "emit_prompt")]
        response: Option<String>,
        /// Print the clustering prompt instead of parsing a response
        #[arg(long)]
        emit_prompt: bool,
    },
    /// Pricing advice for one sku
    Strategy {
        #[arg(long)]
        sku: String,
        /// Saved model response file; without it the prompt is printed
        #[arg(long)]
        response: Option<String>,
    },
    /// Recover rows from a collapsed sheet export
    Recover {
        /// File of glued single-string rows
        #[arg(long)]
        input: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::load()?;
    init_logging(&config.log_dir);
    if let Err(e) = init_metrics() {
        warn!("metrics recorder not installed: {}", e);
    }

    let cli = Cli::parse();
    let state = AppState::new(config)?;

    match cli.command {
        Commands::Report {
            out,
            refresh,
            metrics,
        } => run_report(&state, &out, refresh, metrics)?,
        Commands::Snapshot { format, refresh } => {
            let output = state.load_views(refresh)?;
            print_points(&output.snapshot, format)?;
        }
        Commands::History { sku, format } => {
            let output = state.load_views(false)?;
            let points: Vec<PricePoint> = output
                .history
                .iter()
                .filter(|p| sku.as_deref().map_or(true, |s| p.sku == s))
                .cloned()
                .collect();
            print_points(&points, format)?;
        }
        Commands::Classify {
            response,
            emit_prompt,
        } => run_classify(&state, response.as_deref(), emit_prompt)?,
        Commands::Strategy { sku, response } => run_strategy(&state, &sku, response.as_deref())?,
        Commands::Recover { input } => run_recover(&input)?,
    }
    Ok(())
}

fn run_report(
    state: &AppState,
    out: &str,
    refresh: bool,
    metrics: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = state.load_views(refresh)?;
    let out_dir = Workbook::open(out)?;
    out_dir.replace_sheet("history", &points_table(&output.history))?;
    out_dir.replace_sheet("snapshot", &points_table(&output.snapshot))?;

    let report = &output.report;
    println!("\n📊 Run {}:", report.run_id);
    println!("   Price rows in: {}", report.price_rows_in);
    println!("   Dropped (no usable date): {}", report.price_rows_dropped);
    println!("   History rows: {}", report.history_rows);
    println!("   Snapshot rows: {}", report.snapshot_rows);
    println!("   Revenue join: {:?}", report.join_key);
    println!("   Duration: {} ms", report.duration_ms);
    println!("   Output dir: {}", out);
    if !report.warnings.is_empty() {
        println!("\n⚠️  Warnings:");
        for warning in &report.warnings {
            println!("   - {}", warning);
        }
    }

    if metrics {
        if let Some(rendered) = observability::metrics::render() {
            println!("\n{}", rendered);
        }
    }
    Ok(())
}

fn print_points(points: &[PricePoint], format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Csv => points_table(points).to_csv_writer(io::stdout())?,
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(points)?),
    }
    Ok(())
}

fn run_classify(
    state: &AppState,
    response: Option<&str>,
    emit_prompt: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = state.load_views(false)?;

    if emit_prompt {
        let sample = insights::sample_for_clustering(&output.snapshot);
        println!("{}", insights::build_clustering_prompt(&sample));
        return Ok(());
    }

    let path = match response {
        Some(path) => path,
        None => return Err("--response <FILE> is required unless --emit-prompt is set".into()),
    };
    let model = SavedResponse::new(path);
    let labels = insights::classify_snapshot(&model, &output.snapshot)?;
    if labels.is_empty() {
        println!("⚠️  No usable classification in the response");
        return Ok(());
    }

    let by_sku: HashMap<&str, String> = labels
        .iter()
        .map(|l| (l.sku.as_str(), String::from(l.cluster.clone())))
        .collect();
    let clusters: Vec<String> = output
        .snapshot
        .iter()
        .map(|p| by_sku.get(p.sku.as_str()).cloned().unwrap_or_default())
        .collect();
    let mut table = points_table(&output.snapshot);
    table.add_column("Cluster", "");
    table.fill_column("Cluster", &clusters);
    table.to_csv_writer(io::stdout())?;
    Ok(())
}

fn run_strategy(
    state: &AppState,
    sku: &str,
    response: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = state.load_views(false)?;
    let point = match output.snapshot.iter().find(|p| p.sku == sku) {
        Some(point) => point,
        None => return Err(format!("sku '{}' not found in the snapshot", sku).into()),
    };

    match response {
        None => println!("{}", insights::build_strategy_prompt(point)),
        Some(path) => {
            let model = SavedResponse::new(path);
            match insights::advise_strategy(&model, point) {
                Ok(advice) => {
                    println!("\n📊 {} ({})", point.sku, point.product);
                    println!("   Strategy: {}", String::from(advice.strategy));
                    println!("   Recommended price: {:.2}", advice.recommended_price);
                    println!("   Reason: {}", advice.reason);
                }
                Err(e) => println!("⚠️  Could not read strategy advice: {}", e),
            }
        }
    }
    Ok(())
}

fn run_recover(input: &str) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(input)?;
    let rows = collapsed::parse_collapsed(&raw);
    if rows.is_empty() {
        eprintln!("⚠️  No collapsed rows recognized in {}", input);
    }
    collapsed::to_table(&rows).to_csv_writer(io::stdout())?;
    Ok(())
}
