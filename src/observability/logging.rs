use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber: human-readable console output on stderr
/// plus a daily-rolling JSON file under `log_dir`.
///
/// Console logs go to stderr because stdout is reserved for command output
/// (CSV/JSON) and must stay pipeable.
pub fn init_logging(log_dir: &str) {
    let _ = fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::daily(log_dir, "pricewatch.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("pricewatch=info".parse().unwrap()))
        .with(file_layer)
        .with(console_layer)
        .init();

    // The appender guard must outlive the process or buffered lines are lost
    std::mem::forget(guard);
}
