//! Simple metrics module for the pricewatch pipeline
//!
//! This module provides a straightforward API for recording metrics using
//! the standard Prometheus naming conventions.

use std::fmt;
use std::sync::OnceLock;

use metrics_exporter_prometheus::PrometheusHandle;

/// Enum representing all metric names used in the system
/// This eliminates magic strings and provides compile-time safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Reconcile metrics
    ReconcileTablesProcessed,
    ReconcileAliasesApplied,
    ReconcileColumnsSynthesized,

    // Normalize metrics
    NormalizeRecordsProcessed,
    NormalizeCurrencyFallbacks,
    NormalizeRankFallbacks,
    NormalizeDateFallbacks,

    // Reduce metrics
    ReduceHistoryRows,
    ReduceSnapshotRows,
    ReduceRevenueMatches,
    ReduceDuration,

    // Cache metrics
    CacheHits,
    CacheMisses,
    CacheInvalidations,

    // Sheet metrics
    SheetReadsSuccess,
    SheetReadsError,
    SheetWritesSuccess,
    SheetWritesError,

    // Model metrics
    ModelResponsesParsed,
    ModelResponsesRejected,
}

impl MetricName {
    /// Get the metric name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            // Reconcile metrics
            MetricName::ReconcileTablesProcessed => "pricewatch_reconcile_tables_processed_total",
            MetricName::ReconcileAliasesApplied => "pricewatch_reconcile_aliases_applied_total",
            MetricName::ReconcileColumnsSynthesized => {
                "pricewatch_reconcile_columns_synthesized_total"
            }

            // Normalize metrics
            MetricName::NormalizeRecordsProcessed => "pricewatch_normalize_records_processed_total",
            MetricName::NormalizeCurrencyFallbacks => {
                "pricewatch_normalize_currency_fallbacks_total"
            }
            MetricName::NormalizeRankFallbacks => "pricewatch_normalize_rank_fallbacks_total",
            MetricName::NormalizeDateFallbacks => "pricewatch_normalize_date_fallbacks_total",

            // Reduce metrics
            MetricName::ReduceHistoryRows => "pricewatch_reduce_history_rows",
            MetricName::ReduceSnapshotRows => "pricewatch_reduce_snapshot_rows",
            MetricName::ReduceRevenueMatches => "pricewatch_reduce_revenue_matches_total",
            MetricName::ReduceDuration => "pricewatch_reduce_duration_seconds",

            // Cache metrics
            MetricName::CacheHits => "pricewatch_cache_hits_total",
            MetricName::CacheMisses => "pricewatch_cache_misses_total",
            MetricName::CacheInvalidations => "pricewatch_cache_invalidations_total",

            // Sheet metrics
            MetricName::SheetReadsSuccess => "pricewatch_sheet_reads_success_total",
            MetricName::SheetReadsError => "pricewatch_sheet_reads_error_total",
            MetricName::SheetWritesSuccess => "pricewatch_sheet_writes_success_total",
            MetricName::SheetWritesError => "pricewatch_sheet_writes_error_total",

            // Model metrics
            MetricName::ModelResponsesParsed => "pricewatch_model_responses_parsed_total",
            MetricName::ModelResponsesRejected => "pricewatch_model_responses_rejected_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics system with an in-process Prometheus recorder
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();

    let handle = builder
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;

    METRICS_HANDLE.set(handle).ok();
    Ok(())
}

/// Render all collected metrics in Prometheus text format
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

// ============================================================================
// Reconcile Metrics
// ============================================================================

pub mod reconcile {
    use super::MetricName;

    /// Record a table passing through column reconciliation
    pub fn table_processed() {
        ::metrics::counter!(MetricName::ReconcileTablesProcessed.as_str()).increment(1);
    }

    /// Record an alias header mapped to its canonical name
    pub fn alias_applied(canonical: &str) {
        ::metrics::counter!(MetricName::ReconcileAliasesApplied.as_str(), "column" => canonical.to_string())
            .increment(1);
    }

    /// Record a missing column synthesized with defaults
    pub fn column_synthesized(canonical: &str) {
        ::metrics::counter!(MetricName::ReconcileColumnsSynthesized.as_str(), "column" => canonical.to_string())
            .increment(1);
    }
}

// ============================================================================
// Normalize Metrics
// ============================================================================

pub mod normalize {
    use super::MetricName;

    /// Record records processed through value normalization
    pub fn records_processed(count: u64) {
        ::metrics::counter!(MetricName::NormalizeRecordsProcessed.as_str()).increment(count);
    }

    /// Record an unparseable currency cell coerced to zero
    pub fn currency_fallback() {
        ::metrics::counter!(MetricName::NormalizeCurrencyFallbacks.as_str()).increment(1);
    }

    /// Record an unparseable rank cell coerced to the sentinel
    pub fn rank_fallback() {
        ::metrics::counter!(MetricName::NormalizeRankFallbacks.as_str()).increment(1);
    }

    /// Record a date cell that fell back to the run date
    pub fn date_fallback() {
        ::metrics::counter!(MetricName::NormalizeDateFallbacks.as_str()).increment(1);
    }
}

// ============================================================================
// Reduce Metrics
// ============================================================================

pub mod reduce {
    use super::MetricName;

    /// Record the size of the produced history view
    pub fn history_rows(count: usize) {
        ::metrics::histogram!(MetricName::ReduceHistoryRows.as_str()).record(count as f64);
    }

    /// Record the size of the produced snapshot view
    pub fn snapshot_rows(count: usize) {
        ::metrics::histogram!(MetricName::ReduceSnapshotRows.as_str()).record(count as f64);
    }

    /// Record rows that found a revenue match during the join
    pub fn revenue_matches(count: u64) {
        ::metrics::counter!(MetricName::ReduceRevenueMatches.as_str()).increment(count);
    }

    /// Record reduction duration
    pub fn duration(secs: f64) {
        ::metrics::histogram!(MetricName::ReduceDuration.as_str()).record(secs);
    }
}

// ============================================================================
// Cache Metrics
// ============================================================================

pub mod cache {
    use super::MetricName;

    /// Record a cache hit
    pub fn hit(fn_id: &str) {
        ::metrics::counter!(MetricName::CacheHits.as_str(), "fn" => fn_id.to_string())
            .increment(1);
    }

    /// Record a cache miss
    pub fn miss(fn_id: &str) {
        ::metrics::counter!(MetricName::CacheMisses.as_str(), "fn" => fn_id.to_string())
            .increment(1);
    }

    /// Record a full cache invalidation
    pub fn invalidated() {
        ::metrics::counter!(MetricName::CacheInvalidations.as_str()).increment(1);
    }
}

// ============================================================================
// Sheet Metrics
// ============================================================================

pub mod sheets {
    use super::MetricName;

    /// Record a successful sheet read
    pub fn read_success(sheet: &str) {
        ::metrics::counter!(MetricName::SheetReadsSuccess.as_str(), "sheet" => sheet.to_string())
            .increment(1);
    }

    /// Record a failed sheet read
    pub fn read_error(sheet: &str) {
        ::metrics::counter!(MetricName::SheetReadsError.as_str(), "sheet" => sheet.to_string())
            .increment(1);
    }

    /// Record a successful sheet write
    pub fn write_success(sheet: &str) {
        ::metrics::counter!(MetricName::SheetWritesSuccess.as_str(), "sheet" => sheet.to_string())
            .increment(1);
    }

    /// Record a failed sheet write
    pub fn write_error(sheet: &str) {
        ::metrics::counter!(MetricName::SheetWritesError.as_str(), "sheet" => sheet.to_string())
            .increment(1);
    }
}

// ============================================================================
// Model Metrics
// ============================================================================

pub mod model {
    use super::MetricName;

    /// Record a model response that parsed cleanly
    pub fn response_parsed(kind: &str) {
        ::metrics::counter!(MetricName::ModelResponsesParsed.as_str(), "kind" => kind.to_string())
            .increment(1);
    }

    /// Record a model response that could not be parsed
    pub fn response_rejected(kind: &str) {
        ::metrics::counter!(MetricName::ModelResponsesRejected.as_str(), "kind" => kind.to_string())
            .increment(1);
    }
}
