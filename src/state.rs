//! Shared application state wiring configuration, the workbook, and the
//! result cache together. Commands construct one `AppState` and pull the
//! history/snapshot views through it.

use tracing::{error, info};

use crate::cache::ResultCache;
use crate::config::Config;
use crate::constants::{PRICES_SHEET, REVENUE_SHEET};
use crate::dates;
use crate::error::Result;
use crate::pipeline::{self, PipelineOutput};
use crate::table::RawTable;
use crate::workbook::Workbook;

pub struct AppState {
    pub config: Config,
    pub workbook: Workbook,
    cache: ResultCache,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let workbook = Workbook::open(&config.workbook_dir)?;
        let cache = ResultCache::with_ttl_secs(config.cache_ttl_secs);
        Ok(AppState {
            config,
            workbook,
            cache,
        })
    }

    /// Load the history and snapshot views, reading the workbook at most once
    /// per cache window. `refresh` drops every cached result first, so the
    /// sheets are re-read even mid-window.
    ///
    /// An unreadable price sheet does not abort: the run proceeds on an empty
    /// table and the condition leads the run report's warnings.
    pub fn load_views(&self, refresh: bool) -> Result<PipelineOutput> {
        if refresh {
            info!("refresh requested, dropping cached views");
            self.cache.invalidate_all();
        }
        let workbook_dir = self.workbook.dir().display().to_string();
        let map = self.config.column_map();
        self.cache.get_or_compute("load_views", &workbook_dir, || {
            let (prices, load_warning) = match self.workbook.read_sheet(PRICES_SHEET) {
                Ok(table) => (table, None),
                Err(e) => {
                    error!("price sheet unavailable: {}", e);
                    (
                        RawTable::default(),
                        Some(format!("price sheet unavailable ({}); views are empty", e)),
                    )
                }
            };
            let revenue = self.workbook.read_sheet_or_empty(REVENUE_SHEET);
            let mut output = pipeline::run(prices, revenue, dates::run_date(), &map);
            if let Some(warning) = load_warning {
                output.report.warnings.insert(0, warning);
            }
            Ok(output)
        })
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn state_for(dir: &std::path::Path) -> AppState {
        let config = Config {
            workbook_dir: dir.display().to_string(),
            ..Config::default()
        };
        AppState::new(config).unwrap()
    }

    #[test]
    fn views_are_served_from_cache_until_refresh() {
        let dir = tempdir().unwrap();
        let state = state_for(dir.path());
        let prices_path = state.workbook.sheet_path(PRICES_SHEET);

        std::fs::write(&prices_path, "Sku,Price,Date\nA-1,\"10,00\",15/01/2025\n").unwrap();
        let first = state.load_views(false).unwrap();
        assert_eq!(first.snapshot.len(), 1);
        assert_eq!(first.snapshot[0].price, 10.0);

        // A second row lands on disk, but the cached view is still served.
        std::fs::write(
            &prices_path,
            "Sku,Price,Date\nA-1,\"10,00\",15/01/2025\nB-2,\"20,00\",15/01/2025\n",
        )
        .unwrap();
        let cached = state.load_views(false).unwrap();
        assert_eq!(cached.snapshot.len(), 1);

        let refreshed = state.load_views(true).unwrap();
        assert_eq!(refreshed.snapshot.len(), 2);
    }

    #[test]
    fn missing_prices_sheet_degrades_to_empty_views() {
        let dir = tempdir().unwrap();
        let state = state_for(dir.path());

        let output = state.load_views(false).unwrap();
        assert!(output.snapshot.is_empty());
        assert!(output.history.is_empty());
        assert!(output.report.warnings[0].contains("price sheet unavailable"));
    }

    #[test]
    fn refresh_picks_up_a_sheet_created_after_a_degraded_load() {
        let dir = tempdir().unwrap();
        let state = state_for(dir.path());
        assert!(state.load_views(false).unwrap().snapshot.is_empty());

        let prices_path = state.workbook.sheet_path(PRICES_SHEET);
        std::fs::write(&prices_path, "Sku,Price,Date\nA-1,\"10,00\",15/01/2025\n").unwrap();

        // The degraded result is cached like any other.
        assert!(state.load_views(false).unwrap().snapshot.is_empty());
        assert_eq!(state.load_views(true).unwrap().snapshot.len(), 1);
    }
}
