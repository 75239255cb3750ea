use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::pipeline::reconcile::ColumnMap;

const CONFIG_PATH: &str = "pricewatch.toml";

const DEFAULT_WORKBOOK_DIR: &str = "workbook";
const DEFAULT_CACHE_TTL_SECS: u64 = 600;
const DEFAULT_LOG_DIR: &str = "logs";

/// Runtime configuration: an optional `pricewatch.toml` supplies the base
/// values, environment variables override them.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_workbook_dir")]
    pub workbook_dir: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    /// Extra header aliases for exports the built-in map has not caught up
    /// with yet, as an `[aliases]` table of alias = canonical pairs.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

fn default_workbook_dir() -> String {
    DEFAULT_WORKBOOK_DIR.to_string()
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_log_dir() -> String {
    DEFAULT_LOG_DIR.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            workbook_dir: default_workbook_dir(),
            cache_ttl_secs: default_cache_ttl_secs(),
            log_dir: default_log_dir(),
            aliases: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = if Path::new(CONFIG_PATH).exists() {
            let config_content = fs::read_to_string(CONFIG_PATH)?;
            toml::from_str(&config_content)?
        } else {
            Config::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// The alias table reconciliation should run with under this config.
    pub fn column_map(&self) -> ColumnMap {
        if self.aliases.is_empty() {
            ColumnMap::default()
        } else {
            ColumnMap::with_overrides(&self.aliases)
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = env::var("PRICEWATCH_WORKBOOK") {
            if !dir.is_empty() {
                self.workbook_dir = dir;
            }
        }
        if let Ok(ttl) = env::var("PRICEWATCH_CACHE_TTL") {
            if let Ok(secs) = ttl.parse::<u64>() {
                self.cache_ttl_secs = secs;
            }
        }
        if let Ok(dir) = env::var("PRICEWATCH_LOG_DIR") {
            if !dir.is_empty() {
                self.log_dir = dir;
            }
        }
    }
}
