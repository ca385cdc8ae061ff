//! Dashboard configuration.
//!
//! Values come from an optional TOML file, then the `NIGHTLY_ROOT` and
//! `NIGHTLY_CATALOG` environment variables, then command-line flags.
//!
//! ```toml
//! root = "https://nightly.example.org/latest"
//! catalog = "https://nightly.example.org/previous-runs.json"
//! chart_mode = "speedup"
//! http_timeout_secs = 30
//! ```

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{DashboardError, Result};
use crate::fetch::join_location;
use crate::run::ChartMode;

pub const ROOT_ENV: &str = "NIGHTLY_ROOT";
pub const CATALOG_ENV: &str = "NIGHTLY_CATALOG";
pub const DEFAULT_CATALOG_PATH: &str = "data/previous-runs.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Location of the current nightly (directory or URL holding `data/`).
    pub root: String,
    /// Run catalog location. Defaults to `<root>/data/previous-runs.json`.
    pub catalog: Option<String>,
    pub chart_mode: ChartMode,
    pub http_timeout_secs: u64,
    pub log_level: String,
    /// Address for `nightly serve`.
    pub bind: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            catalog: None,
            chart_mode: ChartMode::Absolute,
            http_timeout_secs: 30,
            log_level: "info".to_string(),
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| DashboardError::config(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| DashboardError::config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// File (when given) with environment overrides applied.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        if let Ok(root) = env::var(ROOT_ENV) {
            self.root = root;
        }
        if let Ok(catalog) = env::var(CATALOG_ENV) {
            self.catalog = Some(catalog);
        }
    }

    pub fn catalog_location(&self) -> String {
        self.catalog
            .clone()
            .unwrap_or_else(|| join_location(&self.root, DEFAULT_CATALOG_PATH))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
