use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::errors::{DashboardError, Result};
use crate::fetch::{Fetcher, join_location};
use crate::run::{Run, RunSummary};

pub const PROFILE_PATH: &str = "data/profile.json";

#[derive(Clone, Debug)]
pub struct RunLoader<F> {
    fetcher: F,
    catalog: String,
}

impl<F: Fetcher> RunLoader<F> {
    pub fn new<C: Into<String>>(fetcher: F, catalog: C) -> Self {
        Self {
            fetcher,
            catalog: catalog.into(),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    pub fn profile_location(location: &str) -> String {
        join_location(location, PROFILE_PATH)
    }

    /// Loads `<location>/data/profile.json`.
    pub fn fetch_run(&self, location: &str) -> Result<Run> {
        let target = Self::profile_location(location);
        let run: Run = self.fetch_json(&target)?;
        info!(location, records = run.len(), "loaded run");
        Ok(run)
    }

    /// Catalog of previously recorded runs, in source order.
    pub fn fetch_previous_runs(&self) -> Result<Vec<RunSummary>> {
        let runs: Vec<RunSummary> = self.fetch_json(&self.catalog)?;
        info!(catalog = %self.catalog, runs = runs.len(), "loaded run catalog");
        Ok(runs)
    }

    pub fn fetch_text(&self, location: &str) -> Result<String> {
        self.fetcher.fetch_text(location)
    }

    pub fn fetch_json<T: DeserializeOwned>(&self, location: &str) -> Result<T> {
        let body = self.fetcher.fetch_text(location)?;
        debug!(location, bytes = body.len(), "decoding json");
        serde_json::from_str(&body).map_err(|e| DashboardError::parse(format!("{location}: {e}")))
    }
}
