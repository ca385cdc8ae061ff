//! Default comparison run selection.
//!
//! The catalog is assumed to be chronological, but timestamps win over
//! position when an entry carries one.

use crate::errors::{DashboardError, Result};
use crate::run::RunSummary;

#[derive(Clone, Debug, Default)]
pub struct BaselineSelector {
    current: Option<String>,
}

impl BaselineSelector {
    pub fn new(current_location: Option<&str>) -> Self {
        Self {
            current: current_location.map(normalize),
        }
    }

    /// Most recent run that is not the current one, or 0 when there is no such run.
    pub fn select_default_index(&self, runs: &[RunSummary]) -> Result<usize> {
        if runs.is_empty() {
            return Err(DashboardError::selection(
                "no previous runs to compare against",
            ));
        }
        let best = runs
            .iter()
            .enumerate()
            .filter(|(_, run)| !self.is_current(run))
            .max_by_key(|(idx, run)| (run.timestamp, *idx))
            .map(|(idx, _)| idx);
        Ok(best.unwrap_or(0))
    }

    fn is_current(&self, run: &RunSummary) -> bool {
        self.current
            .as_deref()
            .is_some_and(|current| normalize(&run.url) == current)
    }
}

pub fn select_default_index(runs: &[RunSummary]) -> Result<usize> {
    BaselineSelector::default().select_default_index(runs)
}

fn normalize(location: &str) -> String {
    location.trim_end_matches('/').to_string()
}
