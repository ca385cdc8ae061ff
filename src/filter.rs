//! Mode and benchmark checkbox state.
//!
//! Identifiers that the current run does not contain are ignored, so the
//! enabled sets never hold anything the chart could not show.

use std::fmt;
use std::str::FromStr;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::DataStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Mode,
    Benchmark,
}

impl FilterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Mode => "mode",
            FilterKind::Benchmark => "benchmark",
        }
    }
}

impl FromStr for FilterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mode" | "modes" | "runmode" => Ok(FilterKind::Mode),
            "benchmark" | "benchmarks" => Ok(FilterKind::Benchmark),
            other => Err(format!("unknown filter kind {other}")),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single checkbox state change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterEvent {
    pub kind: FilterKind,
    pub id: String,
    pub enabled: bool,
}

impl FilterEvent {
    pub fn new<T: Into<String>>(kind: FilterKind, id: T, enabled: bool) -> Self {
        Self {
            kind,
            id: id.into(),
            enabled,
        }
    }
}

/// Sets membership of every known identifier of `kind`. Returns whether anything changed.
pub fn set_all(store: &mut DataStore, kind: FilterKind, enabled: bool) -> bool {
    let known = known_ids(store, kind);
    let set = enabled_set_mut(store, kind);
    let before = set.len();
    if enabled {
        let changed = known.iter().any(|id| !set.contains(id));
        *set = known.into_iter().collect();
        changed
    } else {
        set.clear();
        before != 0
    }
}

pub fn toggle(store: &mut DataStore, kind: FilterKind, id: &str) -> bool {
    let enabled = match kind {
        FilterKind::Mode => store.is_mode_enabled(id),
        FilterKind::Benchmark => store.is_benchmark_enabled(id),
    };
    apply(store, &FilterEvent::new(kind, id, !enabled))
}

pub fn apply(store: &mut DataStore, event: &FilterEvent) -> bool {
    if !is_known(store, event.kind, &event.id) {
        debug!(kind = %event.kind, id = %event.id, "ignoring filter event for unknown id");
        return false;
    }
    let set = enabled_set_mut(store, event.kind);
    if event.enabled {
        set.insert(event.id.clone())
    } else {
        set.remove(&event.id)
    }
}

/// Restricts `kind` to exactly `ids`; unknown ids are dropped.
pub fn retain_only(store: &mut DataStore, kind: FilterKind, ids: &[String]) -> bool {
    let mut changed = set_all(store, kind, false);
    for id in ids {
        changed |= apply(store, &FilterEvent::new(kind, id.clone(), true));
    }
    changed
}

fn known_ids(store: &DataStore, kind: FilterKind) -> Vec<String> {
    match kind {
        FilterKind::Mode => store.current_run().modes(),
        FilterKind::Benchmark => store.current_run().benchmarks(),
    }
}

fn is_known(store: &DataStore, kind: FilterKind, id: &str) -> bool {
    match kind {
        FilterKind::Mode => store.current_run().has_mode(id),
        FilterKind::Benchmark => store.current_run().has_benchmark(id),
    }
}

fn enabled_set_mut(store: &mut DataStore, kind: FilterKind) -> &mut AHashSet<String> {
    match kind {
        FilterKind::Mode => &mut store.enabled_modes,
        FilterKind::Benchmark => &mut store.enabled_benchmarks,
    }
}
