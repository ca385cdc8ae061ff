use std::collections::BTreeSet;

use ahash::{AHashMap, AHashSet};
use serde::Serialize;

use crate::errors::BenchmarkMismatchWarning;
use crate::run::{ChartMode, MeasurementRecord, Run};
use crate::store::DataStore;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub benchmark: String,
    pub mode: String,
    pub current_mean: Option<f64>,
    pub current_stddev: Option<f64>,
    pub baseline_mean: Option<f64>,
    pub speedup: Option<f64>,
    pub in_current: bool,
    pub in_baseline: bool,
}

impl ComparisonRow {
    fn pair(current: Option<&MeasurementRecord>, baseline: Option<&MeasurementRecord>) -> Self {
        let (benchmark, mode) = current
            .or(baseline)
            .map(|r| (r.benchmark.clone(), r.mode.clone()))
            .unwrap_or_default();
        let current_mean = current.and_then(MeasurementRecord::mean_seconds);
        let baseline_mean = baseline.and_then(MeasurementRecord::mean_seconds);
        Self {
            benchmark,
            mode,
            current_mean,
            current_stddev: current.and_then(MeasurementRecord::stddev_seconds),
            baseline_mean,
            speedup: speedup(baseline_mean, current_mean),
            in_current: current.is_some(),
            in_baseline: baseline.is_some(),
        }
    }

    pub fn key(&self) -> (&str, &str) {
        (&self.benchmark, &self.mode)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModeSummary {
    pub mode: String,
    pub rows: usize,
    pub compared: usize,
    pub geomean_speedup: Option<f64>,
}

/// What the chart and its tables show for the current filters.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct View {
    pub chart_mode: ChartMode,
    pub has_baseline: bool,
    pub rows: Vec<ComparisonRow>,
    pub summary: Vec<ModeSummary>,
}

impl View {
    pub fn charted_keys(&self) -> Vec<(String, String)> {
        self.rows
            .iter()
            .map(|r| (r.benchmark.clone(), r.mode.clone()))
            .collect()
    }

    /// Plotted value per row: mean seconds, or baseline/current speedup.
    pub fn chart_values(&self) -> Vec<Option<f64>> {
        self.rows
            .iter()
            .map(|row| match self.chart_mode {
                ChartMode::Absolute => row.current_mean,
                ChartMode::Speedup => row.speedup,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn compute_view(store: &DataStore) -> View {
    let passes = |r: &MeasurementRecord| {
        store.is_benchmark_enabled(&r.benchmark) && store.is_mode_enabled(&r.mode)
    };

    let baseline_index: AHashMap<(&str, &str), &MeasurementRecord> = store
        .baseline_run()
        .map(|run| run.records().iter().map(|r| (r.key(), r)).collect())
        .unwrap_or_default();

    let mut seen: AHashSet<(&str, &str)> = AHashSet::new();
    let mut rows = Vec::new();
    for record in store.current_run().records().iter().filter(|&r| passes(r)) {
        if !seen.insert(record.key()) {
            continue;
        }
        rows.push(ComparisonRow::pair(
            Some(record),
            baseline_index.get(&record.key()).copied(),
        ));
    }
    if let Some(baseline) = store.baseline_run() {
        for record in baseline.records().iter().filter(|&r| passes(r)) {
            if seen.insert(record.key()) {
                rows.push(ComparisonRow::pair(None, Some(record)));
            }
        }
    }

    let summary = summarize(&rows);
    View {
        chart_mode: store.chart_mode(),
        has_baseline: store.baseline_run().is_some(),
        rows,
        summary,
    }
}

/// Benchmarks present in the baseline but absent from the current run, sorted.
pub fn benchmark_mismatches(baseline: &Run, current: &Run) -> Vec<BenchmarkMismatchWarning> {
    let current = current.benchmark_set();
    baseline
        .benchmark_set()
        .into_iter()
        .filter(|b| !current.contains(b))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(BenchmarkMismatchWarning::new)
        .collect()
}

fn speedup(baseline: Option<f64>, current: Option<f64>) -> Option<f64> {
    match (baseline, current) {
        (Some(b), Some(c)) if b > 0.0 && c > 0.0 => Some(b / c),
        _ => None,
    }
}

fn summarize(rows: &[ComparisonRow]) -> Vec<ModeSummary> {
    let modes: BTreeSet<&str> = rows.iter().map(|r| r.mode.as_str()).collect();
    modes
        .into_iter()
        .map(|mode| {
            let in_mode: Vec<&ComparisonRow> = rows.iter().filter(|r| r.mode == mode).collect();
            let speedups: Vec<f64> = in_mode.iter().filter_map(|r| r.speedup).collect();
            let geomean_speedup = if speedups.is_empty() {
                None
            } else {
                let log_sum: f64 = speedups.iter().map(|s| s.ln()).sum();
                Some((log_sum / speedups.len() as f64).exp())
            };
            ModeSummary {
                mode: mode.to_string(),
                rows: in_mode.len(),
                compared: speedups.len(),
                geomean_speedup,
            }
        })
        .collect()
}
