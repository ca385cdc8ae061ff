use ahash::AHashSet;

use crate::errors::BenchmarkMismatchWarning;
use crate::run::{ChartMode, Run};

/// Identifies a pending baseline load. Only the newest ticket may install its run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaselineTicket(u64);

impl BaselineTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Dashboard state. Owned by one [`crate::dashboard::Dashboard`] and handed to
/// the filter and view functions explicitly.
#[derive(Clone, Debug, Default)]
pub struct DataStore {
    current_run: Run,
    baseline_run: Option<Run>,
    pub(crate) enabled_modes: AHashSet<String>,
    pub(crate) enabled_benchmarks: AHashSet<String>,
    chart_mode: ChartMode,
    warnings: Vec<BenchmarkMismatchWarning>,
    baseline_generation: u64,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chart_mode(chart_mode: ChartMode) -> Self {
        Self {
            chart_mode,
            ..Self::default()
        }
    }

    /// Installs a freshly loaded current run with every mode and benchmark enabled.
    pub fn set_current_run(&mut self, run: Run) {
        self.enabled_modes = run.modes().into_iter().collect();
        self.enabled_benchmarks = run.benchmarks().into_iter().collect();
        self.current_run = run;
    }

    pub fn current_run(&self) -> &Run {
        &self.current_run
    }

    pub fn baseline_run(&self) -> Option<&Run> {
        self.baseline_run.as_ref()
    }

    pub(crate) fn set_baseline_run(&mut self, run: Run) {
        self.baseline_run = Some(run);
    }

    pub fn enabled_modes(&self) -> &AHashSet<String> {
        &self.enabled_modes
    }

    pub fn enabled_benchmarks(&self) -> &AHashSet<String> {
        &self.enabled_benchmarks
    }

    pub fn is_mode_enabled(&self, mode: &str) -> bool {
        self.enabled_modes.contains(mode)
    }

    pub fn is_benchmark_enabled(&self, benchmark: &str) -> bool {
        self.enabled_benchmarks.contains(benchmark)
    }

    pub fn chart_mode(&self) -> ChartMode {
        self.chart_mode
    }

    pub fn set_chart_mode(&mut self, mode: ChartMode) {
        self.chart_mode = mode;
    }

    pub fn warnings(&self) -> &[BenchmarkMismatchWarning] {
        &self.warnings
    }

    pub(crate) fn clear_warnings(&mut self) {
        self.warnings.clear();
    }

    pub(crate) fn push_warning(&mut self, warning: BenchmarkMismatchWarning) {
        self.warnings.push(warning);
    }

    pub(crate) fn next_baseline_ticket(&mut self) -> BaselineTicket {
        self.baseline_generation += 1;
        BaselineTicket(self.baseline_generation)
    }

    pub(crate) fn is_latest_ticket(&self, ticket: BaselineTicket) -> bool {
        ticket.0 == self.baseline_generation
    }
}
