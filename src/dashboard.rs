//! Index page lifecycle: load the current run, pick a baseline, keep the
//! chart in sync with filter and baseline changes.

use tracing::{info, warn};

use crate::baseline::BaselineSelector;
use crate::errors::{BenchmarkMismatchWarning, Result};
use crate::fetch::Fetcher;
use crate::filter::{self, FilterEvent, FilterKind};
use crate::loader::RunLoader;
use crate::render::ViewRenderer;
use crate::run::{ChartMode, Run, RunSummary};
use crate::store::{BaselineTicket, DataStore};
use crate::view::{View, benchmark_mismatches, compute_view};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageState {
    Uninitialized,
    Loading,
    Ready,
    LoadingBaseline,
}

/// Result of the initial page load, used to populate the baseline dropdown.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexLoad {
    pub previous_runs: Vec<RunSummary>,
    pub selected: Option<usize>,
    pub warnings: Vec<BenchmarkMismatchWarning>,
}

pub struct Dashboard<F, R> {
    loader: RunLoader<F>,
    renderer: R,
    store: DataStore,
    state: PageState,
    current_location: Option<String>,
}

impl<F: Fetcher, R: ViewRenderer> Dashboard<F, R> {
    pub fn new(loader: RunLoader<F>, renderer: R) -> Self {
        Self::with_store(loader, renderer, DataStore::new())
    }

    pub fn with_store(loader: RunLoader<F>, renderer: R, store: DataStore) -> Self {
        Self {
            loader,
            renderer,
            store,
            state: PageState::Uninitialized,
            current_location: None,
        }
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn loader(&self) -> &RunLoader<F> {
        &self.loader
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    pub fn current_location(&self) -> Option<&str> {
        self.current_location.as_deref()
    }

    /// Loads `current_location`, enables everything, then compares against the
    /// default baseline from the catalog.
    pub fn load_index(&mut self, current_location: &str) -> Result<IndexLoad> {
        self.load_current(current_location)?;

        let previous_runs = self.loader.fetch_previous_runs()?;
        if previous_runs.is_empty() {
            warn!("run catalog is empty, rendering without a baseline");
            self.refresh();
            return Ok(IndexLoad {
                previous_runs,
                selected: None,
                warnings: Vec::new(),
            });
        }
        let selected = BaselineSelector::new(Some(current_location))
            .select_default_index(&previous_runs)?;
        let url = previous_runs[selected].url.clone();
        let warnings = self.load_baseline(&url)?;
        Ok(IndexLoad {
            previous_runs,
            selected: Some(selected),
            warnings,
        })
    }

    /// Loads the current run only. Everything is enabled afterwards.
    pub fn load_current(&mut self, current_location: &str) -> Result<()> {
        self.state = PageState::Loading;
        let run = match self.loader.fetch_run(current_location) {
            Ok(run) => run,
            Err(err) => {
                self.state = PageState::Uninitialized;
                return Err(err);
            }
        };
        self.store.set_current_run(run);
        self.current_location = Some(current_location.to_string());
        self.state = PageState::Ready;
        self.refresh();
        Ok(())
    }

    pub fn view(&self) -> View {
        compute_view(&self.store)
    }

    /// Recomputes the visible rows and redraws chart and summary table.
    pub fn refresh(&mut self) {
        let view = compute_view(&self.store);
        self.renderer.draw_chart(&view);
        self.renderer.draw_summary(&view);
    }

    pub fn set_all(&mut self, kind: FilterKind, enabled: bool) {
        filter::set_all(&mut self.store, kind, enabled);
        self.refresh();
    }

    pub fn toggle(&mut self, kind: FilterKind, id: &str) {
        filter::toggle(&mut self.store, kind, id);
        self.refresh();
    }

    pub fn apply(&mut self, event: &FilterEvent) {
        filter::apply(&mut self.store, event);
        self.refresh();
    }

    pub fn retain_only(&mut self, kind: FilterKind, ids: &[String]) {
        filter::retain_only(&mut self.store, kind, ids);
        self.refresh();
    }

    pub fn set_chart_mode(&mut self, mode: ChartMode) {
        self.store.set_chart_mode(mode);
        self.refresh();
    }

    /// Fetches a new baseline and installs it.
    ///
    /// On a fetch failure the store and the rendered output are left as they were.
    pub fn load_baseline(&mut self, location: &str) -> Result<Vec<BenchmarkMismatchWarning>> {
        let ticket = self.begin_baseline_load();
        let run = match self.loader.fetch_run(location) {
            Ok(run) => run,
            Err(err) => {
                self.abandon_baseline_load(ticket);
                return Err(err);
            }
        };
        info!(location, "baseline loaded");
        Ok(self.finish_baseline_load(ticket, run).unwrap_or_default())
    }

    /// Starts a baseline load. Any ticket handed out earlier becomes stale.
    pub fn begin_baseline_load(&mut self) -> BaselineTicket {
        self.state = PageState::LoadingBaseline;
        self.store.next_baseline_ticket()
    }

    /// Marks a failed load as finished. The store is not touched.
    pub fn abandon_baseline_load(&mut self, ticket: BaselineTicket) {
        if self.store.is_latest_ticket(ticket) {
            self.state = PageState::Ready;
        }
    }

    /// Installs `run` as the baseline unless a newer load was started after `ticket`.
    ///
    /// Prior warnings are cleared before the new mismatch set is computed.
    pub fn finish_baseline_load(
        &mut self,
        ticket: BaselineTicket,
        run: Run,
    ) -> Option<Vec<BenchmarkMismatchWarning>> {
        if !self.store.is_latest_ticket(ticket) {
            info!(generation = ticket.generation(), "discarding stale baseline");
            return None;
        }
        self.store.clear_warnings();
        self.renderer.clear_warnings();

        let warnings = benchmark_mismatches(&run, self.store.current_run());
        for warning in &warnings {
            warn!(benchmark = %warning.benchmark, "{warning}");
            self.renderer.show_warning(warning);
            self.store.push_warning(warning.clone());
        }

        self.store.set_baseline_run(run);
        self.state = PageState::Ready;
        self.refresh();
        Some(warnings)
    }
}
