use nightly_dashboard::{
    BenchmarkMismatchWarning, ChartMode, Dashboard, FilterEvent, FilterKind, MemoryFetcher,
    PageState, RunLoader, View, ViewRenderer,
};

#[derive(Debug, Default)]
struct RecordingRenderer {
    log: Vec<String>,
    charts: Vec<View>,
    shown: Vec<String>,
}

impl ViewRenderer for RecordingRenderer {
    fn draw_chart(&mut self, view: &View) {
        self.log.push("chart".into());
        self.charts.push(view.clone());
    }

    fn draw_summary(&mut self, _view: &View) {
        self.log.push("summary".into());
    }

    fn clear_warnings(&mut self) {
        self.log.push("clear".into());
        self.shown.clear();
    }

    fn show_warning(&mut self, warning: &BenchmarkMismatchWarning) {
        self.log.push(format!("warn:{}", warning.benchmark));
        self.shown.push(warning.benchmark.clone());
    }
}

fn profile(pairs: &[(&str, &str, f64)]) -> String {
    let items: Vec<String> = pairs
        .iter()
        .map(|(b, m, mean)| {
            format!(
                r#"{{"benchmark": "{b}", "runMethod": "{m}", "hyperfine": {{"results": [{{"mean": {mean}}}]}}}}"#
            )
        })
        .collect();
    format!("[{}]", items.join(","))
}

fn fetcher() -> MemoryFetcher {
    MemoryFetcher::new()
        .with(
            "nightly/current/data/profile.json",
            profile(&[("A", "O0", 2.0), ("A", "O3", 1.0), ("B", "O3", 1.0)]),
        )
        .with(
            "nightly/old/data/profile.json",
            profile(&[("A", "O3", 2.0), ("B", "O3", 1.0), ("C", "O3", 1.0)]),
        )
        .with(
            "nightly/older/data/profile.json",
            profile(&[("A", "O3", 2.0), ("D", "O3", 1.0), ("E", "O3", 1.0)]),
        )
        .with(
            "nightly/same/data/profile.json",
            profile(&[("A", "O3", 1.5), ("B", "O3", 1.0)]),
        )
        .with(
            "catalog.json",
            r#"[{"url": "nightly/older", "timestamp": 1}, {"url": "nightly/old", "timestamp": 2}, {"url": "nightly/current", "timestamp": 3}]"#,
        )
}

fn dashboard(fetcher: &MemoryFetcher) -> Dashboard<&MemoryFetcher, RecordingRenderer> {
    Dashboard::new(RunLoader::new(fetcher, "catalog.json"), RecordingRenderer::default())
}

#[test]
fn test_load_index_selects_latest_other_run() {
    let fetcher = fetcher();
    let mut dash = dashboard(&fetcher);
    assert_eq!(dash.state(), PageState::Uninitialized);
    let load = dash.load_index("nightly/current").unwrap();
    assert_eq!(load.selected, Some(1));
    assert_eq!(load.previous_runs.len(), 3);
    assert_eq!(dash.state(), PageState::Ready);
    assert_eq!(dash.store().enabled_modes().len(), 2);
    assert_eq!(dash.store().enabled_benchmarks().len(), 2);
    assert_eq!(load.warnings, vec![BenchmarkMismatchWarning::new("C")]);
}

#[test]
fn test_load_index_fetch_order() {
    let fetcher = fetcher();
    let mut dash = dashboard(&fetcher);
    dash.load_index("nightly/current").unwrap();
    assert_eq!(
        fetcher.requests(),
        vec![
            "nightly/current/data/profile.json",
            "catalog.json",
            "nightly/old/data/profile.json",
        ]
    );
}

#[test]
fn test_empty_catalog_renders_without_baseline() {
    let fetcher = fetcher().with("catalog.json", "[]");
    let mut dash = dashboard(&fetcher);
    let load = dash.load_index("nightly/current").unwrap();
    assert_eq!(load.selected, None);
    assert!(dash.store().baseline_run().is_none());
    assert!(!dash.renderer().charts.last().unwrap().has_baseline);
}

#[test]
fn test_missing_current_run_is_fetch_error() {
    let fetcher = MemoryFetcher::new();
    let mut dash = dashboard(&fetcher);
    let err = dash.load_index("nowhere").unwrap_err();
    assert!(err.is_fetch_failure());
    assert_eq!(dash.state(), PageState::Uninitialized);
}

#[test]
fn test_malformed_profile_is_parse_error() {
    let fetcher = MemoryFetcher::new().with("bad/data/profile.json", "{not json");
    let mut dash = dashboard(&fetcher);
    let err = dash.load_current("bad").unwrap_err();
    assert!(matches!(err, nightly_dashboard::DashboardError::Parse(_)));
}

#[test]
fn test_load_baseline_replaces_warnings() {
    let fetcher = fetcher();
    let mut dash = dashboard(&fetcher);
    dash.load_current("nightly/current").unwrap();

    let first = dash.load_baseline("nightly/older").unwrap();
    let first: Vec<&str> = first.iter().map(|w| w.benchmark.as_str()).collect();
    assert_eq!(first, vec!["D", "E"]);

    let second = dash.load_baseline("nightly/old").unwrap();
    assert_eq!(second, vec![BenchmarkMismatchWarning::new("C")]);
    assert_eq!(dash.store().warnings(), second.as_slice());
    assert_eq!(dash.renderer().shown, vec!["C".to_string()]);

    assert!(dash.load_baseline("nightly/same").unwrap().is_empty());
    assert!(dash.store().warnings().is_empty());
    assert!(dash.renderer().shown.is_empty());
}

#[test]
fn test_load_baseline_clears_before_warning_then_refreshes() {
    let fetcher = fetcher();
    let mut dash = dashboard(&fetcher);
    dash.load_current("nightly/current").unwrap();
    dash.renderer_mut().log.clear();
    dash.load_baseline("nightly/old").unwrap();
    assert_eq!(dash.renderer().log, vec!["clear", "warn:C", "chart", "summary"]);
}

#[test]
fn test_failed_baseline_keeps_previous_state() {
    let fetcher = fetcher();
    let mut dash = dashboard(&fetcher);
    dash.load_current("nightly/current").unwrap();
    dash.load_baseline("nightly/old").unwrap();
    let draws = dash.renderer().charts.len();

    assert!(dash.load_baseline("nightly/missing").is_err());
    assert_eq!(dash.state(), PageState::Ready);
    assert_eq!(dash.store().warnings(), &[BenchmarkMismatchWarning::new("C")]);
    assert!(dash.store().baseline_run().unwrap().has_benchmark("C"));
    assert_eq!(dash.renderer().charts.len(), draws);
}

#[test]
fn test_stale_baseline_is_discarded() {
    let fetcher = fetcher();
    let mut dash = dashboard(&fetcher);
    dash.load_current("nightly/current").unwrap();
    let loader = dash.loader().clone();

    let first = dash.begin_baseline_load();
    let second = dash.begin_baseline_load();
    let newer = loader.fetch_run("nightly/same").unwrap();
    let older = loader.fetch_run("nightly/older").unwrap();

    assert!(dash.finish_baseline_load(second, newer).is_some());
    assert!(dash.finish_baseline_load(first, older).is_none());
    assert!(dash.store().warnings().is_empty());
    assert!(!dash.store().baseline_run().unwrap().has_benchmark("D"));
}

#[test]
fn test_every_filter_change_redraws() {
    let fetcher = fetcher();
    let mut dash = dashboard(&fetcher);
    dash.load_index("nightly/current").unwrap();
    let before = dash.renderer().charts.len();

    dash.toggle(FilterKind::Mode, "O0");
    dash.set_all(FilterKind::Benchmark, false);
    dash.apply(&FilterEvent::new(FilterKind::Benchmark, "A", true));
    dash.set_chart_mode(ChartMode::Speedup);
    assert_eq!(dash.renderer().charts.len(), before + 4);

    let last = dash.renderer().charts.last().unwrap();
    assert_eq!(last.chart_mode, ChartMode::Speedup);
    assert_eq!(last.charted_keys(), vec![("A".to_string(), "O3".to_string())]);
    assert_eq!(last.rows[0].speedup, Some(2.0));
}

#[test]
fn test_refresh_does_not_mutate_store() {
    let fetcher = fetcher();
    let mut dash = dashboard(&fetcher);
    dash.load_index("nightly/current").unwrap();
    let modes = dash.store().enabled_modes().clone();
    dash.refresh();
    assert_eq!(dash.store().enabled_modes(), &modes);
}
