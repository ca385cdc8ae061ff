use nightly_dashboard::{BaselineSelector, DashboardError, RunSummary, select_default_index};

fn catalog(urls: &[&str]) -> Vec<RunSummary> {
    urls.iter().map(|u| RunSummary::new(*u)).collect()
}

#[test]
fn test_empty_catalog_is_selection_error() {
    let err = select_default_index(&[]).unwrap_err();
    assert!(matches!(err, DashboardError::Selection(_)));
}

#[test]
fn test_single_entry_selects_zero() {
    assert_eq!(select_default_index(&catalog(&["a"])).unwrap(), 0);
    let only_current = BaselineSelector::new(Some("a"));
    assert_eq!(only_current.select_default_index(&catalog(&["a"])).unwrap(), 0);
}

#[test]
fn test_latest_position_wins_without_timestamps() {
    assert_eq!(select_default_index(&catalog(&["a", "b", "c"])).unwrap(), 2);
}

#[test]
fn test_current_run_is_skipped() {
    let selector = BaselineSelector::new(Some("https://nightly/c/"));
    let runs = catalog(&["https://nightly/a", "https://nightly/b", "https://nightly/c"]);
    assert_eq!(selector.select_default_index(&runs).unwrap(), 1);
}

#[test]
fn test_timestamp_beats_position() {
    let runs = vec![
        RunSummary::new("new").with_timestamp(300),
        RunSummary::new("old").with_timestamp(100),
        RunSummary::new("mid").with_timestamp(200),
    ];
    assert_eq!(select_default_index(&runs).unwrap(), 0);
}

#[test]
fn test_timestamp_tie_goes_to_later_entry() {
    let runs = vec![
        RunSummary::new("x").with_timestamp(100),
        RunSummary::new("y").with_timestamp(100),
    ];
    assert_eq!(select_default_index(&runs).unwrap(), 1);
}

#[test]
fn test_index_always_in_bounds() {
    for len in 1..12 {
        let urls: Vec<String> = (0..len).map(|i| format!("run{i}")).collect();
        let runs: Vec<RunSummary> = urls
            .iter()
            .enumerate()
            .map(|(i, u)| {
                let summary = RunSummary::new(u.as_str());
                if i % 3 == 0 {
                    summary.with_timestamp((len - i) as i64)
                } else {
                    summary
                }
            })
            .collect();
        for current in [None, Some("run0"), Some("run5"), Some("elsewhere")] {
            let idx = BaselineSelector::new(current)
                .select_default_index(&runs)
                .unwrap();
            assert!(idx < runs.len());
        }
    }
}

#[test]
fn test_catalog_entries_deserialize_with_extra_fields() {
    let runs: Vec<RunSummary> = serde_json::from_str(
        r#"[{"url": "https://nightly/1", "timestamp": 17, "branch": "main", "commit": "abc"}]"#,
    )
    .unwrap();
    assert_eq!(runs[0].timestamp, Some(17));
    assert_eq!(runs[0].branch.as_deref(), Some("main"));
    assert_eq!(runs[0].extra["commit"], "abc");
}
