use std::fs;
use std::time::Duration;

use nightly_dashboard::{DashboardError, Fetcher, LocationFetcher, RunLoader};
use tempfile::tempdir;

const PROFILE: &str = r#"[
  {"runMethod": "egglog_opt_bril_llvm_opt", "benchmark": "raytrace",
   "hyperfine": {"results": [{"mean": 0.25, "stddev": 0.01, "min": 0.24, "max": 0.27}]}},
  {"runMethod": "rvsdg_roundtrip", "benchmark": "raytrace",
   "hyperfine": {"results": [{"mean": 0.5, "stddev": 0.02}]}}
]"#;

fn fetcher() -> LocationFetcher {
    LocationFetcher::new(Duration::from_secs(5)).unwrap()
}

#[test]
fn test_fetch_run_from_directory() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("data/profile.json"), PROFILE).unwrap();

    let loader = RunLoader::new(fetcher(), "unused");
    let location = format!("{}/", dir.path().display());
    let run = loader.fetch_run(&location).unwrap();
    assert_eq!(run.len(), 2);
    assert_eq!(run.records()[0].mode, "egglog_opt_bril_llvm_opt");
    assert_eq!(run.records()[0].mean_seconds(), Some(0.25));
    assert_eq!(run.records()[1].stddev_seconds(), Some(0.02));
    assert!(run.records()[0].metrics["hyperfine"]["results"][0].get("min").is_some());
}

#[test]
fn test_fetch_run_missing_file_is_fetch_error() {
    let dir = tempdir().unwrap();
    let loader = RunLoader::new(fetcher(), "unused");
    let err = loader.fetch_run(dir.path().to_str().unwrap()).unwrap_err();
    assert!(matches!(err, DashboardError::Fetch(_)));
}

#[test]
fn test_fetch_run_bad_json_is_parse_error() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("data/profile.json"), "[{\"benchmark\": 1}]").unwrap();
    let loader = RunLoader::new(fetcher(), "unused");
    let err = loader.fetch_run(dir.path().to_str().unwrap()).unwrap_err();
    assert!(matches!(err, DashboardError::Parse(_)));
}

#[test]
fn test_previous_runs_keep_source_order() {
    let dir = tempdir().unwrap();
    let catalog = dir.path().join("runs.json");
    fs::write(
        &catalog,
        r#"[{"url": "b", "timestamp": 2}, {"url": "a", "timestamp": 1}, {"url": "c"}]"#,
    )
    .unwrap();
    let loader = RunLoader::new(fetcher(), catalog.to_str().unwrap());
    let urls: Vec<String> = loader
        .fetch_previous_runs()
        .unwrap()
        .into_iter()
        .map(|r| r.url)
        .collect();
    assert_eq!(urls, vec!["b", "a", "c"]);
}

#[test]
fn test_file_scheme_is_read_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.tex");
    fs::write(&path, "tex").unwrap();
    let body = fetcher()
        .fetch_text(&format!("file://{}", path.display()))
        .unwrap();
    assert_eq!(body, "tex");
}

#[test]
fn test_unreachable_url_is_fetch_error() {
    let err = fetcher()
        .fetch_text("http://127.0.0.1:9/data/profile.json")
        .unwrap_err();
    assert!(matches!(err, DashboardError::Fetch(_)));
}
