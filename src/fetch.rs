//! Artifact retrieval. Locations are either `http(s)://` URLs or filesystem paths.

use std::fs;
use std::path::Path;
use std::time::Duration;

use ahash::AHashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::errors::{DashboardError, Result};

pub trait Fetcher {
    fn fetch_text(&self, location: &str) -> Result<String>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch_text(&self, location: &str) -> Result<String> {
        (**self).fetch_text(location)
    }
}

/// Fetches over HTTP for URLs and from disk for everything else.
#[derive(Clone, Debug)]
pub struct LocationFetcher {
    client: reqwest::blocking::Client,
}

impl LocationFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("nightly-dashboard/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| DashboardError::config(format!("HTTP client initialization failed: {e}")))?;
        Ok(Self { client })
    }

    fn fetch_http(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| DashboardError::fetch(format!("{url}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DashboardError::fetch(format!("{url}: HTTP {status}")));
        }
        resp.text()
            .map_err(|e| DashboardError::fetch(format!("{url}: {e}")))
    }

    fn fetch_file(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path)
            .map_err(|e| DashboardError::fetch(format!("{}: {e}", path.display())))
    }
}

impl Fetcher for LocationFetcher {
    fn fetch_text(&self, location: &str) -> Result<String> {
        debug!(location, "fetching artifact");
        if is_url(location) {
            self.fetch_http(location)
        } else {
            let path = location.strip_prefix("file://").unwrap_or(location);
            self.fetch_file(Path::new(path))
        }
    }
}

pub fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Joins a location and a relative artifact path with exactly one `/`.
pub fn join_location(base: &str, rel: &str) -> String {
    let base = base.trim_end_matches('/');
    let rel = rel.trim_start_matches("./").trim_start_matches('/');
    if base.is_empty() {
        rel.to_string()
    } else {
        format!("{base}/{rel}")
    }
}

/// In-memory artifact map. Remembers every location asked for.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    bodies: AHashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<L: Into<String>, B: Into<String>>(&mut self, location: L, body: B) {
        self.bodies.insert(location.into(), body.into());
    }

    pub fn with<L: Into<String>, B: Into<String>>(mut self, location: L, body: B) -> Self {
        self.insert(location, body);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch_text(&self, location: &str) -> Result<String> {
        self.requests.lock().push(location.to_string());
        self.bodies
            .get(location)
            .cloned()
            .ok_or_else(|| DashboardError::fetch(format!("{location}: not found")))
    }
}
