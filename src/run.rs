use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use ahash::AHashSet;
use serde::de::{self, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys the run mode is read from, in order of preference.
const MODE_KEYS: [&str; 3] = ["runMethod", "mode", "runmode"];

/// One (benchmark, mode) observation as written by the nightly profiler.
///
/// The mode comes from the first of `runMethod`, `mode`, `runmode` present;
/// the others stay in `metrics` untouched.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct MeasurementRecord {
    pub benchmark: String,
    #[serde(rename = "runMethod")]
    pub mode: String,
    #[serde(flatten)]
    pub metrics: Map<String, Value>,
}

impl<'de> Deserialize<'de> for MeasurementRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut metrics = Map::<String, Value>::deserialize(deserializer)?;
        let benchmark = take_string::<D::Error>(&mut metrics, "benchmark")?
            .ok_or_else(|| D::Error::missing_field("benchmark"))?;
        let mode_key = MODE_KEYS
            .into_iter()
            .find(|key| metrics.contains_key(*key))
            .ok_or_else(|| D::Error::missing_field("runMethod"))?;
        let mode = take_string::<D::Error>(&mut metrics, mode_key)?.unwrap_or_default();
        Ok(Self {
            benchmark,
            mode,
            metrics,
        })
    }
}

fn take_string<E: de::Error>(map: &mut Map<String, Value>, key: &str) -> Result<Option<String>, E> {
    match map.remove(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(E::custom(format!("field `{key}` must be a string, got {other}"))),
    }
}

impl MeasurementRecord {
    pub fn new<B: Into<String>, M: Into<String>>(benchmark: B, mode: M) -> Self {
        Self {
            benchmark: benchmark.into(),
            mode: mode.into(),
            metrics: Map::new(),
        }
    }

    pub fn with_metric<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }

    pub fn key(&self) -> (&str, &str) {
        (&self.benchmark, &self.mode)
    }

    /// Mean wall time in seconds, read from the hyperfine export when present.
    pub fn mean_seconds(&self) -> Option<f64> {
        self.metric("mean")
    }

    pub fn stddev_seconds(&self) -> Option<f64> {
        self.metric("stddev")
    }

    fn metric(&self, name: &str) -> Option<f64> {
        self.metrics
            .get("hyperfine")
            .and_then(|h| h.get("results"))
            .and_then(|r| r.get(0))
            .and_then(|r| r.get(name))
            .and_then(Value::as_f64)
            .or_else(|| self.metrics.get(name).and_then(Value::as_f64))
    }
}

/// Ordered result set of one suite execution. Identified only by where it was loaded from.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Run {
    records: Vec<MeasurementRecord>,
}

impl Run {
    pub fn new(records: Vec<MeasurementRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn benchmarks(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.benchmark.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn modes(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.mode.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn benchmark_set(&self) -> AHashSet<&str> {
        self.records.iter().map(|r| r.benchmark.as_str()).collect()
    }

    pub fn has_benchmark(&self, benchmark: &str) -> bool {
        self.records.iter().any(|r| r.benchmark == benchmark)
    }

    pub fn has_mode(&self, mode: &str) -> bool {
        self.records.iter().any(|r| r.mode == mode)
    }
}

/// Catalog entry for a previously recorded nightly.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RunSummary {
    pub fn new<T: Into<String>>(url: T) -> Self {
        Self {
            url: url.into(),
            timestamp: None,
            branch: None,
            label: None,
            extra: Map::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn display_name(&self) -> String {
        match (&self.label, &self.branch) {
            (Some(label), _) => label.clone(),
            (None, Some(branch)) => format!("{branch} @ {}", self.url),
            (None, None) => self.url.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartMode {
    #[default]
    Absolute,
    Speedup,
}

impl ChartMode {
    /// Maps a radio-input value. Only `"speedup"` selects speedup.
    pub fn from_input(value: &str) -> Self {
        if value == "speedup" {
            ChartMode::Speedup
        } else {
            ChartMode::Absolute
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartMode::Absolute => "absolute",
            ChartMode::Speedup => "speedup",
        }
    }
}

impl FromStr for ChartMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "absolute" => Ok(ChartMode::Absolute),
            "speedup" => Ok(ChartMode::Speedup),
            other => Err(format!("unknown chart mode {other}")),
        }
    }
}

impl fmt::Display for ChartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
