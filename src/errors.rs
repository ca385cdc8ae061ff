use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("fetch error: {0}")]
    Fetch(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("missing query parameter: {0}")]
    MissingParam(String),
    #[error("selection error: {0}")]
    Selection(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub fn fetch<T: Into<String>>(msg: T) -> Self {
        DashboardError::Fetch(msg.into())
    }

    pub fn parse<T: Into<String>>(msg: T) -> Self {
        DashboardError::Parse(msg.into())
    }

    pub fn missing_param<T: Into<String>>(name: T) -> Self {
        DashboardError::MissingParam(name.into())
    }

    pub fn selection<T: Into<String>>(msg: T) -> Self {
        DashboardError::Selection(msg.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        DashboardError::InvalidInput(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        DashboardError::Config(msg.into())
    }

    /// True for failures that come from retrieving or decoding an artifact.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, DashboardError::Fetch(_) | DashboardError::Parse(_))
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

/// Non-fatal divergence between the baseline and the current run.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BenchmarkMismatchWarning {
    pub benchmark: String,
}

impl BenchmarkMismatchWarning {
    pub fn new<T: Into<String>>(benchmark: T) -> Self {
        Self {
            benchmark: benchmark.into(),
        }
    }
}

impl fmt::Display for BenchmarkMismatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Baseline run had benchmark {} that the current run doesn't",
            self.benchmark
        )
    }
}
