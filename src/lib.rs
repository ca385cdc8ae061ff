//! Nightly benchmark dashboard.
//!
//! Loads the current nightly's `data/profile.json`, picks a previous run to
//! compare against, and keeps a chart plus comparison tables in sync with
//! mode/benchmark filters. Auxiliary pages show IR dumps and CFGs for one
//! (benchmark, mode) pair and LaTeX result tables.
//!
//! ```rust,no_run
//! use nightly_dashboard::{Dashboard, LocationFetcher, RunLoader, TextRenderer};
//! use std::time::Duration;
//!
//! let fetcher = LocationFetcher::new(Duration::from_secs(30))?;
//! let loader = RunLoader::new(fetcher, "https://nightly.example.org/previous-runs.json");
//! let mut dashboard = Dashboard::new(loader, TextRenderer::new(std::io::stdout()));
//! dashboard.load_index("https://nightly.example.org/latest")?;
//! # Ok::<(), nightly_dashboard::DashboardError>(())
//! ```

pub mod baseline;
pub mod bench_utils;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod fetch;
pub mod filter;
pub mod html;
pub mod loader;
pub mod pages;
pub mod render;
pub mod run;
pub mod server;
pub mod store;
pub mod view;

pub use crate::baseline::{BaselineSelector, select_default_index};
pub use crate::config::DashboardConfig;
pub use crate::dashboard::{Dashboard, IndexLoad, PageState};
pub use crate::errors::{BenchmarkMismatchWarning, DashboardError, Result};
pub use crate::fetch::{Fetcher, LocationFetcher, MemoryFetcher};
pub use crate::filter::{FilterEvent, FilterKind};
pub use crate::html::HtmlRenderer;
pub use crate::loader::RunLoader;
pub use crate::pages::{QueryParams, load_ir_page, load_table_page};
pub use crate::render::{NullRenderer, PageRenderer, TextRenderer, ViewRenderer};
pub use crate::run::{ChartMode, MeasurementRecord, Run, RunSummary};
pub use crate::store::{BaselineTicket, DataStore};
pub use crate::view::{ComparisonRow, ModeSummary, View, compute_view};
