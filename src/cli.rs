//! Command-line surface of the `nightly` binary.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::info;

use crate::baseline::BaselineSelector;
use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;
use crate::errors::{DashboardError, Result};
use crate::fetch::LocationFetcher;
use crate::filter::FilterKind;
use crate::loader::RunLoader;
use crate::pages::{QueryParams, load_ir_page, load_table_page};
use crate::render::{NullRenderer, TextRenderer, ViewRenderer};
use crate::run::ChartMode;
use crate::server::{ServerState, serve};

#[derive(Parser, Debug)]
#[command(name = "nightly")]
#[command(author, version, about = "Compare nightly benchmark runs against a baseline")]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare the current run against a baseline and print chart and tables
    Compare(CompareArgs),
    /// List the run catalog and mark the default baseline
    Runs(SourceArgs),
    /// Show the IR dump and CFG listing for one benchmark and run mode
    Ir(IrArgs),
    /// Show a LaTeX results table and its PDF link
    Table(TableArgs),
    /// Serve the interactive dashboard over HTTP
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Location of the current run (directory or URL containing data/)
    #[arg(long)]
    pub current: Option<String>,

    /// Location of the run catalog
    #[arg(long)]
    pub catalog: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Compare against this run instead of the catalog default
    #[arg(long)]
    pub baseline: Option<String>,

    /// Only show these modes (repeatable)
    #[arg(long = "mode")]
    pub modes: Vec<String>,

    /// Only show these benchmarks (repeatable)
    #[arg(long = "benchmark")]
    pub benchmarks: Vec<String>,

    /// absolute or speedup
    #[arg(long)]
    pub chart_mode: Option<ChartMode>,

    /// Print the computed view as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IrArgs {
    #[arg(long)]
    pub root: Option<String>,
    #[arg(long)]
    pub benchmark: Option<String>,
    #[arg(long)]
    pub runmode: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    #[arg(long)]
    pub root: Option<String>,
    #[arg(long)]
    pub table: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Address to bind, e.g. 127.0.0.1:8080
    #[arg(long)]
    pub bind: Option<String>,
}

impl Cli {
    pub fn load_config(&self) -> Result<DashboardConfig> {
        DashboardConfig::load(self.config.as_deref())
    }
}

impl SourceArgs {
    fn apply(&self, config: &mut DashboardConfig) {
        if let Some(current) = &self.current {
            config.root = current.clone();
        }
        if let Some(catalog) = &self.catalog {
            config.catalog = Some(catalog.clone());
        }
    }
}

pub fn run(cli: &Cli, config: DashboardConfig) -> Result<()> {
    match &cli.command {
        Command::Compare(args) => compare(args, config),
        Command::Runs(args) => runs(args, config),
        Command::Ir(args) => ir(args, config),
        Command::Table(args) => table(args, config),
        Command::Serve(args) => serve_dashboard(args, config),
    }
}

/// Exit code for a failed command: 2 for usage problems, 1 otherwise.
pub fn exit_code(err: &DashboardError) -> i32 {
    match err {
        DashboardError::MissingParam(_)
        | DashboardError::InvalidInput(_)
        | DashboardError::Config(_)
        | DashboardError::Selection(_) => 2,
        _ => 1,
    }
}

fn loader_for(config: &DashboardConfig) -> Result<RunLoader<LocationFetcher>> {
    let fetcher = LocationFetcher::new(config.http_timeout())?;
    Ok(RunLoader::new(fetcher, config.catalog_location()))
}

fn compare(args: &CompareArgs, mut config: DashboardConfig) -> Result<()> {
    args.source.apply(&mut config);
    if let Some(mode) = args.chart_mode {
        config.chart_mode = mode;
    }
    let loader = loader_for(&config)?;

    // Filters are applied before anything is drawn, so the dashboard renders
    // into a sink and the final view is printed once.
    let mut dashboard = Dashboard::new(loader, NullRenderer);
    dashboard.set_chart_mode(config.chart_mode);
    let warnings = match &args.baseline {
        Some(baseline) => {
            dashboard.load_current(&config.root)?;
            dashboard.load_baseline(baseline)?
        }
        None => dashboard.load_index(&config.root)?.warnings,
    };
    if !args.modes.is_empty() {
        dashboard.retain_only(FilterKind::Mode, &args.modes);
    }
    if !args.benchmarks.is_empty() {
        dashboard.retain_only(FilterKind::Benchmark, &args.benchmarks);
    }

    let view = dashboard.view();
    if args.json {
        let body = json!({ "view": view, "warnings": warnings });
        let text = serde_json::to_string_pretty(&body)
            .map_err(|e| DashboardError::invalid_input(e.to_string()))?;
        writeln!(io::stdout(), "{text}")?;
        return Ok(());
    }

    let mut out = TextRenderer::new(io::stdout().lock());
    for warning in &warnings {
        out.show_warning(warning);
    }
    out.draw_chart(&view);
    out.draw_summary(&view);
    Ok(())
}

fn runs(args: &SourceArgs, mut config: DashboardConfig) -> Result<()> {
    args.apply(&mut config);
    let loader = loader_for(&config)?;
    let runs = loader.fetch_previous_runs()?;
    let selected = if runs.is_empty() {
        None
    } else {
        Some(BaselineSelector::new(Some(config.root.as_str())).select_default_index(&runs)?)
    };
    let mut stdout = io::stdout().lock();
    for (idx, run) in runs.iter().enumerate() {
        let marker = if Some(idx) == selected { "*" } else { " " };
        writeln!(stdout, "{marker} {idx:>3} {}", run.display_name())?;
    }
    Ok(())
}

fn ir(args: &IrArgs, mut config: DashboardConfig) -> Result<()> {
    if let Some(root) = &args.root {
        config.root = root.clone();
    }
    let params: QueryParams = [("benchmark", &args.benchmark), ("runmode", &args.runmode)]
        .into_iter()
        .filter_map(|(k, v)| v.clone().map(|v| (k, v)))
        .collect();
    let loader = loader_for(&config)?;
    let mut out = TextRenderer::new(io::stdout().lock());
    load_ir_page(&loader, &config.root, &params, &mut out)
}

fn table(args: &TableArgs, mut config: DashboardConfig) -> Result<()> {
    if let Some(root) = &args.root {
        config.root = root.clone();
    }
    let params: QueryParams = args
        .table
        .iter()
        .map(|t| ("table", t.clone()))
        .collect();
    let loader = loader_for(&config)?;
    let mut out = TextRenderer::new(io::stdout().lock());
    load_table_page(&loader, &config.root, &params, &mut out)
}

fn serve_dashboard(args: &ServeArgs, mut config: DashboardConfig) -> Result<()> {
    args.source.apply(&mut config);
    if let Some(bind) = &args.bind {
        config.bind = bind.clone();
    }
    let loader = loader_for(&config)?;
    let state = ServerState::initialize(loader, &config.root, config.chart_mode)?;
    info!(root = %config.root, "dashboard ready");
    serve(state.into_shared(), &config.bind)
}
