use std::process;

use clap::Parser;
use nightly_dashboard::cli::{Cli, exit_code, run};
use tracing::error;

fn main() {
    let cli = Cli::parse();
    let config = match cli.load_config() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(2);
        }
    };
    setup_logging(cli.log_level.as_deref().unwrap_or(&config.log_level));

    if let Err(err) = run(&cli, config) {
        error!("{err}");
        process::exit(exit_code(&err));
    }
}

fn setup_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
