mod app;
mod cli;
mod config;
mod db;
mod error;
mod http;
mod paths;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_logging(&cli);
    app::run(cli)
}

fn init_logging(cli: &cli::Cli) {
    // The viewer owns the screen; keep stderr quiet unless asked.
    let default_level = if cli.verbose {
        "debug"
    } else if cli.opens_viewer() {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_env("DRSVIEW_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("drsview={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
