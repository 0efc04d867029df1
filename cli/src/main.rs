//! `catalog`: terminal front end for the film and actor catalog.
//!
//! Loads `.env`, parses flags (which override `CATALOG_*` variables), runs
//! one command against the API and prints whatever toasts it raised. The
//! session lives in a JSON file between invocations.

mod cli;
mod commands;
mod render;
mod transport;

use std::io;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::Console;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries command output; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::debug!(
        base_url = %cli.config.base_url,
        session_file = %cli.config.session_file.display(),
        timeout_secs = cli.config.timeout_secs,
        "configuration"
    );

    let mut app = commands::build_app(&cli.config)?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    let result = {
        let mut console = Console {
            input: &mut input,
            output: &mut output,
            json: cli.json,
        };
        commands::run(&mut app, cli.command, &mut console)
    };
    render::flush_toasts(app.toasts_mut().drain());
    result
}
