#![recursion_limit = "256"]

mod cli;
mod application;
mod domain;
mod data;
mod ml;
mod infra;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    let log_sink = infra::logging::init_tracing();

    let cli = Cli::parse();
    cli.run(log_sink)
}
