// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with clap and hands a RunConfig to
// Layer 2. Nothing here touches Burn.
//
//   genre-classifier train [--config run.json] [--flags ...]
//   genre-classifier test  [...]

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::Commands;

use crate::application::train_use_case::TrainUseCase;
use crate::infra::logging::LogSink;

#[derive(Parser, Debug)]
#[command(
    name = "genre-classifier",
    version,
    about = "Train a CNN that tells two musical genres apart from piano rolls."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self, log_sink: LogSink) -> Result<()> {
        let phase = self.command.phase();
        let args = match self.command {
            Commands::Train(args) | Commands::Test(args) => args,
        };

        let config = args.into_config(phase)?;
        tracing::info!("Starting {:?} phase for run '{}'", phase, config.name);

        TrainUseCase::new(config, log_sink).execute()
    }
}
