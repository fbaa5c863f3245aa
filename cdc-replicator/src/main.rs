use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cdc_telemetry::init_tracing;

use crate::core::start_replication;

mod core;

#[derive(Parser)]
#[command(name = "cdc-replicator", about = "Snapshot and change-data-capture replication")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start local replication of one transfer.
    Replicate {
        /// Path to the yaml file with the transfer configuration.
        #[arg(long, default_value = "./transfer.yaml")]
        transfer: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let app_name = env!("CARGO_BIN_NAME");
    let _log_flusher = init_tracing(app_name)?;

    match cli.command {
        Commands::Replicate { transfer } => start_replication(&transfer).await?,
    }

    Ok(())
}
