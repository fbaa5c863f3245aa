use std::path::Path;

use cdc::coordinator::Coordinator;
use cdc::coordinator::memory::MemoryCoordinator;
use cdc::sink::Sinker;
use cdc::sink::memory::MemorySinker;
use cdc::sink::stdout::StdoutSinker;
use cdc::storage::Storage;
use cdc::storage::memory::MemoryStorage;
use cdc::supervisor::Supervisor;
use cdc_config::load_config;
use cdc_config::shared::{BatchConfig, DestinationConfig, RestartConfig, TransferConfig};
use tracing::{info, warn};

pub async fn start_replication(transfer_path: &Path) -> anyhow::Result<()> {
    info!("starting replicator service");

    let transfer_config: TransferConfig = load_config(transfer_path)?;
    transfer_config.validate()?;

    log_transfer_config(&transfer_config);

    // Concrete providers plug in here through the core contracts. The built-in
    // providers keep all state in process memory; durable deployments supply their
    // own storage and coordinator implementations.
    let storage = MemoryStorage::new();
    let coordinator = MemoryCoordinator::new();

    // For each destination, we run the supervisor with a concrete sinker. This is
    // more verbose due to static dispatch, but we prefer more performance at the
    // cost of ergonomics.
    match transfer_config.destination.clone() {
        DestinationConfig::Memory => {
            let sinker = MemorySinker::new();

            let supervisor = Supervisor::new(transfer_config, storage, sinker, coordinator);
            run_supervisor(supervisor).await?;
        }
        DestinationConfig::Stdout => {
            let sinker = StdoutSinker::new();

            let supervisor = Supervisor::new(transfer_config, storage, sinker, coordinator);
            run_supervisor(supervisor).await?;
        }
    }

    info!("replicator service completed");

    Ok(())
}

fn log_transfer_config(config: &TransferConfig) {
    info!(
        transfer_id = config.id,
        tables = config.source.tables.len(),
        bad_records = ?config.bad_records,
        drop_stale_on_resume = config.drop_stale_on_resume,
        "transfer config"
    );
    log_batch_config(&config.batch);
    log_restart_config(&config.restart);
}

fn log_batch_config(config: &BatchConfig) {
    info!(
        max_size = config.max_size,
        max_fill_ms = config.max_fill_ms,
        "batch config"
    );
}

fn log_restart_config(config: &RestartConfig) {
    info!(
        initial_delay_ms = config.initial_delay_ms,
        max_delay_ms = config.max_delay_ms,
        backoff_factor = config.backoff_factor,
        "restart config"
    )
}

#[tracing::instrument(skip(supervisor), fields(transfer_id = supervisor.id()))]
async fn run_supervisor<S, K, C>(supervisor: Supervisor<S, K, C>) -> anyhow::Result<()>
where
    S: Storage + Clone + Send + Sync + 'static,
    K: Sinker + Clone + Send + Sync + 'static,
    C: Coordinator + Clone + Send + Sync + 'static,
{
    // Spawn a task to listen for shutdown signals and trigger shutdown.
    let shutdown_tx = supervisor.shutdown_tx();
    let shutdown_handle = tokio::spawn(async move {
        use tokio::signal::unix::{SignalKind, signal};

        // Listen for SIGTERM, sent by orchestrators before SIGKILL during termination.
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("SIGINT (Ctrl+C) received, shutting down transfer");
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down transfer");
            }
        }

        if let Err(e) = shutdown_tx.shutdown() {
            warn!("failed to send shutdown signal: {:?}", e);
            return;
        }

        info!("transfer shutdown successfully")
    });

    // Wait for the supervisor to finish (either a stop request or a fatal error).
    let result = supervisor.run().await;

    // Ensure the shutdown task is finished before returning. If the supervisor
    // finished before any signal arrived, the task is still waiting and must be
    // aborted.
    shutdown_handle.abort();
    let _ = shutdown_handle.await;

    // Propagate any fatal error as anyhow error.
    result?;

    Ok(())
}
