//! Supervision loop driving transfer workers.
//!
//! Contains the [`Supervisor`] that repeatedly runs a [`TransferWorker`] bound to one
//! transfer, restarting it on retryable failures and terminating only on a stop
//! request or a fatal error.

use cdc_config::shared::{RestartConfig, TransferConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::concurrency::shutdown::{ShutdownRx, ShutdownTx, create_shutdown_channel};
use crate::coordinator::Coordinator;
use crate::error::TransferResult;
use crate::sink::Sinker;
use crate::storage::Storage;
use crate::types::TransferId;
use crate::workers::base::{Worker, WorkerHandle};
use crate::workers::transfer::TransferWorker;

/// Long-running supervisor for one transfer.
///
/// Each loop iteration builds a fresh worker from clones of the providers; the worker
/// re-reads its position from the coordinator, so a restart resumes from the last
/// committed checkpoint. The loop has exactly two exits: a stop request (returns
/// `Ok`) and a fatal error (returns the error). Retryable failures restart the worker
/// after an exponential, shutdown-interruptible backoff — the loop itself never gives
/// up on them.
#[derive(Debug)]
pub struct Supervisor<S, K, C> {
    transfer: Arc<TransferConfig>,
    storage: S,
    sinker: K,
    coordinator: C,
    shutdown_tx: ShutdownTx,
    shutdown_rx: ShutdownRx,
}

impl<S, K, C> Supervisor<S, K, C>
where
    S: Storage + Clone + Send + Sync + 'static,
    K: Sinker + Clone + Send + Sync + 'static,
    C: Coordinator + Clone + Send + Sync + 'static,
{
    /// Creates a new supervisor bound to the given transfer and providers.
    ///
    /// Nothing runs until [`Supervisor::run`] is called.
    pub fn new(transfer: TransferConfig, storage: S, sinker: K, coordinator: C) -> Self {
        // The receiver is kept from channel creation so that a stop requested before
        // `run` is called is not lost.
        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();

        Self {
            transfer: Arc::new(transfer),
            storage,
            sinker,
            coordinator,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Returns the unique identifier of the supervised transfer.
    pub fn id(&self) -> TransferId {
        self.transfer.id
    }

    /// Returns a handle for sending stop requests to this supervisor.
    ///
    /// Multiple components can hold shutdown handles to coordinate graceful
    /// termination.
    pub fn shutdown_tx(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    /// Requests cooperative termination of the supervised transfer.
    ///
    /// Returns immediately after signaling; the in-flight worker observes the signal
    /// at its next suspension point and [`Supervisor::run`] returns `Ok`. Requesting
    /// a stop more than once has no additional effect.
    pub fn shutdown(&self) {
        info!("trying to shut down the transfer");

        if let Err(err) = self.shutdown_tx.shutdown() {
            error!("failed to send shutdown signal to the transfer worker: {}", err);
            return;
        }

        info!("shutdown signal successfully sent to the transfer worker");
    }

    /// Runs workers until a stop request or a fatal error.
    ///
    /// Blocks for the lifetime of the transfer; this is the entry point of the
    /// long-running service.
    pub async fn run(self) -> TransferResult<()> {
        info!("starting supervision loop for transfer {}", self.transfer.id);

        let mut failed_runs: u32 = 0;

        loop {
            let mut shutdown_rx = self.shutdown_rx.clone();

            // A stop requested between runs must not spawn another worker.
            if shutdown_rx.has_changed().unwrap_or(false) {
                info!("shutdown requested, supervision loop terminating");
                return Ok(());
            }

            let worker = TransferWorker::new(
                self.transfer.clone(),
                self.storage.clone(),
                self.sinker.clone(),
                self.coordinator.clone(),
                shutdown_rx.clone(),
            );

            let result = match worker.start().await {
                Ok(handle) => handle.wait().await,
                Err(err) => Err(err),
            };

            match result {
                Ok(()) => {
                    info!("transfer worker finished, supervision loop terminating");
                    return Ok(());
                }
                Err(err) if err.is_fatal() => {
                    // The single fatal exit of the loop.
                    error!("transfer worker failed with a fatal error: {err}");
                    return Err(err);
                }
                Err(err) => {
                    failed_runs += 1;
                    let delay = restart_delay(&self.transfer.restart, failed_runs);
                    warn!(
                        "transfer worker failed: {err}, restarting in {}ms",
                        delay.as_millis()
                    );

                    tokio::select! {
                        biased;

                        _ = shutdown_rx.changed() => {
                            info!("shutdown requested while waiting to restart");
                            return Ok(());
                        }

                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}

/// Computes the backoff delay before the next restart.
fn restart_delay(config: &RestartConfig, failed_runs: u32) -> Duration {
    let exponent = failed_runs.saturating_sub(1).min(31) as i32;
    let delay = config.initial_delay_ms as f64 * (config.backoff_factor as f64).powi(exponent);

    Duration::from_millis(delay.min(config.max_delay_ms as f64) as u64)
}
