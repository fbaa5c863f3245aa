use cdc_config::shared::TransferConfig;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::concurrency::shutdown::ShutdownRx;
use crate::coordinator::{Coordinator, TableSnapshotPhase};
use crate::error::{ErrorKind, TransferError, TransferResult};
use crate::replication::filter::ColumnFilters;
use crate::replication::incremental::{IncrementalOutcome, run_incremental};
use crate::replication::snapshot::{SnapshotOutcome, run_snapshot};
use crate::sink::Sinker;
use crate::storage::Storage;
use crate::transfer_error;
use crate::types::TableDescription;
use crate::workers::base::{Worker, WorkerHandle};

/// Maximum time to wait for a phase change notification before re-checking.
const PHASE_CHANGE_REFRESH_FREQUENCY: Duration = Duration::from_millis(100);

/// Observable lifecycle of one transfer worker run.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WorkerPhase {
    /// Constructed, not yet driving any phase.
    Idle,
    /// Copying initial table contents.
    Snapshot,
    /// Streaming and applying incremental changes.
    Incremental,
    /// A stop request was observed; the run is wrapping up.
    Stopping,
    /// The run returned cleanly (stop-induced termination).
    Stopped,
    /// The run returned with an error.
    Failed,
}

impl fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Snapshot => write!(f, "snapshot"),
            Self::Incremental => write!(f, "incremental"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug)]
struct TransferWorkerStateInner {
    phase: WorkerPhase,
    phase_change: Arc<Notify>,
}

/// Shared, observable state of a transfer worker.
///
/// The state outlives the worker task: holding it says nothing about whether the
/// worker is still running, it only exposes the last phase the worker reached.
#[derive(Debug, Clone)]
pub struct TransferWorkerState {
    inner: Arc<RwLock<TransferWorkerStateInner>>,
}

impl TransferWorkerState {
    fn new() -> Self {
        let inner = TransferWorkerStateInner {
            phase: WorkerPhase::Idle,
            phase_change: Arc::new(Notify::new()),
        };

        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// Returns the phase the worker is currently in.
    pub async fn phase(&self) -> WorkerPhase {
        let inner = self.inner.read().await;
        inner.phase
    }

    async fn set_phase(&self, phase: WorkerPhase) {
        let mut inner = self.inner.write().await;
        info!(
            "worker phase changing from '{}' to '{}'",
            inner.phase, phase
        );

        inner.phase = phase;
        // Only active listeners are woken up; waiters arriving later re-check the
        // phase themselves.
        inner.phase_change.notify_waiters();
    }

    /// Waits until the worker reaches the given phase.
    ///
    /// The wait polls on a timeout besides listening for change notifications, so a
    /// missed notification cannot block the caller indefinitely.
    pub async fn wait_for_phase(&self, phase: WorkerPhase) {
        loop {
            let phase_change = {
                let inner = self.inner.read().await;
                if inner.phase == phase {
                    return;
                }

                inner.phase_change.clone()
            };

            let _ =
                tokio::time::timeout(PHASE_CHANGE_REFRESH_FREQUENCY, phase_change.notified())
                    .await;
        }
    }
}

/// Handle to a running transfer worker.
#[derive(Debug)]
pub struct TransferWorkerHandle {
    state: TransferWorkerState,
    handle: Option<JoinHandle<TransferResult<()>>>,
}

impl WorkerHandle<TransferWorkerState> for TransferWorkerHandle {
    fn state(&self) -> TransferWorkerState {
        self.state.clone()
    }

    async fn wait(mut self) -> TransferResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        match handle.await {
            Ok(result) => result,
            Err(err) => Err(transfer_error!(
                ErrorKind::WorkerPanic,
                "Transfer worker task did not complete",
                err
            )),
        }
    }
}

/// Drives one transfer through its snapshot and incremental phases.
///
/// A worker owns its storage and sinker exclusively for the duration of one run. It is
/// built, run, and discarded by the supervisor; all state that must survive the run
/// lives in the coordinator.
#[derive(Debug)]
pub struct TransferWorker<S, K, C> {
    transfer: Arc<TransferConfig>,
    storage: S,
    sinker: K,
    coordinator: C,
    shutdown_rx: ShutdownRx,
}

impl<S, K, C> TransferWorker<S, K, C> {
    pub fn new(
        transfer: Arc<TransferConfig>,
        storage: S,
        sinker: K,
        coordinator: C,
        shutdown_rx: ShutdownRx,
    ) -> Self {
        Self {
            transfer,
            storage,
            sinker,
            coordinator,
            shutdown_rx,
        }
    }
}

impl<S, K, C> Worker<TransferWorkerHandle, TransferWorkerState> for TransferWorker<S, K, C>
where
    S: Storage + Clone + Send + Sync + 'static,
    K: Sinker + Clone + Send + Sync + 'static,
    C: Coordinator + Clone + Send + Sync + 'static,
{
    async fn start(self) -> TransferResult<TransferWorkerHandle> {
        info!("starting transfer worker");

        let state = TransferWorkerState::new();
        let worker_state = state.clone();

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "transfer_worker",
            transfer_id = self.transfer.id,
            run_id = %run_id
        );

        let sinker = self.sinker.clone();
        let worker = async move {
            let result = run_transfer(
                self.transfer,
                self.storage,
                self.sinker,
                self.coordinator,
                worker_state.clone(),
                self.shutdown_rx,
            )
            .await;

            // The sinker is closed exactly once at teardown; a close failure is logged
            // but never masks the run result.
            if let Err(err) = sinker.close().await {
                warn!("failed to close sinker: {err}");
            }

            match &result {
                Ok(()) => {
                    worker_state.set_phase(WorkerPhase::Stopped).await;
                    info!("transfer worker stopped");
                }
                Err(err) => {
                    worker_state.set_phase(WorkerPhase::Failed).await;
                    error!("transfer worker failed: {err}");
                }
            }

            result
        }
        .instrument(span);

        let handle = tokio::spawn(worker);

        Ok(TransferWorkerHandle {
            state,
            handle: Some(handle),
        })
    }
}

async fn run_transfer<S, K, C>(
    transfer: Arc<TransferConfig>,
    storage: S,
    sinker: K,
    coordinator: C,
    state: TransferWorkerState,
    shutdown_rx: ShutdownRx,
) -> TransferResult<()>
where
    S: Storage,
    K: Sinker,
    C: Coordinator,
{
    let transfer_id = transfer.id;
    let filters = ColumnFilters::from_tables(&transfer.source.tables);
    let tables = transfer
        .source
        .tables
        .iter()
        .map(TableDescription::from)
        .collect::<Vec<_>>();

    // The anchor is committed before any snapshot write: changes made to the source
    // while the snapshot runs fall after it and are replayed by the incremental phase.
    let start = match coordinator.get_position(transfer_id).await? {
        Some(position) => position,
        None => {
            let anchor = storage.current_position().await?;
            coordinator.set_position(transfer_id, anchor).await?;
            info!("anchored new transfer at position {anchor}");

            anchor
        }
    };

    let table_states = coordinator.get_table_states(transfer_id).await?;
    let snapshot_pending = tables.iter().any(|table| {
        !table_states
            .get(&table.name)
            .is_some_and(TableSnapshotPhase::is_done)
    });

    if snapshot_pending {
        state.set_phase(WorkerPhase::Snapshot).await;

        let outcome = run_snapshot(
            &transfer,
            &storage,
            &sinker,
            &coordinator,
            &filters,
            &tables,
            table_states,
            shutdown_rx.clone(),
        )
        .await?;

        if outcome == SnapshotOutcome::Stopped {
            state.set_phase(WorkerPhase::Stopping).await;
            return Ok(());
        }
    }

    state.set_phase(WorkerPhase::Incremental).await;

    let IncrementalOutcome::Stopped = run_incremental(
        &transfer,
        &storage,
        &sinker,
        &coordinator,
        &filters,
        start,
        shutdown_rx,
    )
    .await?;

    state.set_phase(WorkerPhase::Stopping).await;

    Ok(())
}
