use std::collections::HashMap;
use std::future::Future;

use crate::coordinator::table::TableSnapshotPhase;
use crate::error::TransferResult;
use crate::types::{Position, TableName, TransferId};

/// Contract implemented by every checkpoint store.
///
/// The coordinator is the only state shared across worker instances and restarts. It
/// must tolerate concurrent reads and sequential last-writer-wins writes: positions are
/// monotonic, so a stale write from a crashed worker can never move the checkpoint
/// backwards past a newer one that was already observed.
///
/// Coordinator failures are retryable from the worker's point of view: a failed
/// checkpoint write aborts the current run without corrupting already-committed state.
pub trait Coordinator {
    /// Returns the last acknowledged position for a transfer, if any.
    ///
    /// An absent position means the transfer starts from a snapshot.
    fn get_position(
        &self,
        transfer_id: TransferId,
    ) -> impl Future<Output = TransferResult<Option<Position>>> + Send;

    /// Persists the last acknowledged position for a transfer.
    fn set_position(
        &self,
        transfer_id: TransferId,
        position: Position,
    ) -> impl Future<Output = TransferResult<()>> + Send;

    /// Returns the snapshot phase of every table known for a transfer.
    fn get_table_states(
        &self,
        transfer_id: TransferId,
    ) -> impl Future<Output = TransferResult<HashMap<TableName, TableSnapshotPhase>>> + Send;

    /// Persists the snapshot phase of one table of a transfer.
    fn update_table_state(
        &self,
        transfer_id: TransferId,
        table: TableName,
        phase: TableSnapshotPhase,
    ) -> impl Future<Output = TransferResult<()>> + Send;
}
