use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::coordinator::base::Coordinator;
use crate::coordinator::table::TableSnapshotPhase;
use crate::error::TransferResult;
use crate::types::{Position, TableName, TransferId};

#[derive(Debug)]
struct Inner {
    positions: HashMap<TransferId, Position>,
    table_states: HashMap<TransferId, HashMap<TableName, TableSnapshotPhase>>,
}

/// In-memory checkpoint store.
///
/// State survives worker restarts within one process but not process restarts; it is
/// meant for tests and local runs. Durable deployments plug in a persistent
/// [`Coordinator`] implementation instead.
#[derive(Debug, Clone)]
pub struct MemoryCoordinator {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryCoordinator {
    pub fn new() -> Self {
        let inner = Inner {
            positions: HashMap::new(),
            table_states: HashMap::new(),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }
}

impl Default for MemoryCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinator for MemoryCoordinator {
    async fn get_position(&self, transfer_id: TransferId) -> TransferResult<Option<Position>> {
        let inner = self.inner.lock().await;

        Ok(inner.positions.get(&transfer_id).copied())
    }

    async fn set_position(
        &self,
        transfer_id: TransferId,
        position: Position,
    ) -> TransferResult<()> {
        let mut inner = self.inner.lock().await;
        inner.positions.insert(transfer_id, position);

        Ok(())
    }

    async fn get_table_states(
        &self,
        transfer_id: TransferId,
    ) -> TransferResult<HashMap<TableName, TableSnapshotPhase>> {
        let inner = self.inner.lock().await;

        Ok(inner
            .table_states
            .get(&transfer_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_table_state(
        &self,
        transfer_id: TransferId,
        table: TableName,
        phase: TableSnapshotPhase,
    ) -> TransferResult<()> {
        let mut inner = self.inner.lock().await;
        inner
            .table_states
            .entry(transfer_id)
            .or_default()
            .insert(table, phase);

        Ok(())
    }
}
