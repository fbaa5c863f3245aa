use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};

use cdc::coordinator::{Coordinator, TableSnapshotPhase};
use cdc::error::TransferResult;
use cdc::types::{Position, TableName, TransferId};

struct Inner {
    positions: HashMap<TransferId, Position>,
    position_history: HashMap<TransferId, Vec<Position>>,
    table_states: HashMap<TransferId, HashMap<TableName, TableSnapshotPhase>>,
    table_state_conditions: Vec<(TransferId, TableName, TableSnapshotPhase, Arc<Notify>)>,
}

impl Inner {
    fn check_conditions(&mut self) {
        let table_states = self.table_states.clone();
        self.table_state_conditions
            .retain(|(transfer_id, table, expected, notify)| {
                let reached = table_states
                    .get(transfer_id)
                    .and_then(|states| states.get(table))
                    .is_some_and(|state| state == expected);

                if reached {
                    notify.notify_one();
                }

                !reached
            });
    }
}

/// A coordinator that records every committed position and notifies about table state
/// changes, so tests can wait for checkpoints instead of sleeping.
#[derive(Clone)]
pub struct NotifyingCoordinator {
    inner: Arc<RwLock<Inner>>,
}

impl NotifyingCoordinator {
    pub fn new() -> Self {
        let inner = Inner {
            positions: HashMap::new(),
            position_history: HashMap::new(),
            table_states: HashMap::new(),
            table_state_conditions: Vec::new(),
        };

        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    pub async fn position(&self, transfer_id: TransferId) -> Option<Position> {
        let inner = self.inner.read().await;
        inner.positions.get(&transfer_id).copied()
    }

    /// Every position ever committed for the transfer, in commit order.
    pub async fn position_history(&self, transfer_id: TransferId) -> Vec<Position> {
        let inner = self.inner.read().await;
        inner
            .position_history
            .get(&transfer_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn table_state(
        &self,
        transfer_id: TransferId,
        table: &TableName,
    ) -> Option<TableSnapshotPhase> {
        let inner = self.inner.read().await;
        inner
            .table_states
            .get(&transfer_id)
            .and_then(|states| states.get(table))
            .copied()
    }

    /// Returns a notify that fires once the table reaches the expected phase.
    pub async fn notify_on_table_state(
        &self,
        transfer_id: TransferId,
        table: TableName,
        expected: TableSnapshotPhase,
    ) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        let mut inner = self.inner.write().await;
        inner
            .table_state_conditions
            .push((transfer_id, table, expected, notify.clone()));

        // The expected state may already be reached by the time this method is called,
        // in which case the notification would otherwise never fire.
        inner.check_conditions();

        notify
    }
}

impl Default for NotifyingCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinator for NotifyingCoordinator {
    async fn get_position(&self, transfer_id: TransferId) -> TransferResult<Option<Position>> {
        let inner = self.inner.read().await;

        Ok(inner.positions.get(&transfer_id).copied())
    }

    async fn set_position(
        &self,
        transfer_id: TransferId,
        position: Position,
    ) -> TransferResult<()> {
        let mut inner = self.inner.write().await;
        inner.positions.insert(transfer_id, position);
        inner
            .position_history
            .entry(transfer_id)
            .or_default()
            .push(position);

        Ok(())
    }

    async fn get_table_states(
        &self,
        transfer_id: TransferId,
    ) -> TransferResult<HashMap<TableName, TableSnapshotPhase>> {
        let inner = self.inner.read().await;

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
        let mut inner = self.inner.write().await;
        inner
            .table_states
            .entry(transfer_id)
            .or_default()
            .insert(table, phase);
        inner.check_conditions();

        Ok(())
    }
}
