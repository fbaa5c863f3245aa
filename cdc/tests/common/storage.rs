use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use cdc::error::TransferResult;
use cdc::storage::memory::MemoryStorage;
use cdc::storage::{ChangeStream, Storage};
use cdc::types::{
    ChangeItem, ChangeKind, ColumnValue, Position, TableDescription, TableName, TableQuery,
};
use futures::StreamExt;
use futures::stream;

struct Inner {
    partitions: HashMap<TableName, Vec<Vec<Vec<ColumnValue>>>>,
    replay_from_zero: bool,
}

/// A storage wrapper for tests that need behaviors the memory provider does not have:
/// snapshot partitions and a change stream that replays an arbitrary window behind the
/// requested resume position.
#[derive(Clone)]
pub struct ScriptedStorage {
    memory: MemoryStorage,
    inner: Arc<RwLock<Inner>>,
}

impl ScriptedStorage {
    pub fn new(memory: MemoryStorage) -> Self {
        let inner = Inner {
            partitions: HashMap::new(),
            replay_from_zero: false,
        };

        Self {
            memory,
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    pub fn memory(&self) -> &MemoryStorage {
        &self.memory
    }

    /// Declares the snapshot chunks served for `table`, as lists of rows.
    pub async fn set_partitions(&self, table: TableName, chunks: Vec<Vec<Vec<ColumnValue>>>) {
        let mut inner = self.inner.write().await;
        inner.partitions.insert(table, chunks);
    }

    /// Makes every change stream start from position zero, ignoring the requested
    /// resume position. Simulates a source that replays a window behind the
    /// checkpoint.
    pub async fn replay_from_zero(&self) {
        let mut inner = self.inner.write().await;
        inner.replay_from_zero = true;
    }
}

impl Storage for ScriptedStorage {
    async fn current_position(&self) -> TransferResult<Position> {
        self.memory.current_position().await
    }

    async fn load_table(&self, table: &TableDescription) -> TransferResult<ChangeStream> {
        self.memory.load_table(table).await
    }

    async fn load_query_table(&self, query: &TableQuery) -> TransferResult<ChangeStream> {
        let chunk_index = query
            .predicate
            .strip_prefix("chunk:")
            .and_then(|index| index.parse::<usize>().ok())
            .expect("scripted chunk predicate");

        let position = self.memory.current_position().await?;
        let inner = self.inner.read().await;

        let rows = inner
            .partitions
            .get(&query.table.name)
            .and_then(|chunks| chunks.get(chunk_index))
            .cloned()
            .unwrap_or_default();

        let items = rows
            .into_iter()
            .map(|columns| {
                Ok(ChangeItem {
                    table: query.table.name.clone(),
                    kind: ChangeKind::SnapshotInsert,
                    columns,
                    old_columns: None,
                    position,
                })
            })
            .collect::<Vec<TransferResult<ChangeItem>>>();

        Ok(stream::iter(items).boxed())
    }

    async fn snapshot_partitions(
        &self,
        table: &TableDescription,
    ) -> TransferResult<Vec<TableQuery>> {
        let inner = self.inner.read().await;

        let chunks = inner
            .partitions
            .get(&table.name)
            .map(|chunks| chunks.len())
            .unwrap_or_default();

        Ok((0..chunks)
            .map(|index| TableQuery::new(table.clone(), format!("chunk:{index}")))
            .collect())
    }

    async fn stream_changes(&self, from: Position) -> TransferResult<ChangeStream> {
        let replay_from_zero = {
            let inner = self.inner.read().await;
            inner.replay_from_zero
        };

        let from = if replay_from_zero { Position::ZERO } else { from };

        self.memory.stream_changes(from).await
    }
}
