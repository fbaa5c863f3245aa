use futures::StreamExt;
use futures::stream;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

use crate::error::TransferResult;
use crate::storage::base::{ChangeStream, Storage};
use crate::types::{
    ChangeItem, ChangeKind, ColumnValue, Position, TableDescription, TableName, TableQuery,
};

#[derive(Debug)]
struct Inner {
    table_rows: HashMap<TableName, Vec<Vec<ColumnValue>>>,
    changes: Vec<ChangeItem>,
    last_position: u64,
    subscribers: Vec<mpsc::UnboundedSender<ChangeItem>>,
}

/// In-memory storage provider.
///
/// Holds seeded table rows for the snapshot phase and an append-only change log for
/// the incremental phase. Rows and changes are fed in by tests (or demo setups) through
/// [`MemoryStorage::insert_table_rows`] and [`MemoryStorage::push_change`].
///
/// Row filters and chunk predicates are not interpreted: the provider reports no
/// snapshot partitions and serves every query over the full table.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        let inner = Inner {
            table_rows: HashMap::new(),
            changes: Vec::new(),
            last_position: 0,
            subscribers: Vec::new(),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Seeds rows served by the snapshot phase for `table`.
    pub async fn insert_table_rows(&self, table: TableName, rows: Vec<Vec<ColumnValue>>) {
        let mut inner = self.inner.lock().await;
        inner.table_rows.entry(table).or_default().extend(rows);
    }

    /// Appends a change to the log and delivers it to all live change streams.
    ///
    /// Returns the position assigned to the change.
    pub async fn push_change(
        &self,
        table: TableName,
        kind: ChangeKind,
        columns: Vec<ColumnValue>,
        old_columns: Option<Vec<ColumnValue>>,
    ) -> Position {
        let mut inner = self.inner.lock().await;
        inner.last_position += 1;

        let item = ChangeItem {
            table,
            kind,
            columns,
            old_columns,
            position: Position::new(inner.last_position),
        };

        inner.changes.push(item.clone());
        inner
            .subscribers
            .retain(|subscriber| subscriber.send(item.clone()).is_ok());

        item.position
    }

    /// Ends every live change stream, simulating a source connection loss.
    ///
    /// Streams opened afterwards see the full retained log again.
    pub async fn disconnect(&self) {
        let mut inner = self.inner.lock().await;
        inner.subscribers.clear();
    }

    async fn table_stream(&self, table: &TableName) -> ChangeStream {
        let inner = self.inner.lock().await;
        let position = Position::new(inner.last_position);

        let items = inner
            .table_rows
            .get(table)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|columns| {
                Ok(ChangeItem {
                    table: table.clone(),
                    kind: ChangeKind::SnapshotInsert,
                    columns,
                    old_columns: None,
                    position,
                })
            })
            .collect::<Vec<TransferResult<ChangeItem>>>();

        stream::iter(items).boxed()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    async fn current_position(&self) -> TransferResult<Position> {
        let inner = self.inner.lock().await;

        Ok(Position::new(inner.last_position))
    }

    async fn load_table(&self, table: &TableDescription) -> TransferResult<ChangeStream> {
        Ok(self.table_stream(&table.name).await)
    }

    async fn load_query_table(&self, query: &TableQuery) -> TransferResult<ChangeStream> {
        // No partitions are ever reported, so a query can only mean the whole table.
        Ok(self.table_stream(&query.table.name).await)
    }

    async fn stream_changes(&self, from: Position) -> TransferResult<ChangeStream> {
        let mut inner = self.inner.lock().await;

        let backlog = inner
            .changes
            .iter()
            .filter(|item| item.position > from)
            .cloned()
            .map(Ok)
            .collect::<Vec<TransferResult<ChangeItem>>>();

        let (tx, rx) = mpsc::unbounded_channel();
        inner.subscribers.push(tx);

        let live = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (Ok(item), rx))
        });

        Ok(stream::iter(backlog).chain(live).boxed())
    }
}
