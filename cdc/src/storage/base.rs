use futures::stream::BoxStream;
use std::future::Future;

use crate::error::TransferResult;
use crate::types::{ChangeItem, Position, TableDescription, TableQuery};

/// Stream of change items produced by a storage provider.
///
/// The consumer batches and pushes items at its own pace; a slow consumer applies
/// backpressure to the producer through the stream itself.
pub type ChangeStream = BoxStream<'static, TransferResult<ChangeItem>>;

/// Contract implemented by every source provider.
///
/// A storage instance is owned exclusively by one worker for the duration of one run
/// and is not shared. All blocking calls must observe cancellation of the task that
/// drives them within a bounded time.
pub trait Storage {
    /// Returns the source's position at the time of the call.
    ///
    /// The worker records this marker before the first snapshot write so that changes
    /// made while the snapshot runs are replayed by the incremental phase.
    fn current_position(&self) -> impl Future<Output = TransferResult<Position>> + Send;

    /// Streams the full current contents of a table as snapshot-insert items.
    ///
    /// The stream ends once the table is fully read. Items are produced in a stable
    /// order; the table's row filter, if any, has already been applied.
    fn load_table(
        &self,
        table: &TableDescription,
    ) -> impl Future<Output = TransferResult<ChangeStream>> + Send;

    /// Streams one chunk of a table, scoped by the query's predicate.
    ///
    /// The union of the rows produced by all partitions of a table must equal the
    /// output of [`Storage::load_table`]; ordering across chunks is unspecified,
    /// ordering within a chunk is preserved.
    fn load_query_table(
        &self,
        query: &TableQuery,
    ) -> impl Future<Output = TransferResult<ChangeStream>> + Send;

    /// Returns the provider's partitioning of a table for chunked snapshot loading.
    ///
    /// An empty list means the table is copied in a single [`Storage::load_table`]
    /// pass. The list must be stable across restarts: chunk completion is persisted by
    /// index, and a reordered list would skip or repeat rows on resume.
    fn snapshot_partitions(
        &self,
        table: &TableDescription,
    ) -> impl Future<Output = TransferResult<Vec<TableQuery>>> + Send {
        let _ = table;
        async { Ok(Vec::new()) }
    }

    /// Continuously streams changes starting strictly after `from`.
    ///
    /// The stream must not skip any change; re-emitting items at the resume boundary is
    /// tolerated (the worker filters them when configured to). The stream ends only on
    /// source failure, which the worker reports as a retryable error.
    fn stream_changes(
        &self,
        from: Position,
    ) -> impl Future<Output = TransferResult<ChangeStream>> + Send;
}
