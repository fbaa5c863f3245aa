use cdc_config::shared::TransferConfig;
use futures::StreamExt;
use tokio::pin;
use tracing::{debug, info};

use crate::bail;
use crate::concurrency::shutdown::{ShutdownResult, ShutdownRx};
use crate::concurrency::stream::TimeoutBatchStream;
use crate::coordinator::Coordinator;
use crate::error::{ErrorKind, TransferError, TransferResult};
use crate::replication::common::prepare_batch;
use crate::replication::filter::ColumnFilters;
use crate::sink::Sinker;
use crate::storage::Storage;
use crate::types::{ChangeItem, Position};

/// Outcome of the incremental phase.
///
/// The change stream never ends on its own: the loop either observes a shutdown
/// request or fails. A stream that ends without a stop request is reported as a
/// retryable source failure, so the supervisor reconnects through a fresh worker.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IncrementalOutcome {
    Stopped,
}

/// Runs the incremental phase: streams changes from `start`, pushes them in batches,
/// and advances the checkpoint after every successful push.
///
/// The position is committed strictly after the corresponding push succeeds. This
/// ordering bounds loss to "at most one uncommitted batch re-delivered on restart" and
/// never allows a committed-but-undelivered state.
pub async fn run_incremental<S, K, C>(
    config: &TransferConfig,
    storage: &S,
    sinker: &K,
    coordinator: &C,
    filters: &ColumnFilters,
    start: Position,
    shutdown_rx: ShutdownRx,
) -> TransferResult<IncrementalOutcome>
where
    S: Storage,
    K: Sinker,
    C: Coordinator,
{
    info!("starting incremental replication from position {start}");

    let changes = storage.stream_changes(start).await?;
    let batches = TimeoutBatchStream::wrap(changes, config.batch.clone(), shutdown_rx);
    pin!(batches);

    let mut committed = start;
    while let Some(result) = batches.next().await {
        let (items, stopping) = match result {
            ShutdownResult::Ok(items) => (items, false),
            ShutdownResult::Shutdown(items) => (items, true),
        };

        let items = items.into_iter().collect::<TransferResult<Vec<_>>>()?;
        committed = deliver_batch(config, sinker, coordinator, filters, committed, items).await?;

        if stopping {
            info!("stopping incremental replication after shutdown request");
            return Ok(IncrementalOutcome::Stopped);
        }
    }

    bail!(
        ErrorKind::SourceConnectionFailed,
        "Change stream ended",
        format!(
            "the incremental change stream for transfer {} ended without a stop request",
            config.id
        )
    )
}

/// Pushes one batch and advances the checkpoint on success.
///
/// Returns the new committed position (unchanged when the batch had nothing to
/// deliver).
async fn deliver_batch<K, C>(
    config: &TransferConfig,
    sinker: &K,
    coordinator: &C,
    filters: &ColumnFilters,
    committed: Position,
    mut items: Vec<ChangeItem>,
) -> TransferResult<Position>
where
    K: Sinker,
    C: Coordinator,
{
    // Sources may replay a window behind the checkpoint when resuming. Dropping items
    // at or below the committed position bounds redelivery to the single in-flight
    // batch; sinks that prefer to deduplicate themselves can turn this off.
    if config.drop_stale_on_resume {
        let before = items.len();
        items.retain(|item| item.position > committed);
        if items.len() < before {
            debug!(
                "dropped {} change items at or below committed position {committed}",
                before - items.len()
            );
        }
    }

    let batch = prepare_batch(items, filters, config.bad_records)?;
    if batch.is_empty() {
        return Ok(committed);
    }

    let next_position = batch.max_position().unwrap_or(committed);
    let batch_len = batch.len();

    sinker.push(batch).await?;
    debug!("pushed a batch of {batch_len} change items");

    // The checkpoint only ever moves forward, and only after the push above succeeded.
    if next_position > committed {
        coordinator.set_position(config.id, next_position).await?;
        return Ok(next_position);
    }

    Ok(committed)
}
