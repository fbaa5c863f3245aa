use cdc_config::shared::TransferConfig;
use futures::StreamExt;
use std::collections::HashMap;
use tokio::pin;
use tracing::{debug, info};

use crate::concurrency::shutdown::{ShutdownResult, ShutdownRx};
use crate::concurrency::stream::TimeoutBatchStream;
use crate::coordinator::{Coordinator, TableSnapshotPhase};
use crate::error::TransferResult;
use crate::replication::common::prepare_batch;
use crate::replication::filter::ColumnFilters;
use crate::sink::Sinker;
use crate::storage::{ChangeStream, Storage};
use crate::types::{TableDescription, TableName};

/// Outcome of a completed snapshot pass.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SnapshotOutcome {
    /// Every table reached [`TableSnapshotPhase::Done`].
    Completed,
    /// A shutdown request interrupted the pass; unfinished tables keep their phase and
    /// are redone or resumed on the next run.
    Stopped,
}

/// Runs the snapshot phase: copies every table that has not finished its initial load.
///
/// Tables are processed sequentially. Each table is either copied in one
/// [`Storage::load_table`] pass or chunk by chunk when the provider reports snapshot
/// partitions; completed chunks are recorded in the coordinator so a restarted worker
/// skips them. Delivery is at-least-once: a table interrupted mid-copy is redone from
/// its last recorded chunk boundary.
pub async fn run_snapshot<S, K, C>(
    config: &TransferConfig,
    storage: &S,
    sinker: &K,
    coordinator: &C,
    filters: &ColumnFilters,
    tables: &[TableDescription],
    table_states: HashMap<TableName, TableSnapshotPhase>,
    shutdown_rx: ShutdownRx,
) -> TransferResult<SnapshotOutcome>
where
    S: Storage,
    K: Sinker,
    C: Coordinator,
{
    let transfer_id = config.id;

    for table in tables {
        let phase = table_states
            .get(&table.name)
            .copied()
            .unwrap_or(TableSnapshotPhase::Pending);

        if phase.is_done() {
            debug!("table {} already copied, skipping", table.name);
            continue;
        }

        let chunks_done = match phase {
            TableSnapshotPhase::Copying { chunks_done } => chunks_done,
            _ => {
                coordinator
                    .update_table_state(
                        transfer_id,
                        table.name.clone(),
                        TableSnapshotPhase::Copying { chunks_done: 0 },
                    )
                    .await?;

                0
            }
        };

        info!("starting snapshot of table {}", table.name);

        let partitions = storage.snapshot_partitions(table).await?;
        if partitions.is_empty() {
            let rows = storage.load_table(table).await?;
            let outcome = copy_rows(rows, config, sinker, filters, shutdown_rx.clone()).await?;
            if outcome == SnapshotOutcome::Stopped {
                info!("shutting down while copying table {}", table.name);
                return Ok(SnapshotOutcome::Stopped);
            }
        } else {
            for (index, query) in partitions.iter().enumerate() {
                // Chunks completed by a previous run are recorded in the coordinator
                // and must not be delivered again.
                if (index as u32) < chunks_done {
                    debug!("chunk {} of table {} already copied, skipping", index, table.name);
                    continue;
                }

                let rows = storage.load_query_table(query).await?;
                let outcome = copy_rows(rows, config, sinker, filters, shutdown_rx.clone()).await?;
                if outcome == SnapshotOutcome::Stopped {
                    info!("shutting down while copying table {}", table.name);
                    return Ok(SnapshotOutcome::Stopped);
                }

                coordinator
                    .update_table_state(
                        transfer_id,
                        table.name.clone(),
                        TableSnapshotPhase::Copying {
                            chunks_done: index as u32 + 1,
                        },
                    )
                    .await?;
            }
        }

        coordinator
            .update_table_state(transfer_id, table.name.clone(), TableSnapshotPhase::Done)
            .await?;

        info!("snapshot of table {} complete", table.name);
    }

    Ok(SnapshotOutcome::Completed)
}

/// Streams one table (or one chunk of it) to the sink in batches.
async fn copy_rows<K>(
    rows: ChangeStream,
    config: &TransferConfig,
    sinker: &K,
    filters: &ColumnFilters,
    shutdown_rx: ShutdownRx,
) -> TransferResult<SnapshotOutcome>
where
    K: Sinker,
{
    let batches = TimeoutBatchStream::wrap(rows, config.batch.clone(), shutdown_rx);
    pin!(batches);

    let mut rows_copied = 0;
    while let Some(result) = batches.next().await {
        match result {
            ShutdownResult::Ok(items) => {
                let items = items.into_iter().collect::<TransferResult<Vec<_>>>()?;
                let batch = prepare_batch(items, filters, config.bad_records)?;
                if batch.is_empty() {
                    continue;
                }

                rows_copied += batch.len();
                sinker.push(batch).await?;
            }
            ShutdownResult::Shutdown(_) => {
                // A copy interrupted mid-table is redone on restart, so the
                // accumulated remainder does not need to be flushed.
                return Ok(SnapshotOutcome::Stopped);
            }
        }
    }

    debug!("copied {rows_copied} rows");

    Ok(SnapshotOutcome::Completed)
}
