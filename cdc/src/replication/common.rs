use cdc_config::shared::BadRecordPolicy;
use tracing::warn;

use crate::error::TransferResult;
use crate::replication::filter::ColumnFilters;
use crate::types::{Batch, ChangeItem};

/// Turns raw change items into a batch ready for the sink.
///
/// Applies the bad-record policy and the column allow-lists. With
/// [`BadRecordPolicy::Skip`] malformed items are logged and dropped; with
/// [`BadRecordPolicy::Abort`] the first malformed item fails the run (retryably).
pub fn prepare_batch(
    items: Vec<ChangeItem>,
    filters: &ColumnFilters,
    policy: BadRecordPolicy,
) -> TransferResult<Batch> {
    let mut prepared = Vec::with_capacity(items.len());

    for mut item in items {
        if let Err(err) = item.validate() {
            match policy {
                BadRecordPolicy::Skip => {
                    warn!("skipping malformed change item: {err}");
                    continue;
                }
                BadRecordPolicy::Abort => return Err(err),
            }
        }

        filters.apply(&mut item);
        prepared.push(item);
    }

    Ok(Batch::new(prepared))
}
