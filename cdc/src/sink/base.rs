use std::future::Future;

use crate::error::TransferResult;
use crate::types::Batch;

/// Contract implemented by every destination provider.
///
/// A sinker instance is owned exclusively by one worker for the duration of one run
/// and is not shared.
pub trait Sinker {
    /// Delivers one batch of change items.
    ///
    /// Must be atomic from the caller's point of view: either the whole batch is
    /// durably accepted (success) or none of it is assumed accepted (error), even if
    /// partial writes occurred downstream. May block to apply destination
    /// backpressure.
    fn push(&self, batch: Batch) -> impl Future<Output = TransferResult<()>> + Send;

    /// Releases resources held by the sinker.
    ///
    /// Idempotent; called exactly once at worker teardown.
    fn close(&self) -> impl Future<Output = TransferResult<()>> + Send;
}
