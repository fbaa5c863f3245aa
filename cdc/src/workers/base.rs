use std::future::Future;

use crate::error::TransferResult;

/// A trait for types that can be started as workers.
///
/// The generic parameter `H` represents the handle type that will be returned when the
/// worker starts, and `S` represents the state type that can be accessed through the
/// handle.
pub trait Worker<H, S>
where
    H: WorkerHandle<S>,
{
    /// Starts the worker and returns a future that resolves to a handle.
    ///
    /// The handle can be used to monitor and control the worker's execution.
    fn start(self) -> impl Future<Output = TransferResult<H>> + Send;
}

/// A handle to a running worker that provides access to its state and completion
/// status.
///
/// The generic parameter `S` represents the type of state that can be accessed through
/// this handle.
pub trait WorkerHandle<S> {
    /// Returns the current state of the worker.
    ///
    /// The state is shared and not tied to the handle's lifetime: it stays readable
    /// after the worker completed.
    fn state(&self) -> S;

    /// Returns a future that resolves when the worker completes.
    ///
    /// The future resolves to a [`TransferResult`] indicating whether the worker
    /// completed successfully or encountered an error.
    fn wait(self) -> impl Future<Output = TransferResult<()>> + Send;
}
