#![allow(dead_code)]

pub mod coordinator;
pub mod sink;
pub mod storage;
pub mod transfer;

use std::future::Future;
use std::time::Duration;

/// Polls `condition` until it returns `true` or the timeout expires.
///
/// Panics on timeout so that a stuck test fails with a clear message instead of
/// hanging until the harness deadline.
pub async fn wait_until<F, Fut>(description: &str, condition: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let result = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if condition().await {
                return;
            }

            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    if result.is_err() {
        panic!("timed out waiting for: {description}");
    }
}
