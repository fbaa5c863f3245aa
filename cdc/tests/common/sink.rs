use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};

use cdc::error::{TransferError, TransferResult};
use cdc::sink::Sinker;
use cdc::types::{Batch, ChangeItem};

type ItemsCondition = Box<dyn Fn(&[ChangeItem]) -> bool + Send + Sync>;

struct Inner<K> {
    wrapped_sinker: K,
    items: Vec<ChangeItem>,
    push_attempts: u64,
    close_calls: u64,
    scripted_failures: HashMap<u64, TransferError>,
    conditions: Vec<(ItemsCondition, Arc<Notify>)>,
}

impl<K> Inner<K> {
    fn check_conditions(&mut self) {
        let items = self.items.clone();
        self.conditions.retain(|(condition, notify)| {
            let should_retain = !condition(&items);
            if !should_retain {
                notify.notify_one();
            }
            should_retain
        });
    }
}

/// A test wrapper that can wrap any sinker, track delivered items, and inject push
/// failures.
#[derive(Clone)]
pub struct TestSinkWrapper<K> {
    inner: Arc<RwLock<Inner<K>>>,
}

impl<K> TestSinkWrapper<K> {
    pub fn wrap(sinker: K) -> Self {
        let inner = Inner {
            wrapped_sinker: sinker,
            items: Vec::new(),
            push_attempts: 0,
            close_calls: 0,
            scripted_failures: HashMap::new(),
            conditions: Vec::new(),
        };

        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// All successfully delivered items, flattened in delivery order.
    pub async fn items(&self) -> Vec<ChangeItem> {
        self.inner.read().await.items.clone()
    }

    pub async fn push_attempts(&self) -> u64 {
        self.inner.read().await.push_attempts
    }

    pub async fn close_calls(&self) -> u64 {
        self.inner.read().await.close_calls
    }

    /// Makes the next push attempt return `error` instead of delivering.
    pub async fn fail_next_push(&self, error: TransferError) {
        let mut inner = self.inner.write().await;
        let next_attempt = inner.push_attempts + 1;
        inner.scripted_failures.insert(next_attempt, error);
    }

    /// Makes push attempt number `attempt` (1-based, over the wrapper's lifetime)
    /// return `error` instead of delivering.
    pub async fn fail_on_attempt(&self, attempt: u64, error: TransferError) {
        let mut inner = self.inner.write().await;
        inner.scripted_failures.insert(attempt, error);
    }

    /// Returns a notify that fires once the delivered items satisfy `condition`.
    pub async fn notify_on_items<F>(&self, condition: F) -> Arc<Notify>
    where
        F: Fn(&[ChangeItem]) -> bool + Send + Sync + 'static,
    {
        let notify = Arc::new(Notify::new());
        let mut inner = self.inner.write().await;
        inner.conditions.push((Box::new(condition), notify.clone()));

        // The condition may already hold, in which case the notification would
        // otherwise never fire.
        inner.check_conditions();

        notify
    }

    /// Returns a notify that fires once `count` items have been delivered.
    pub async fn wait_for_items_count(&self, count: usize) -> Arc<Notify> {
        self.notify_on_items(move |items| items.len() >= count).await
    }
}

impl<K: Sinker + Send + Sync + Clone> Sinker for TestSinkWrapper<K> {
    async fn push(&self, batch: Batch) -> TransferResult<()> {
        let (sinker, scripted_failure) = {
            let mut inner = self.inner.write().await;
            inner.push_attempts += 1;

            let attempt = inner.push_attempts;

            (
                inner.wrapped_sinker.clone(),
                inner.scripted_failures.remove(&attempt),
            )
        };

        if let Some(error) = scripted_failure {
            return Err(error);
        }

        let result = sinker.push(batch.clone()).await;

        {
            let mut inner = self.inner.write().await;
            if result.is_ok() {
                inner.items.extend(batch.into_items());
            }

            inner.check_conditions();
        }

        result
    }

    async fn close(&self) -> TransferResult<()> {
        let sinker = {
            let mut inner = self.inner.write().await;
            inner.close_calls += 1;

            inner.wrapped_sinker.clone()
        };

        sinker.close().await
    }
}
