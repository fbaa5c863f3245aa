use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::TransferResult;
use crate::sink::base::Sinker;
use crate::types::{Batch, ChangeItem};

#[derive(Debug)]
struct Inner {
    batches: Vec<Batch>,
    closed: bool,
}

/// In-memory destination for ephemeral or test data.
#[derive(Debug, Clone)]
pub struct MemorySinker {
    inner: Arc<Mutex<Inner>>,
}

impl MemorySinker {
    pub fn new() -> Self {
        let inner = Inner {
            batches: Vec::new(),
            closed: false,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Returns all pushed batches in delivery order.
    pub async fn batches(&self) -> Vec<Batch> {
        let inner = self.inner.lock().await;
        inner.batches.clone()
    }

    /// Returns all pushed items, flattened in delivery order.
    pub async fn items(&self) -> Vec<ChangeItem> {
        let inner = self.inner.lock().await;
        inner
            .batches
            .iter()
            .flat_map(|batch| batch.items().iter().cloned())
            .collect()
    }

    pub async fn is_closed(&self) -> bool {
        let inner = self.inner.lock().await;
        inner.closed
    }
}

impl Default for MemorySinker {
    fn default() -> Self {
        Self::new()
    }
}

impl Sinker for MemorySinker {
    async fn push(&self, batch: Batch) -> TransferResult<()> {
        let mut inner = self.inner.lock().await;
        info!("writing a batch of {} change items", batch.len());
        inner.batches.push(batch);

        Ok(())
    }

    async fn close(&self) -> TransferResult<()> {
        let mut inner = self.inner.lock().await;
        inner.closed = true;

        Ok(())
    }
}
