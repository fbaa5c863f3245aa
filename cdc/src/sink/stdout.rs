use tracing::info;

use crate::error::TransferResult;
use crate::sink::base::Sinker;
use crate::types::Batch;

/// Destination that prints every change item as one JSON line on standard output.
#[derive(Debug, Clone, Default)]
pub struct StdoutSinker;

impl StdoutSinker {
    pub fn new() -> Self {
        Self
    }
}

impl Sinker for StdoutSinker {
    async fn push(&self, batch: Batch) -> TransferResult<()> {
        for item in batch.items() {
            let line = serde_json::to_string(item)?;
            println!("{line}");
        }

        Ok(())
    }

    async fn close(&self) -> TransferResult<()> {
        info!("stdout sinker closed");

        Ok(())
    }
}
