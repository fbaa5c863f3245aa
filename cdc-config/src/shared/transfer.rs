use serde::{Deserialize, Serialize};

use crate::shared::{
    BatchConfig, DestinationConfig, RestartConfig, SourceConfig, ValidationError,
};

/// Policy applied to malformed change records encountered while batching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadRecordPolicy {
    /// Log the record and drop it from the batch.
    #[default]
    Skip,
    /// Fail the current run. The failure is retryable, never fatal.
    Abort,
}

/// Descriptor for one replication transfer.
///
/// A [`TransferConfig`] is immutable for the lifetime of a worker run. It determines
/// isolation between transfers in terms of checkpoint state, keyed by its id.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransferConfig {
    /// The unique identifier for this transfer.
    pub id: u64,
    /// Source side of the transfer.
    pub source: SourceConfig,
    /// Destination side of the transfer.
    #[serde(default)]
    pub destination: DestinationConfig,
    /// Batch processing configuration.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Supervisor restart backoff configuration.
    #[serde(default)]
    pub restart: RestartConfig,
    /// Policy for malformed change records.
    #[serde(default)]
    pub bad_records: BadRecordPolicy,
    /// Whether the worker drops incremental items at or below the committed position.
    ///
    /// Keeping this enabled bounds redelivery after a restart to the single in-flight
    /// batch even when the source replays an arbitrary window behind the checkpoint.
    #[serde(default = "default_drop_stale_on_resume")]
    pub drop_stale_on_resume: bool,
}

fn default_drop_stale_on_resume() -> bool {
    true
}

impl TransferConfig {
    /// Validates the [`TransferConfig`] and all its nested sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.source.validate()?;
        self.batch.validate()?;
        self.restart.validate()?;

        Ok(())
    }
}
