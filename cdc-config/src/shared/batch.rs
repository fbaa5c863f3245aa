use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Batch processing configuration for transfers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BatchConfig {
    /// Maximum number of items in a batch for table copy and change streaming.
    pub max_size: usize,
    /// Maximum time, in milliseconds, to wait for a batch to fill before pushing it.
    pub max_fill_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            max_fill_ms: 1000,
        }
    }
}

impl BatchConfig {
    /// Validates the batch configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_size == 0 {
            return Err(ValidationError::InvalidBatch(
                "max_size must be greater than 0".to_string(),
            ));
        }
        if self.max_fill_ms == 0 {
            return Err(ValidationError::InvalidBatch(
                "max_fill_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
