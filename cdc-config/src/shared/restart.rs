use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Backoff configuration for the supervisor restart loop.
///
/// The supervisor restarts a failed worker indefinitely; these values only shape the
/// delay between consecutive restarts.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RestartConfig {
    /// Initial delay, in milliseconds, before the first restart.
    pub initial_delay_ms: u64,

    /// Maximum delay between restarts.
    pub max_delay_ms: u64,

    /// Exponential backoff multiplier applied to the delay after each failed run.
    pub backoff_factor: f32,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_factor: 2.0,
        }
    }
}

impl RestartConfig {
    /// Validates the restart configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backoff_factor < 1.0 {
            return Err(ValidationError::InvalidRestart(
                "backoff_factor must be at least 1.0".to_string(),
            ));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(ValidationError::InvalidRestart(
                "max_delay_ms must not be smaller than initial_delay_ms".to_string(),
            ));
        }

        Ok(())
    }
}
