use serde::{Deserialize, Serialize};

/// Configuration options for supported data destinations.
///
/// This enum is used to specify the destination type and its configuration for the
/// replicator. Variants correspond to different supported destinations; concrete
/// provider sinks plug in through the core `Sinker` contract.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationConfig {
    /// In-memory destination for ephemeral or test data.
    #[default]
    Memory,
    /// Destination that prints batches as JSON lines on standard output.
    Stdout,
}
