use serde::{Deserialize, Serialize};

use crate::SerializableSecretString;
use crate::shared::ValidationError;

/// Configuration for the source side of a transfer.
///
/// The connection string is opaque to the core engine and interpreted by the concrete
/// storage provider; the table list drives the snapshot phase and the filters applied
/// before batching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceConfig {
    /// Provider-specific connection string. Sensitive and redacted in debug output.
    pub connection: Option<SerializableSecretString>,
    /// Tables replicated by this transfer.
    pub tables: Vec<TableConfig>,
}

impl SourceConfig {
    /// Validates the [`SourceConfig`].
    ///
    /// Checks that every table carries a schema and a name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for table in &self.tables {
            if table.schema.is_empty() || table.name.is_empty() {
                return Err(ValidationError::InvalidSource(
                    "table entries must have a non-empty schema and name".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// A single replicated table with its optional filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TableConfig {
    /// Schema the table belongs to.
    pub schema: String,
    /// Table name within the schema.
    pub name: String,
    /// Provider-interpreted row predicate restricting which rows are replicated.
    pub row_filter: Option<String>,
    /// Column allow-list applied by the worker before batching. `None` keeps all columns.
    pub columns: Option<Vec<String>>,
}
