use cdc_config::shared::TableConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fully qualified identity of a replicable table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableName {
    /// Schema the table belongs to.
    pub schema: String,
    /// Table name within the schema.
    pub name: String,
}

impl TableName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// A unit of snapshot work: a table plus an optional provider-interpreted row filter.
///
/// The row filter travels opaque through the core; the storage provider applies it when
/// reading the table, both during the snapshot and when deciding which incremental
/// changes belong to the transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    pub name: TableName,
    pub row_filter: Option<String>,
}

impl TableDescription {
    pub fn new(name: TableName) -> Self {
        Self {
            name,
            row_filter: None,
        }
    }
}

impl From<&TableConfig> for TableDescription {
    fn from(config: &TableConfig) -> Self {
        Self {
            name: TableName::new(config.schema.clone(), config.name.clone()),
            row_filter: config.row_filter.clone(),
        }
    }
}

/// A [`TableDescription`] refined with a partition predicate.
///
/// Table queries enable chunked, resumable snapshot loading of one table: the union of
/// the rows produced by all chunks of a table equals the rows of a single full pass.
/// Ordering across chunks is unspecified; ordering within a chunk is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    pub table: TableDescription,
    /// Provider-interpreted predicate selecting this chunk of the table.
    pub predicate: String,
}

impl TableQuery {
    pub fn new(table: TableDescription, predicate: impl Into<String>) -> Self {
        Self {
            table,
            predicate: predicate.into(),
        }
    }
}
