use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ErrorKind, TransferError, TransferResult};
use crate::transfer_error;
use crate::types::{Position, TableName};

/// A single cell value carried by a change item.
///
/// Providers convert their native types into this representation; destinations decide
/// how to encode it. Unknown source types should be mapped to [`Value::Bytes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Timestamp(DateTime<Utc>),
}

/// A named column with its value, in source column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnValue {
    pub name: String,
    pub value: Value,
}

impl ColumnValue {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Classification of a change item.
///
/// [`ChangeKind`] provides a lightweight way to identify what a change item represents
/// without inspecting its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Row emitted by the initial full-table copy.
    SnapshotInsert,
    /// Row insertion from the incremental stream.
    Insert,
    /// Row update from the incremental stream.
    Update,
    /// Row deletion from the incremental stream.
    Delete,
    /// Source control marker carrying no row data (e.g. a transaction boundary).
    Control,
}

impl ChangeKind {
    /// Returns `true` if items of this kind carry no row data.
    pub fn is_control(&self) -> bool {
        matches!(self, Self::Control)
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SnapshotInsert => write!(f, "snapshot_insert"),
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Control => write!(f, "control"),
        }
    }
}

/// The atomic unit of replicated data.
///
/// Within one source partition, change items are totally ordered by their position
/// marker; across partitions no ordering is guaranteed and destinations must not
/// assume any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeItem {
    /// Table this change belongs to.
    pub table: TableName,
    /// What this change represents.
    pub kind: ChangeKind,
    /// Column values after the change, in source column order.
    pub columns: Vec<ColumnValue>,
    /// Column values before the change, for updates and deletes.
    ///
    /// Depending on the source this may be the complete previous row or only its key
    /// columns.
    pub old_columns: Option<Vec<ColumnValue>>,
    /// Opaque source position marker of this change.
    pub position: Position,
}

impl ChangeItem {
    /// Checks that the item carries the payload its kind requires.
    ///
    /// Data-carrying kinds must name at least one column; deletes may instead carry
    /// only the previous row. Control markers are always valid. How a malformed item
    /// is handled is decided by the configured bad-record policy, not here.
    pub fn validate(&self) -> TransferResult<()> {
        let has_old_columns = self
            .old_columns
            .as_ref()
            .is_some_and(|columns| !columns.is_empty());

        match self.kind {
            ChangeKind::SnapshotInsert | ChangeKind::Insert | ChangeKind::Update
                if self.columns.is_empty() =>
            {
                Err(transfer_error!(
                    ErrorKind::InvalidData,
                    "Change item has no column values",
                    format!("{} item for table {} carries no columns", self.kind, self.table)
                ))
            }
            ChangeKind::Delete if self.columns.is_empty() && !has_old_columns => {
                Err(transfer_error!(
                    ErrorKind::InvalidData,
                    "Delete item has no identifying columns",
                    format!("delete item for table {} carries no columns", self.table)
                ))
            }
            _ => Ok(()),
        }
    }
}

/// An ordered sequence of change items delivered to the sink in one push.
///
/// A successful push implies that every member of the batch is durably accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    items: Vec<ChangeItem>,
}

impl Batch {
    pub fn new(items: Vec<ChangeItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ChangeItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<ChangeItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the greatest position carried by any item in the batch.
    pub fn max_position(&self) -> Option<Position> {
        self.items.iter().map(|item| item.position).max()
    }
}
