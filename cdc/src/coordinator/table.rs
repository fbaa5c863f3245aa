use std::fmt;

/// Snapshot progress of one table, persisted by the coordinator per transfer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TableSnapshotPhase {
    /// Set when the transfer first encounters the table. No rows copied yet.
    Pending,

    /// Set just before the table copy starts and after each completed chunk.
    ///
    /// `chunks_done` counts fully delivered partitions of the table, so a restarted
    /// worker resumes from the first unfinished chunk. For unpartitioned tables the
    /// count stays at zero and the whole copy is redone on restart.
    Copying {
        chunks_done: u32,
    },

    /// Set when the full table copy has been delivered to the sink. Tables in this
    /// phase are never copied again; their changes flow through the incremental phase
    /// only.
    Done,
}

impl TableSnapshotPhase {
    /// Returns `true` if the table needs no further snapshot work.
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for TableSnapshotPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Copying { chunks_done } => write!(f, "copying({chunks_done})"),
            Self::Done => write!(f, "done"),
        }
    }
}
