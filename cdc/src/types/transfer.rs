/// Unique identifier for a replication transfer.
///
/// [`TransferId`] provides a simple numeric identifier to distinguish between multiple
/// transfers sharing a coordinator. This id is used for logging, monitoring, and as the
/// key under which checkpoint state is persisted.
pub type TransferId = u64;
