pub mod concurrency;
pub mod coordinator;
pub mod error;
mod macros;
pub mod replication;
pub mod sink;
pub mod storage;
pub mod supervisor;
pub mod types;
pub mod workers;
