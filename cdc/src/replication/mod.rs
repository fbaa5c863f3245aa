pub mod common;
pub mod filter;
pub mod incremental;
pub mod snapshot;
