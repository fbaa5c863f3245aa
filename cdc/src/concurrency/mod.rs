pub mod shutdown;
pub mod signal;
pub mod stream;
