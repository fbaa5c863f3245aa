pub mod base;
pub mod memory;
pub mod stdout;

pub use base::Sinker;
