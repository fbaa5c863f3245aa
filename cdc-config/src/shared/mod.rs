mod base;
mod batch;
mod destination;
mod restart;
mod source;
mod transfer;

pub use base::*;
pub use batch::*;
pub use destination::*;
pub use restart::*;
pub use source::*;
pub use transfer::*;
