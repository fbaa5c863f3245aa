use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, monotonically comparable marker of progress through a source's change stream.
///
/// A committed [`Position`] means that all changes up to and including the marker have
/// been durably delivered to the destination. Providers map their own notion of
/// progress (a log sequence number, a binlog offset) onto it; the core only ever
/// compares positions and never interprets the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position(u64);

impl Position {
    /// The position before any change has been observed.
    pub const ZERO: Position = Position(0);

    /// Creates a position from a provider-specific raw value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the provider-specific raw value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Position {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
