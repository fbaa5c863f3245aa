//! Macros for replication error handling.
//!
//! Provides convenience macros for creating and returning [`crate::error::TransferError`]
//! instances with reduced boilerplate for common error handling patterns.

/// Creates a [`crate::error::TransferError`] from error kind and description.
///
/// This macro provides a concise way to create [`crate::error::TransferError`] instances
/// with either static descriptions or additional dynamic detail information.
#[macro_export]
macro_rules! transfer_error {
    ($kind:expr, $desc:expr) => {
        TransferError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        TransferError::from(($kind, $desc, $detail.to_string()))
    };
}

/// Creates and returns a [`crate::error::TransferError`] from the current function.
///
/// This macro combines error creation with early return, reducing boilerplate
/// when handling error conditions that should immediately terminate execution.
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return Err($crate::transfer_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return Err($crate::transfer_error!($kind, $desc, $detail))
    };
}
