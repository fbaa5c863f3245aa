use std::error;
use std::fmt;

/// Convenient result type for replication operations using [`TransferError`] as the error type.
///
/// This type alias reduces boilerplate when working with fallible replication operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// Main error type for replication operations.
///
/// [`TransferError`] provides an error system that can represent single errors, errors
/// with additional detail, or multiple aggregated errors. Every error carries an
/// [`ErrorKind`] which is the only thing the supervisor inspects to decide between
/// restarting a worker and terminating the service.
#[derive(Debug, Clone)]
pub struct TransferError {
    repr: ErrorRepr,
}

/// Internal representation of error data.
///
/// This enum supports different error patterns while maintaining a unified interface.
/// Users should not interact with this type directly but use [`TransferError`] methods instead.
#[derive(Debug, Clone)]
enum ErrorRepr {
    /// Error with kind and static description
    WithDescription(ErrorKind, &'static str),
    /// Error with kind, static description, and dynamic detail
    WithDescriptionAndDetail(ErrorKind, &'static str, String),
    /// Multiple aggregated errors
    Many(Vec<TransferError>),
}

/// Specific categories of errors that can occur during replication.
///
/// Error kinds are organized by functional area and failure mode. The kind, not the
/// message, determines whether an error is fatal (see [`ErrorKind::is_fatal`]).
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    // Connection errors
    SourceConnectionFailed,
    DestinationConnectionFailed,

    // Query & execution errors
    SourceQueryFailed,
    SourceOperationCanceled,

    // Schema errors
    SourceSchemaError,

    // Destination errors
    DestinationWriteFailed,
    DestinationRejected,

    // Checkpoint errors
    CoordinatorUnavailable,

    // Data errors
    ConversionError,
    InvalidData,
    ValidationError,

    // Configuration errors
    ConfigError,

    // IO & serialization errors
    IoError,
    SerializationError,
    DeserializationError,

    // Security & authentication errors
    AuthenticationError,
    PermissionDenied,

    // State & workflow errors
    InvalidState,
    WorkerPanic,

    // Unknown / uncategorized
    Unknown,
}

impl ErrorKind {
    /// Returns `true` if errors of this kind are unrecoverable.
    ///
    /// A fatal error terminates the supervisor loop instead of triggering a worker
    /// restart: the transfer cannot make progress no matter how often it is retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SourceSchemaError
                | Self::DestinationRejected
                | Self::ConfigError
                | Self::AuthenticationError
                | Self::PermissionDenied
        )
    }
}

impl TransferError {
    /// Creates a [`TransferError`] containing multiple aggregated errors.
    ///
    /// This is useful when multiple operations fail and you want to report all failures
    /// rather than just the first one.
    pub fn many(errors: Vec<TransferError>) -> TransferError {
        TransferError {
            repr: ErrorRepr::Many(errors),
        }
    }

    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For multiple errors, returns the kind of the first error or [`ErrorKind::Unknown`]
    /// if the error list is empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::WithDescription(kind, _)
            | ErrorRepr::WithDescriptionAndDetail(kind, _, _) => kind,
            ErrorRepr::Many(ref errors) => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error.
    ///
    /// For single errors, returns a vector with one element. For multiple errors,
    /// returns a flattened vector of all error kinds.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::WithDescription(kind, _)
            | ErrorRepr::WithDescriptionAndDetail(kind, _, _) => vec![kind],
            ErrorRepr::Many(ref errors) => errors
                .iter()
                .flat_map(|err| err.kinds())
                .collect::<Vec<_>>(),
        }
    }

    /// Returns `true` if this error should terminate the supervisor loop.
    ///
    /// An aggregated error is fatal if any of its members is fatal.
    pub fn is_fatal(&self) -> bool {
        self.kinds().iter().any(ErrorKind::is_fatal)
    }

    /// Returns the detailed error information if available.
    ///
    /// For multiple errors, returns the detail of the first error that has one.
    /// Returns [`None`] if no detailed information is available.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::WithDescriptionAndDetail(_, _, ref detail) => Some(detail.as_str()),
            ErrorRepr::Many(ref errors) => errors.iter().find_map(|e| e.detail()),
            _ => None,
        }
    }
}

impl PartialEq for TransferError {
    fn eq(&self, other: &TransferError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::WithDescription(kind_a, _), ErrorRepr::WithDescription(kind_b, _)) => {
                kind_a == kind_b
            }
            (
                ErrorRepr::WithDescriptionAndDetail(kind_a, _, _),
                ErrorRepr::WithDescriptionAndDetail(kind_b, _, _),
            ) => kind_a == kind_b,
            (ErrorRepr::Many(errors_a), ErrorRepr::Many(errors_b)) => {
                errors_a.len() == errors_b.len()
                    && errors_a.iter().zip(errors_b.iter()).all(|(a, b)| a == b)
            }
            _ => false,
        }
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self.repr {
            ErrorRepr::WithDescription(kind, desc) => {
                fmt::Debug::fmt(&kind, f)?;
                f.write_str(": ")?;
                desc.fmt(f)?;

                Ok(())
            }
            ErrorRepr::WithDescriptionAndDetail(kind, desc, ref detail) => {
                fmt::Debug::fmt(&kind, f)?;
                f.write_str(": ")?;
                desc.fmt(f)?;
                f.write_str(" -> ")?;
                detail.fmt(f)?;

                Ok(())
            }
            ErrorRepr::Many(ref errors) => {
                if errors.is_empty() {
                    write!(f, "Multiple errors occurred (empty)")?;
                } else if errors.len() == 1 {
                    // If there's only one error, just display it directly
                    errors[0].fmt(f)?;
                } else {
                    write!(f, "Multiple errors occurred ({} total):", errors.len())?;
                    for (i, error) in errors.iter().enumerate() {
                        write!(f, "\n  {}: {}", i + 1, error)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl error::Error for TransferError {}

/// Creates a [`TransferError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for TransferError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> TransferError {
        TransferError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

/// Creates a [`TransferError`] from an error kind, static description, and dynamic detail.
impl From<(ErrorKind, &'static str, String)> for TransferError {
    fn from((kind, desc, detail): (ErrorKind, &'static str, String)) -> TransferError {
        TransferError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, desc, detail),
        }
    }
}

/// Creates a [`TransferError`] from a vector of errors for aggregation.
impl<E> From<Vec<E>> for TransferError
where
    E: Into<TransferError>,
{
    fn from(errors: Vec<E>) -> TransferError {
        TransferError {
            repr: ErrorRepr::Many(errors.into_iter().map(Into::into).collect()),
        }
    }
}

/// Converts [`std::io::Error`] to [`TransferError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for TransferError {
    fn from(err: std::io::Error) -> TransferError {
        TransferError {
            repr: ErrorRepr::WithDescriptionAndDetail(
                ErrorKind::IoError,
                "I/O error occurred",
                err.to_string(),
            ),
        }
    }
}

/// Converts [`serde_json::Error`] to [`TransferError`] with appropriate error kind.
///
/// Maps to [`ErrorKind::SerializationError`] for serialization failures and
/// [`ErrorKind::DeserializationError`] for deserialization failures based on error
/// classification.
impl From<serde_json::Error> for TransferError {
    fn from(err: serde_json::Error) -> TransferError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        TransferError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, description, err.to_string()),
        }
    }
}
