//! Common error types used throughout schooldir.
//!
//! This module provides a unified error type covering database, connection,
//! storage and I/O failures. Connection-class failures are the only ones the
//! query executor retries; see [`Error::is_transient`].

use std::io::ErrorKind;

/// Common error type for schooldir.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// A connection-class failure that may succeed on retry.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A statement was rejected by a schema constraint.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Persisting or removing an uploaded image failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new Connection error.
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a new Constraint error.
    pub fn constraint<S: Into<String>>(msg: S) -> Self {
        Self::Constraint(msg.into())
    }

    /// Create a new Storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether retrying the failed operation may succeed.
    ///
    /// True for [`Error::Connection`] and for I/O errors of a network kind
    /// (reset, timeout, refused, unreachable).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Io(e) => is_transient_io_kind(e.kind()),
            _ => false,
        }
    }
}

/// Network-class I/O error kinds that are worth retrying.
pub fn is_transient_io_kind(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::ConnectionRefused
            | ErrorKind::NotConnected
            | ErrorKind::TimedOut
            | ErrorKind::HostUnreachable
            | ErrorKind::NetworkUnreachable
    )
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::database("no such table: schools");
        assert_eq!(err.to_string(), "Database error: no such table: schools");

        let err = Error::connection("pool timed out");
        assert_eq!(err.to_string(), "Connection error: pool timed out");

        let err = Error::constraint("UNIQUE constraint failed");
        assert_eq!(err.to_string(), "Constraint violation: UNIQUE constraint failed");

        let err = Error::storage("upload rejected");
        assert_eq!(err.to_string(), "Storage error: upload rejected");

        let err = Error::invalid_input("bad format");
        assert_eq!(err.to_string(), "Invalid input: bad format");

        let err = Error::internal("unexpected state");
        assert_eq!(err.to_string(), "Internal error: unexpected state");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::connection("reset").is_transient());
        assert!(Error::from(std::io::Error::from(ErrorKind::ConnectionReset)).is_transient());
        assert!(Error::from(std::io::Error::from(ErrorKind::TimedOut)).is_transient());
        assert!(Error::from(std::io::Error::from(ErrorKind::ConnectionRefused)).is_transient());

        assert!(!Error::constraint("UNIQUE").is_transient());
        assert!(!Error::database("syntax error").is_transient());
        assert!(!Error::storage("disk full").is_transient());
        assert!(!Error::from(std::io::Error::from(ErrorKind::PermissionDenied)).is_transient());
    }
}
