//! Mapping of rusqlite and r2d2 failures onto the common error type.
//!
//! The split between [`Error::Connection`] and the other variants decides
//! what the query executor retries.

use rusqlite::ErrorCode;
use schooldir_common::Error;

/// Classify a rusqlite error.
///
/// Busy/locked databases and files that cannot be opened are connection-class
/// (retryable); constraint failures are reported as such; everything else is a
/// plain database error.
pub fn from_sqlite(e: rusqlite::Error) -> Error {
    match &e {
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen => {
                Error::connection(e.to_string())
            }
            ErrorCode::ConstraintViolation => Error::constraint(e.to_string()),
            _ => Error::database(e.to_string()),
        },
        _ => Error::database(e.to_string()),
    }
}

/// A pool checkout failure means no connection could be established in time.
pub fn from_pool(e: r2d2::Error) -> Error {
    Error::connection(format!("Failed to get connection from pool: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    fn failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), None)
    }

    #[test]
    fn busy_and_locked_are_transient() {
        assert!(from_sqlite(failure(ffi::SQLITE_BUSY)).is_transient());
        assert!(from_sqlite(failure(ffi::SQLITE_LOCKED)).is_transient());
        assert!(from_sqlite(failure(ffi::SQLITE_CANTOPEN)).is_transient());
    }

    #[test]
    fn constraint_is_not_transient() {
        let err = from_sqlite(failure(ffi::SQLITE_CONSTRAINT));
        assert!(matches!(err, Error::Constraint(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn other_errors_are_database_errors() {
        let err = from_sqlite(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, Error::Database(_)));
        assert!(!err.is_transient());
    }
}
