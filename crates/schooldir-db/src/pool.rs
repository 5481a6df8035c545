//! Database connection pool management.
//!
//! This module provides connection pooling for SQLite using r2d2.
//! It handles pool initialization, connection customization, and running migrations.
//! The pool is constructed once by the caller and handed to whoever needs it;
//! there is no process-wide instance.

use std::path::PathBuf;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use schooldir_common::{Error, Result};

use crate::error::from_pool;
use crate::migrations;

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Default number of pooled connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;

/// Where a `DATABASE_URL` points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// A private in-memory database.
    Memory,
    /// A database file on disk.
    File(PathBuf),
}

/// Parse a database URL.
///
/// Accepts `sqlite://path`, `sqlite:path`, a bare path, or `:memory:`
/// (optionally with the `sqlite:` prefix).
///
/// # Example
///
/// ```
/// use schooldir_db::pool::{parse_database_url, DatabaseLocation};
/// use std::path::PathBuf;
///
/// assert_eq!(
///     parse_database_url("sqlite://data/schools.db").unwrap(),
///     DatabaseLocation::File(PathBuf::from("data/schools.db"))
/// );
/// assert_eq!(parse_database_url("sqlite::memory:").unwrap(), DatabaseLocation::Memory);
/// ```
pub fn parse_database_url(url: &str) -> Result<DatabaseLocation> {
    let url = url.trim();
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);

    if path.is_empty() {
        return Err(Error::invalid_input(format!("Empty database path in URL: {url:?}")));
    }
    if path == ":memory:" {
        return Ok(DatabaseLocation::Memory);
    }
    if path.contains("://") {
        return Err(Error::invalid_input(format!(
            "Unsupported database URL scheme: {url:?}"
        )));
    }

    Ok(DatabaseLocation::File(PathBuf::from(path)))
}

/// Open a pool for a parsed database location.
pub fn open_pool(location: &DatabaseLocation, max_size: u32) -> Result<DbPool> {
    match location {
        DatabaseLocation::Memory => init_memory_pool(),
        DatabaseLocation::File(path) => init_pool(&path.to_string_lossy(), max_size),
    }
}

/// Initialize a new database pool with the given file path.
///
/// This function will:
/// - Create the SQLite database file if it doesn't exist
/// - Set up connection pooling with r2d2
/// - Enable WAL journaling and a busy timeout on all connections
/// - Run pending database migrations
///
/// # Arguments
///
/// * `db_path` - Path to the SQLite database file
/// * `max_size` - Maximum number of pooled connections
///
/// # Example
///
/// ```no_run
/// use schooldir_db::pool::init_pool;
///
/// let pool = init_pool("/var/lib/schooldir/db.sqlite", 4).unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_pool(db_path: &str, max_size: u32) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
    });

    let pool = Pool::builder()
        .max_size(max_size.max(1))
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create connection pool: {e}")))?;

    let conn = get_conn(&pool)?;
    migrations::run_migrations(&conn)
        .map_err(|e| Error::database(format!("Failed to run migrations: {e}")))?;

    Ok(pool)
}

/// Initialize an in-memory database pool (useful for tests).
///
/// Each call creates a uniquely-named shared-cache in-memory database so
/// that parallel tests do not interfere with each other, while all
/// connections *within* a single pool still share state.
pub fn init_memory_pool() -> Result<DbPool> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let uri = format!("file:schooldir_mem_{n}?mode=memory&cache=shared");

    let manager = SqliteConnectionManager::file(uri)
        .with_init(|conn| conn.execute_batch("PRAGMA busy_timeout = 5000;"));

    let pool = Pool::builder()
        .max_size(DEFAULT_MAX_CONNECTIONS)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create in-memory pool: {e}")))?;

    let conn = get_conn(&pool)?;
    migrations::run_migrations(&conn)
        .map_err(|e| Error::database(format!("Failed to run migrations: {e}")))?;

    Ok(pool)
}

/// Get a connection from the pool.
///
/// A checkout failure is reported as a connection error so callers going
/// through the executor retry it.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get().map_err(from_pool)
}
