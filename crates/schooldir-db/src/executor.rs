//! Pooled query execution with bounded retry.
//!
//! Every statement runs on a connection checked out of the shared pool for
//! the duration of one attempt. Transient failures (see
//! [`Error::is_transient`]) are retried with a linearly growing delay; all
//! other failures return immediately.

use std::sync::Arc;
use std::time::Duration;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use schooldir_common::{Error, Result};

use crate::error::from_sqlite;
use crate::pool::{get_conn, DbPool};

/// How many times, and how patiently, to retry transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; attempt `n` waits `n * base_delay`.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// A policy that retries without sleeping, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    /// Delay to wait after the given (1-based) failed attempt.
    ///
    /// Saturates at [`Duration::MAX`].
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.checked_mul(attempt).unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_BASE_DELAY)
    }
}

/// Runs parameterized statements against the pool.
#[derive(Clone)]
pub struct QueryExecutor {
    pool: DbPool,
    policy: RetryPolicy,
}

impl QueryExecutor {
    /// Create an executor with the default retry policy.
    pub fn new(pool: DbPool) -> Self {
        Self::with_policy(pool, RetryPolicy::default())
    }

    pub fn with_policy(pool: DbPool, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `op` on a pooled connection, retrying transient failures.
    ///
    /// `op` runs on the blocking thread pool and may be invoked up to
    /// `max_attempts` times. After the last attempt the most recent error is
    /// returned.
    pub async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: Fn(&Connection) -> Result<T> + Send + Sync + 'static,
        T: Send + 'static,
    {
        let op = Arc::new(op);
        let mut attempt = 1;

        loop {
            let pool = self.pool.clone();
            let op = Arc::clone(&op);
            let result = tokio::task::spawn_blocking(move || {
                let conn = get_conn(&pool)?;
                op(&conn)
            })
            .await
            .map_err(|e| Error::internal(format!("Query task failed: {e}")))?;

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient database error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Run a query template with positional parameters, mapping every row.
    pub async fn query<T, F>(
        &self,
        sql: impl Into<String>,
        params: Vec<Value>,
        map: F,
    ) -> Result<Vec<T>>
    where
        F: Fn(&Row<'_>) -> rusqlite::Result<T> + Send + Sync + 'static,
        T: Send + 'static,
    {
        let sql = sql.into();
        self.run(move |conn| {
            let mut stmt = conn.prepare_cached(&sql).map_err(from_sqlite)?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), &map)
                .map_err(from_sqlite)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(from_sqlite)?;
            Ok(rows)
        })
        .await
    }

    /// Run an INSERT template and return the new row id.
    pub async fn insert(&self, sql: impl Into<String>, params: Vec<Value>) -> Result<i64> {
        let sql = sql.into();
        self.run(move |conn| {
            conn.execute(&sql, params_from_iter(params.iter()))
                .map_err(from_sqlite)?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }
}
