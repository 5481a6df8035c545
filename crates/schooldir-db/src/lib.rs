//! Schooldir-DB: Database schema, migrations, and query operations
//!
//! This crate provides database functionality for schooldir using SQLite
//! with rusqlite and r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `executor` - Pooled query execution with transient-error retry
//! - `models` - Rust models matching database schema
//! - `queries` - Query templates and builders
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> schooldir_common::Result<()> {
//! use schooldir_db::executor::QueryExecutor;
//! use schooldir_db::pool::init_pool;
//! use schooldir_db::queries::schools::{self, RecordFilter};
//!
//! let pool = init_pool("/var/lib/schooldir/db.sqlite", 4)?;
//! let executor = QueryExecutor::new(pool);
//!
//! let (sql, params) = schools::build_list_query(&RecordFilter::default());
//! let rows = executor.query(sql, params, schools::parse_school_row).await?;
//! println!("{} schools", rows.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod executor;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
