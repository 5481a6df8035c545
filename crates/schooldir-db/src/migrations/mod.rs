//! Embedded schema steps, tracked with SQLite's `user_version` pragma.
//!
//! Step `n` (1-based) in [`STEPS`] brings the schema to version `n`. A
//! database at version `v` gets steps `v+1..` applied, each in its own
//! transaction together with the version bump.

use rusqlite::Connection;

const STEPS: &[&str] = &[include_str!("001_initial.sql")];

/// Version a fully migrated database reports.
pub fn latest_version() -> u32 {
    STEPS.len() as u32
}

/// Current `user_version` of the database.
pub fn schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

/// Bring the schema up to [`latest_version`]; returns how many steps ran.
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<u32> {
    let from = schema_version(conn)?;

    for (version, sql) in (1u32..).zip(STEPS).skip(from as usize) {
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
        tracing::info!(version, "Applied schema step");
    }

    Ok(latest_version().saturating_sub(from))
}
