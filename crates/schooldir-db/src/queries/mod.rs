//! Database query modules.
//!
//! Query templates and builders are kept apart from execution: every
//! function here produces SQL plus positional parameters, and
//! [`crate::executor::QueryExecutor`] runs them against the pool.
//!
//! - schools: school record lookup, insert, filtered listing, and facets

pub mod schools;
