//! Schooldir - School directory service
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod images;
pub mod server;
pub mod service;
pub mod validation;
