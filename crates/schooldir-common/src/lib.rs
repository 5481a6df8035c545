//! Schooldir-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across schooldir:
//!
//! - **Typed IDs**: `RecordId` wrapper around the store-assigned row id
//! - **Core Types**: accepted image formats and their content types
//! - **Path Utilities**: upload naming and image reference resolution
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use schooldir_common::{Error, ImageFormat, RecordId, Result};
//! use schooldir_common::paths::resolve_image_url;
//!
//! let id = RecordId::from(7);
//! assert_eq!(id.to_string(), "7");
//!
//! assert_eq!(ImageFormat::from_content_type("image/png"), Some(ImageFormat::Png));
//! assert_eq!(resolve_image_url("a.png", "/schoolImages"), "/schoolImages/a.png");
//!
//! fn example() -> Result<()> {
//!     Err(Error::storage("bucket unreachable"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
