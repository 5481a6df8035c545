//! Internal Rust models matching the database schema.

use schooldir_common::RecordId;
use serde::{Deserialize, Serialize};

/// A stored school directory entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchoolRecord {
    pub id: RecordId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub contact: String,
    /// Local filename or remote URL of the school's picture.
    pub image: String,
    pub email: String,
}

/// Column values for a row about to be inserted.
///
/// `image` is the reference returned by the image store, so a `NewSchool`
/// only exists once the upload has succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSchool {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub contact: String,
    pub image: String,
    pub email: String,
}
