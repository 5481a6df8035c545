//! School record queries.
//!
//! This module provides the SQL templates for the `schools` table and the
//! builder for the filtered listing query.

use rusqlite::types::Value;
use schooldir_common::RecordId;
use serde::{Deserialize, Serialize};

use crate::models::{NewSchool, SchoolRecord};

/// Columns selected for a full [`SchoolRecord`], in [`parse_school_row`] order.
const SELECT_COLUMNS: &str = "id, name, address, city, state, contact, image, email";

/// Find the id of a school with the given name and city (case-insensitive).
pub const FIND_BY_NAME_CITY: &str =
    "SELECT id FROM schools WHERE name = ?1 COLLATE NOCASE AND city = ?2 COLLATE NOCASE LIMIT 1";

/// Insert a school; parameters come from [`insert_params`].
pub const INSERT_SCHOOL: &str =
    "INSERT INTO schools (name, address, city, state, contact, image, email)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

/// Fetch one school by id.
pub const SELECT_BY_ID: &str =
    "SELECT id, name, address, city, state, contact, image, email FROM schools WHERE id = ?1";

/// Distinct non-empty states, ascending.
pub const DISTINCT_STATES: &str =
    "SELECT DISTINCT state FROM schools WHERE state IS NOT NULL AND state != '' ORDER BY state";

/// Distinct non-empty cities, ascending.
pub const DISTINCT_CITIES: &str =
    "SELECT DISTINCT city FROM schools WHERE city IS NOT NULL AND city != '' ORDER BY city";

/// Optional constraints for listing schools.
///
/// `state` and `city` match exactly; `search` matches as a substring of name,
/// city, state, or address. Present constraints are combined with AND. Blank
/// values are treated as absent.
///
/// Search case folding is ASCII-only (SQLite `LIKE` without ICU): `oak`
/// finds `Oak Hill`, but `ñ` does not find `Ñ`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

impl RecordFilter {
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

/// Trimmed, non-empty value of an optional filter field.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'`.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Build the listing query for a filter.
///
/// Results are ordered newest first (`id DESC`).
pub fn build_list_query(filter: &RecordFilter) -> (String, Vec<Value>) {
    let mut query = format!("SELECT {SELECT_COLUMNS} FROM schools WHERE 1=1");
    let mut params: Vec<Value> = Vec::new();

    if let Some(state) = present(&filter.state) {
        query.push_str(" AND state = ?");
        params.push(Value::from(state.to_string()));
    }

    if let Some(city) = present(&filter.city) {
        query.push_str(" AND city = ?");
        params.push(Value::from(city.to_string()));
    }

    if let Some(search) = present(&filter.search) {
        // LIKE folds ASCII case only; other characters match as written.
        query.push_str(
            " AND (name LIKE ? ESCAPE '\\' OR city LIKE ? ESCAPE '\\' \
             OR state LIKE ? ESCAPE '\\' OR address LIKE ? ESCAPE '\\')",
        );
        let pattern = format!("%{}%", escape_like(search));
        for _ in 0..4 {
            params.push(Value::from(pattern.clone()));
        }
    }

    query.push_str(" ORDER BY id DESC");
    (query, params)
}

/// Parameters for [`INSERT_SCHOOL`].
pub fn insert_params(school: &NewSchool) -> Vec<Value> {
    vec![
        Value::from(school.name.clone()),
        Value::from(school.address.clone()),
        Value::from(school.city.clone()),
        Value::from(school.state.clone()),
        Value::from(school.contact.clone()),
        Value::from(school.image.clone()),
        Value::from(school.email.clone()),
    ]
}

/// Parameters for [`FIND_BY_NAME_CITY`].
pub fn name_city_params(name: &str, city: &str) -> Vec<Value> {
    vec![Value::from(name.to_string()), Value::from(city.to_string())]
}

/// Parse a school from a database row.
///
/// Expects columns in order: id, name, address, city, state, contact, image, email.
pub fn parse_school_row(row: &rusqlite::Row) -> rusqlite::Result<SchoolRecord> {
    Ok(SchoolRecord {
        id: RecordId::from(row.get::<_, i64>(0)?),
        name: row.get(1)?,
        address: row.get(2)?,
        city: row.get(3)?,
        state: row.get(4)?,
        contact: row.get(5)?,
        image: row.get(6)?,
        email: row.get(7)?,
    })
}

/// Read a single text column.
pub fn parse_text_column(row: &rusqlite::Row) -> rusqlite::Result<String> {
    row.get(0)
}

/// Read a single id column.
pub fn parse_id_column(row: &rusqlite::Row) -> rusqlite::Result<RecordId> {
    Ok(RecordId::from(row.get::<_, i64>(0)?))
}
