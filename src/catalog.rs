//! The fixed catalog of named SQL queries.
//!
//! The catalog is parsed once at startup from a TOML resource compiled into the
//! binary and is read-only afterwards. Labels keep their definition order.

use crate::error::{DashboardError, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// Catalog resource shipped with the binary.
const EMBEDDED_CATALOG: &str = include_str!("catalog.toml");

/// A single labelled query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryEntry {
    /// User-facing label, unique within the catalog.
    pub label: String,

    /// SQL statement sent verbatim to the database.
    pub text: String,
}

/// Raw shape of the catalog file.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    query: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    label: String,
    sql: String,
}

/// Immutable mapping from label to SQL text.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<QueryEntry>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Loads the catalog compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_toml(EMBEDDED_CATALOG)
    }

    /// Parses a catalog from TOML made of `[[query]]` tables with `label` and `sql` keys.
    ///
    /// Duplicate labels, blank labels and blank SQL are rejected so that every
    /// label shown to a user resolves to a statement. The SQL itself is not checked.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| DashboardError::config(format!("Invalid query catalog: {e}")))?;

        let mut entries = Vec::with_capacity(file.query.len());
        let mut index = HashMap::with_capacity(file.query.len());

        for raw in file.query {
            let RawEntry { label, sql: text } = raw;
            if label.trim().is_empty() {
                return Err(DashboardError::config(
                    "Invalid query catalog: entry with an empty label",
                ));
            }

            if text.trim().is_empty() {
                return Err(DashboardError::config(format!(
                    "Invalid query catalog: '{label}' has no SQL"
                )));
            }

            if index.insert(label.clone(), entries.len()).is_some() {
                return Err(DashboardError::config(format!(
                    "Invalid query catalog: duplicate label '{label}'"
                )));
            }

            entries.push(QueryEntry { label, text });
        }

        Ok(Self { entries, index })
    }

    /// Returns the labels in definition order.
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.label.as_str())
    }

    /// Returns the SQL text for a label.
    pub fn get_text(&self, label: &str) -> Result<&str> {
        self.index
            .get(label)
            .map(|&i| self.entries[i].text.as_str())
            .ok_or_else(|| DashboardError::not_found(label))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
