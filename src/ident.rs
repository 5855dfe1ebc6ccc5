//! Row identifier resolution.
//!
//! Backend rows carry their identifier under varying fields: a `uuid`, a
//! plain `id`, or a domain field like `invoice_id`. Actions that mutate or
//! export rows need one concrete identifier per row, so resolution is an
//! explicit fallible step with a declared priority order instead of an
//! inline `uuid ?? id ?? ...` chain.

use crate::datasource::Row;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// A resolved row identifier, transmitted as-is to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityId {
    /// A string identifier, typically a UUID.
    Text(String),
    /// A numeric identifier.
    Number(i64),
}

impl EntityId {
    /// Converts the identifier into a JSON value for request payloads.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Number(n) => Value::Number((*n).into()),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        id.to_json()
    }
}

/// Returned when a row carries none of the resolver's identifier fields.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("row has no identifier; tried {}", .tried.join(", "))]
pub struct MissingIdError {
    /// The field names that were checked, in priority order.
    pub tried: Vec<String>,
}

/// Resolves row identifiers using a declared field priority.
///
/// The default order is `uuid`, then `id`. Entity-specific fields append
/// after those, matching the convention that a UUID wins whenever present.
///
/// # Examples
///
/// ```rust
/// use bubbletea_datatable::ident::{EntityId, IdResolver};
/// use serde_json::json;
///
/// let resolver = IdResolver::new().with_domain_field("invoice_id");
/// let row = json!({"invoice_id": 42, "customer": "Acme"});
/// let row = row.as_object().unwrap();
/// assert_eq!(resolver.resolve(row), Ok(EntityId::Number(42)));
/// ```
#[derive(Debug, Clone)]
pub struct IdResolver {
    fields: Vec<String>,
}

impl Default for IdResolver {
    fn default() -> Self {
        Self {
            fields: vec!["uuid".to_string(), "id".to_string()],
        }
    }
}

impl IdResolver {
    /// Creates a resolver with the `uuid`, `id` priority order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a domain-specific field after the defaults (builder
    /// pattern), e.g. `invoice_id`.
    pub fn with_domain_field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Replaces the priority order entirely.
    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    /// The field names checked, in priority order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Resolves the identifier for one row.
    ///
    /// A field counts only when present with a non-empty string or an
    /// integer value; null and empty values fall through to the next
    /// field in the order.
    pub fn resolve(&self, row: &Row) -> Result<EntityId, MissingIdError> {
        for field in &self.fields {
            match row.get(field) {
                Some(Value::String(s)) if !s.is_empty() => {
                    return Ok(EntityId::Text(s.clone()));
                }
                Some(Value::Number(n)) => {
                    if let Some(i) = n.as_i64() {
                        return Ok(EntityId::Number(i));
                    }
                }
                _ => {}
            }
        }
        Err(MissingIdError {
            tried: self.fields.clone(),
        })
    }

    /// Resolves identifiers for the selected rows of the current page.
    ///
    /// Indices are positions into `rows`; out-of-range indices are
    /// ignored. Results come back in index order. The first row that
    /// fails to resolve fails the whole call, so a partial payload is
    /// never produced.
    pub fn resolve_selected(
        &self,
        rows: &[Row],
        selected: &HashSet<usize>,
    ) -> Result<Vec<EntityId>, MissingIdError> {
        let mut indices: Vec<usize> = selected
            .iter()
            .copied()
            .filter(|i| *i < rows.len())
            .collect();
        indices.sort_unstable();
        indices
            .into_iter()
            .map(|i| self.resolve(&rows[i]))
            .collect()
    }
}
