//! The data source contract between a table and its backend.
//!
//! A page supplies the table with an implementation of [`DataSource`]. Only
//! [`DataSource::list`] is required; dedicated `filter_by` and `search`
//! endpoints are optional and default to folding their parameters into a
//! `list` call. Every method returns the same normalized [`PageEnvelope`],
//! with the backend as the sole authority on pagination metadata.
//!
//! Outgoing requests follow the sparse query convention: parameters whose
//! value is empty are never transmitted. [`QueryParams`] enforces this at
//! insertion time so callers do not need to pre-filter.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

pub mod envelope;

pub use envelope::{detect_shape, normalize, EnvelopeShape};

/// Default page size requested when a table has no explicit setting.
pub const DEFAULT_PER_PAGE: usize = 10;

/// Fallback text when a backend failure carries no usable detail.
pub const GENERIC_ERROR: &str = "Something went wrong";

/// One record displayed in the table.
///
/// Rows are opaque key-value data. The table never inspects row contents
/// except through column render functions and identifier resolution.
pub type Row = serde_json::Map<String, Value>;

/// Filter selections keyed by parameter name.
pub type FilterMap = BTreeMap<String, FilterValue>;

/// A filter selection, either a single value or a multi-select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// A single selected value.
    Single(String),
    /// Multiple selected values, sent comma-joined.
    Multi(Vec<String>),
}

impl FilterValue {
    /// Returns `true` when the selection carries no transmittable value.
    pub fn is_empty(&self) -> bool {
        self.to_param().is_none()
    }

    /// Folds the selection into a query parameter value.
    ///
    /// Empty single values yield `None`. Multi selections drop empty
    /// members first and yield `None` once nothing remains.
    pub fn to_param(&self) -> Option<String> {
        match self {
            Self::Single(value) => {
                if value.is_empty() {
                    None
                } else {
                    Some(value.clone())
                }
            }
            Self::Multi(values) => {
                let kept: Vec<&str> = values
                    .iter()
                    .map(String::as_str)
                    .filter(|v| !v.is_empty())
                    .collect();
                if kept.is_empty() {
                    None
                } else {
                    Some(kept.join(","))
                }
            }
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

/// String-keyed query parameters with empty values dropped at insertion.
///
/// # Examples
///
/// ```rust
/// use bubbletea_datatable::datasource::QueryParams;
///
/// let mut params = QueryParams::new();
/// params.insert("from_date", "");
/// params.insert("warehouse", "3");
/// assert_eq!(params.get("from_date"), None);
/// assert_eq!(params.get("warehouse"), Some("3"));
/// assert_eq!(params.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: BTreeMap<String, String>,
}

impl QueryParams {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a stringified parameter, dropping it when the value is empty.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        let value = value.to_string();
        if value.is_empty() {
            return;
        }
        self.entries.insert(key.into(), value);
    }

    /// Inserts a parameter only when a value is present and non-empty.
    pub fn insert_opt(&mut self, key: impl Into<String>, value: Option<impl ToString>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Folds filter selections in, omitting selections with no value.
    pub fn extend_filters(&mut self, filters: &FilterMap) {
        for (key, value) in filters {
            if let Some(param) = value.to_param() {
                self.entries.insert(key.clone(), param);
            }
        }
    }

    /// Returns the value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns `true` when `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes and returns the value for `key`.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Number of parameters present.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no parameters are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A page fetch request: position plus any folded-in parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// The page to fetch, 1-indexed.
    pub page: usize,
    /// Rows requested per page.
    pub per_page: usize,
    /// Additional parameters folded in by filter or search fallbacks.
    pub params: QueryParams,
}

impl PageRequest {
    /// Creates a request for `page` with `per_page` rows.
    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
            params: QueryParams::new(),
        }
    }

    /// Adds a parameter (builder pattern). Empty values are dropped.
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Builds the complete outgoing parameter set, `{page, per_page}` plus
    /// the folded-in extras.
    pub fn query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        query.insert("page", self.page);
        query.insert("per_page", self.per_page);
        for (key, value) in self.params.iter() {
            query.insert(key, value);
        }
        query
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

/// A normalized page of rows plus the backend's pagination metadata.
///
/// The default value is the empty page-1 state the table resets to after a
/// failed fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct PageEnvelope {
    /// The rows for this page.
    pub rows: Vec<Row>,
    /// Total records across all pages, as reported by the backend.
    pub total_records: u64,
    /// The page these rows belong to, 1-indexed.
    pub current_page: usize,
    /// Total pages, at least 1.
    pub total_pages: usize,
    /// The page size the backend applied.
    pub per_page: usize,
}

impl Default for PageEnvelope {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            total_records: 0,
            current_page: 1,
            total_pages: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Errors produced by data source implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataSourceError {
    /// The backend reported a structured failure.
    #[error("{0}")]
    Backend(String),
    /// The request itself could not complete.
    #[error("request failed: {0}")]
    Transport(String),
    /// The response body matched no known envelope shape.
    #[error("malformed response envelope")]
    MalformedEnvelope,
}

impl DataSourceError {
    /// Extracts a user-facing message from a backend error body.
    ///
    /// The lookup chain is: a `message` field (under `data` or at the top
    /// level), then a flattened `errors` object with values joined by
    /// `"; "`, then [`GENERIC_ERROR`].
    pub fn from_body(body: &Value) -> Self {
        for pointer in ["/data/message", "/message"] {
            if let Some(message) = body
                .pointer(pointer)
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
            {
                return Self::Backend(message.to_string());
            }
        }
        for pointer in ["/data/errors", "/errors"] {
            if let Some(errors) = body.pointer(pointer) {
                let flattened = flatten_errors(errors);
                if !flattened.is_empty() {
                    return Self::Backend(flattened.join("; "));
                }
            }
        }
        Self::Backend(GENERIC_ERROR.to_string())
    }
}

fn flatten_errors(errors: &Value) -> Vec<String> {
    match errors {
        Value::Object(map) => map.values().flat_map(flatten_errors).collect(),
        Value::Array(items) => items.iter().flat_map(flatten_errors).collect(),
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Async page-supplied fetch functions.
///
/// Implement [`list`](DataSource::list) at minimum. Override
/// [`filter_by`](DataSource::filter_by) or [`search`](DataSource::search)
/// when the backend exposes dedicated endpoints; the defaults fold their
/// parameters into `list`.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use bubbletea_datatable::datasource::{
///     DataSource, DataSourceError, PageEnvelope, PageRequest,
/// };
///
/// struct StaticSource;
///
/// #[async_trait]
/// impl DataSource for StaticSource {
///     async fn list(&self, req: &PageRequest) -> Result<PageEnvelope, DataSourceError> {
///         Ok(PageEnvelope {
///             per_page: req.per_page,
///             ..PageEnvelope::default()
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetches one page of unfiltered results.
    async fn list(&self, req: &PageRequest) -> Result<PageEnvelope, DataSourceError>;

    /// Fetches one page matching the given filter selections.
    ///
    /// The default folds the filters into the request parameters and calls
    /// [`list`](DataSource::list).
    async fn filter_by(
        &self,
        filters: &FilterMap,
        req: &PageRequest,
    ) -> Result<PageEnvelope, DataSourceError> {
        let mut folded = req.clone();
        folded.params.extend_filters(filters);
        self.list(&folded).await
    }

    /// Fetches one page matching a search term.
    ///
    /// A `column` restricts the search to one column; `None` means a global
    /// search. The default folds `search` and `search_column` parameters
    /// into [`list`](DataSource::list).
    async fn search(
        &self,
        term: &str,
        column: Option<&str>,
        req: &PageRequest,
    ) -> Result<PageEnvelope, DataSourceError> {
        let mut folded = req.clone();
        folded.params.insert("search", term);
        folded.params.insert_opt("search_column", column);
        self.list(&folded).await
    }
}
