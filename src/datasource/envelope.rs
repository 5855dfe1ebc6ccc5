//! Response envelope normalization.
//!
//! Backends in the wild disagree on where pagination metadata lives and
//! what it is called. Rather than sprinkling fallback chains through the
//! fetch path, each observed shape is a named adapter and [`normalize`] is
//! the single place a raw body becomes a [`PageEnvelope`]. Metadata that
//! arrives out of range is clamped so the canonical invariants hold:
//! `1 <= current_page <= total_pages` and `rows.len() <= per_page`.

use super::{DataSourceError, PageEnvelope, PageRequest, Row};
use serde_json::Value;
use tracing::warn;

/// The recognized backend response shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeShape {
    /// `{data, pagination: {current_page, last_page, per_page, total}}`.
    FlatPagination,
    /// `{data, pagination: {pagination: {...}}}`, the doubly wrapped
    /// variant some endpoints produce.
    NestedPagination,
    /// `{data}` with no pagination block at all; treated as a single page.
    DataOnly,
}

/// Classifies a response body by where its pagination metadata lives.
pub fn detect_shape(body: &Value) -> EnvelopeShape {
    match body.get("pagination") {
        Some(pagination) if pagination.get("pagination").is_some_and(Value::is_object) => {
            EnvelopeShape::NestedPagination
        }
        Some(pagination) if pagination.is_object() => EnvelopeShape::FlatPagination,
        _ => EnvelopeShape::DataOnly,
    }
}

/// Normalizes a raw response body against the request that produced it.
///
/// Error envelopes (`{error: true, ...}`) become a [`DataSourceError`]
/// carrying the extracted backend message. Successful bodies are routed
/// through the adapter for their detected shape.
///
/// # Examples
///
/// ```rust
/// use bubbletea_datatable::datasource::{normalize, PageRequest};
/// use serde_json::json;
///
/// let body = json!({
///     "data": [{"id": 1}, {"id": 2}],
///     "pagination": {"current_page": 1, "last_page": 4, "per_page": 2, "total": 8}
/// });
/// let envelope = normalize(&body, &PageRequest::new(1, 2)).unwrap();
/// assert_eq!(envelope.rows.len(), 2);
/// assert_eq!(envelope.total_pages, 4);
/// assert_eq!(envelope.total_records, 8);
/// ```
pub fn normalize(body: &Value, req: &PageRequest) -> Result<PageEnvelope, DataSourceError> {
    if !body.is_object() {
        return Err(DataSourceError::MalformedEnvelope);
    }
    if body.get("error").and_then(Value::as_bool) == Some(true) {
        return Err(DataSourceError::from_body(body));
    }

    let rows = extract_rows(body.get("data"));
    let envelope = match detect_shape(body) {
        EnvelopeShape::FlatPagination => {
            from_meta(rows, body.get("pagination"), req)
        }
        EnvelopeShape::NestedPagination => {
            from_meta(rows, body.pointer("/pagination/pagination"), req)
        }
        EnvelopeShape::DataOnly => single_page(rows),
    };
    Ok(envelope)
}

/// Builds an envelope from a flat metadata block, accepting the key
/// spellings observed per field and clamping the result into range.
fn from_meta(mut rows: Vec<Row>, meta: Option<&Value>, req: &PageRequest) -> PageEnvelope {
    let reported_page = meta_field(meta, &["current_page", "page"]).unwrap_or(req.page as u64);
    let reported_pages = meta_field(meta, &["last_page", "total_pages", "totalPages"]).unwrap_or(1);
    let per_page = meta_field(meta, &["per_page", "limit"])
        .map(|v| v as usize)
        .filter(|v| *v > 0)
        .unwrap_or(req.per_page);
    let total_records =
        meta_field(meta, &["total"]).unwrap_or(rows.len() as u64);

    let total_pages = (reported_pages as usize).max(1);
    let current_page = (reported_page as usize).clamp(1, total_pages);
    if current_page as u64 != reported_page {
        warn!(
            reported = reported_page,
            clamped = current_page,
            total_pages,
            "out-of-range page metadata"
        );
    }
    if rows.len() > per_page {
        warn!(
            rows = rows.len(),
            per_page, "truncating oversized page"
        );
        rows.truncate(per_page);
    }

    PageEnvelope {
        rows,
        total_records,
        current_page,
        total_pages,
        per_page,
    }
}

/// Builds the envelope for a body with no pagination metadata.
fn single_page(rows: Vec<Row>) -> PageEnvelope {
    let count = rows.len();
    PageEnvelope {
        total_records: count as u64,
        current_page: 1,
        total_pages: 1,
        per_page: count.max(1),
        rows,
    }
}

fn extract_rows(data: Option<&Value>) -> Vec<Row> {
    match data {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect(),
        _ => Vec::new(),
    }
}

/// Reads a metadata field, trying each key spelling in order and accepting
/// both numbers and numeric strings.
fn meta_field(meta: Option<&Value>, keys: &[&str]) -> Option<u64> {
    let meta = meta?;
    for key in keys {
        let value = match meta.get(*key) {
            Some(value) => value,
            None => continue,
        };
        if let Some(n) = value.as_u64() {
            return Some(n);
        }
        if let Some(parsed) = value.as_str().and_then(|s| s.trim().parse::<u64>().ok()) {
            return Some(parsed);
        }
    }
    None
}
