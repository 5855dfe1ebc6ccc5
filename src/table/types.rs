//! Column and filter declarations.
//!
//! A page describes its table as a list of [`ColumnDef`]s: what to call
//! each column, how to render its cells, and whether it drives a filter
//! dropdown. The table consumes these declarations to build views and to
//! map filter selections into query parameters; it never interprets row
//! contents on its own.

use crate::datasource::{FilterValue, Row};
use crate::options::SelectOption;
use crate::prefs::TableLayout;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Shown for cells with nothing to display.
pub const CELL_PLACEHOLDER: &str = "-";

/// Renders one cell from a row. Returning `None` shows the placeholder.
pub type RenderFn = Arc<dyn Fn(&Row) -> Option<String> + Send + Sync>;

/// A filter dropdown bound to a column.
///
/// Options come either from the shared option cache (via
/// [`options_from`](FilterDescriptor::options_from)) or from a static
/// list. Selection follows the idempotent toggle rule: picking the value
/// that is already selected clears it.
#[derive(Debug, Clone, Default)]
pub struct FilterDescriptor {
    /// Query parameter name. Defaults to the column key when the
    /// descriptor is attached via [`ColumnDef::with_filter`].
    pub param: String,
    /// Entity key into the option cache, e.g. `"warehouses"`.
    pub options_from: Option<String>,
    /// Static options, used when no cache entity is named.
    pub options: Vec<SelectOption>,
    /// Whether multiple values can be selected at once.
    pub multi: bool,
    selected: Vec<String>,
}

impl FilterDescriptor {
    /// Creates an empty single-select descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a descriptor whose options load through the cache entity
    /// `entity`.
    pub fn from_cache(entity: impl Into<String>) -> Self {
        Self {
            options_from: Some(entity.into()),
            ..Self::default()
        }
    }

    /// Creates a descriptor with a fixed option list.
    pub fn with_options(options: Vec<SelectOption>) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Sets the query parameter name (builder pattern).
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = param.into();
        self
    }

    /// Allows multiple simultaneous selections (builder pattern).
    pub fn with_multi(mut self) -> Self {
        self.multi = true;
        self
    }

    /// Toggles `value`: selecting an already-selected value clears it,
    /// selecting a different value replaces (single) or adds (multi).
    pub fn toggle(&mut self, value: &str) {
        if let Some(pos) = self.selected.iter().position(|v| v == value) {
            self.selected.remove(pos);
            return;
        }
        if !self.multi {
            self.selected.clear();
        }
        self.selected.push(value.to_string());
    }

    /// Clears the selection.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// The currently selected values.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Returns `true` when `value` is currently selected.
    pub fn is_selected(&self, value: &str) -> bool {
        self.selected.iter().any(|v| v == value)
    }

    /// Returns `true` when the filter constrains the query.
    pub fn is_active(&self) -> bool {
        !self.filter_value().is_empty()
    }

    /// The selection as a transmittable filter value.
    pub fn filter_value(&self) -> FilterValue {
        if self.multi {
            FilterValue::Multi(self.selected.clone())
        } else {
            FilterValue::Single(self.selected.first().cloned().unwrap_or_default())
        }
    }
}

/// One column of the table.
///
/// # Examples
///
/// ```rust
/// use bubbletea_datatable::table::{ColumnDef, FilterDescriptor};
/// use serde_json::json;
///
/// let column = ColumnDef::new("grand_total", "Total").with_render(|row| {
///     row.get("grand_total")
///         .and_then(|v| v.as_f64())
///         .map(|total| format!("${:.2}", total))
/// });
///
/// let row = json!({"grand_total": 12.5});
/// assert_eq!(column.display_value(row.as_object().unwrap()), "$12.50");
///
/// let empty = json!({});
/// assert_eq!(column.display_value(empty.as_object().unwrap()), "-");
/// ```
#[derive(Clone)]
pub struct ColumnDef {
    /// Unique key, also the row field rendered by default.
    pub key: String,
    /// Header label.
    pub label: String,
    /// Whether the column is visible before any saved layout applies.
    pub show_by_default: bool,
    /// Fixed display width; derived from content when absent.
    pub width: Option<usize>,
    /// Optional filter dropdown for this column.
    pub filter: Option<FilterDescriptor>,
    render: Option<RenderFn>,
}

impl ColumnDef {
    /// Creates a visible-by-default column.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            show_by_default: true,
            width: None,
            filter: None,
            render: None,
        }
    }

    /// Hides the column until toggled on (builder pattern).
    pub fn hidden_by_default(mut self) -> Self {
        self.show_by_default = false;
        self
    }

    /// Sets a fixed display width (builder pattern).
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// Sets the cell renderer (builder pattern).
    ///
    /// The renderer must be a pure function of the row; return `None` for
    /// rows it cannot format and the placeholder is shown instead.
    pub fn with_render(
        mut self,
        render: impl Fn(&Row) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.render = Some(Arc::new(render));
        self
    }

    /// Attaches a filter dropdown (builder pattern). An empty
    /// [`FilterDescriptor::param`] defaults to the column key.
    pub fn with_filter(mut self, mut filter: FilterDescriptor) -> Self {
        if filter.param.is_empty() {
            filter.param = self.key.clone();
        }
        self.filter = Some(filter);
        self
    }

    /// Returns `true` when the column drives a filter dropdown.
    pub fn is_filterable(&self) -> bool {
        self.filter.is_some()
    }

    /// Renders the cell for `row`, falling back to the placeholder.
    pub fn display_value(&self, row: &Row) -> String {
        if let Some(render) = &self.render {
            return render(row)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| CELL_PLACEHOLDER.to_string());
        }
        match row.get(&self.key) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => CELL_PLACEHOLDER.to_string(),
        }
    }
}

impl fmt::Debug for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("show_by_default", &self.show_by_default)
            .field("has_render", &self.render.is_some())
            .field("filter", &self.filter)
            .finish()
    }
}

/// The layout a column set produces before any saved preference applies.
pub fn default_layout(columns: &[ColumnDef]) -> TableLayout {
    TableLayout::new(
        columns
            .iter()
            .filter(|c| c.show_by_default)
            .map(|c| c.key.clone())
            .collect(),
    )
}

/// Resolves a layout against the column set, in layout order.
///
/// Keys the column set does not know are skipped, so a stale saved layout
/// cannot produce phantom columns.
pub fn visible_columns<'a>(columns: &'a [ColumnDef], layout: &TableLayout) -> Vec<&'a ColumnDef> {
    layout
        .visible
        .iter()
        .filter_map(|key| columns.iter().find(|c| &c.key == key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().expect("object row")
    }

    #[test]
    fn test_display_value_reads_key_field() {
        let column = ColumnDef::new("customer", "Customer");
        assert_eq!(
            column.display_value(&row(json!({"customer": "Acme"}))),
            "Acme"
        );
        assert_eq!(column.display_value(&row(json!({"customer": 42}))), "42");
    }

    #[test]
    fn test_display_value_placeholder_for_missing_or_empty() {
        let column = ColumnDef::new("customer", "Customer");
        assert_eq!(column.display_value(&row(json!({}))), "-");
        assert_eq!(column.display_value(&row(json!({"customer": null}))), "-");
        assert_eq!(column.display_value(&row(json!({"customer": ""}))), "-");
    }

    #[test]
    fn test_render_fn_and_placeholder_degradation() {
        let column = ColumnDef::new("total", "Total").with_render(|row| {
            row.get("total").and_then(Value::as_f64).map(|t| format!("${:.2}", t))
        });
        assert_eq!(column.display_value(&row(json!({"total": 3.5}))), "$3.50");
        assert_eq!(column.display_value(&row(json!({"total": "bad"}))), "-");
    }

    #[test]
    fn test_filter_toggle_is_idempotent() {
        let mut filter = FilterDescriptor::new();
        filter.toggle("3");
        assert_eq!(filter.selected(), ["3"]);
        filter.toggle("3");
        assert!(filter.selected().is_empty());
    }

    #[test]
    fn test_filter_toggle_replaces_in_single_mode() {
        let mut filter = FilterDescriptor::new();
        filter.toggle("3");
        filter.toggle("5");
        assert_eq!(filter.selected(), ["5"]);
    }

    #[test]
    fn test_filter_toggle_accumulates_in_multi_mode() {
        let mut filter = FilterDescriptor::new().with_multi();
        filter.toggle("3");
        filter.toggle("5");
        assert_eq!(filter.selected(), ["3", "5"]);
        filter.toggle("3");
        assert_eq!(filter.selected(), ["5"]);
    }

    #[test]
    fn test_inactive_filter_produces_empty_value() {
        let filter = FilterDescriptor::new();
        assert!(!filter.is_active());
        assert!(filter.filter_value().is_empty());
    }

    #[test]
    fn test_with_filter_defaults_param_to_key() {
        let column = ColumnDef::new("warehouse", "Warehouse")
            .with_filter(FilterDescriptor::from_cache("warehouses"));
        assert_eq!(
            column.filter.as_ref().map(|f| f.param.as_str()),
            Some("warehouse")
        );

        let column = ColumnDef::new("warehouse", "Warehouse")
            .with_filter(FilterDescriptor::new().with_param("warehouse_id"));
        assert_eq!(
            column.filter.as_ref().map(|f| f.param.as_str()),
            Some("warehouse_id")
        );
    }

    #[test]
    fn test_default_layout_respects_show_by_default() {
        let columns = vec![
            ColumnDef::new("a", "A"),
            ColumnDef::new("b", "B").hidden_by_default(),
            ColumnDef::new("c", "C"),
        ];
        assert_eq!(default_layout(&columns).visible, ["a", "c"]);
    }

    #[test]
    fn test_visible_columns_follow_layout_order() {
        let columns = vec![
            ColumnDef::new("a", "A"),
            ColumnDef::new("b", "B"),
            ColumnDef::new("c", "C"),
        ];
        let layout = TableLayout::new(vec![
            "c".to_string(),
            "missing".to_string(),
            "a".to_string(),
        ]);
        let visible: Vec<&str> = visible_columns(&columns, &layout)
            .iter()
            .map(|c| c.key.as_str())
            .collect();
        assert_eq!(visible, ["c", "a"]);
    }
}
