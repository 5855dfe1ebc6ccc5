//! Main Model struct and state management for the data table.

use super::fetch::FetchStrategy;
use super::keys::TableKeyMap;
use super::rendering::TableStyles;
use super::types::{default_layout, visible_columns, ColumnDef, FilterDescriptor};
use crate::actions::{BulkAction, RowAction};
use crate::datasource::{DataSource, FilterMap, Row, DEFAULT_PER_PAGE};
use crate::export::ExportAction;
use crate::options::{OptionCache, SelectOption};
use crate::prefs::{LayoutStore, TableLayout};
use crate::{help, input, notification, paginator, spinner};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::collections::HashSet;
use std::sync::Arc;

/// What keyboard input is currently driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Row navigation, selection, and actions.
    #[default]
    Normal,
    /// Typing a search term.
    Search,
    /// Browsing filter dropdowns.
    Filter,
}

/// A paginated data table backed by a remote source.
///
/// The model never holds more than one page of rows. Navigation,
/// filtering, and search all go through the backend; the table renders
/// whatever page the source returns and relays its pagination metadata.
/// Embed it in a `bubbletea-rs` application by forwarding messages to
/// [`update`](Model::update) and splicing [`view`](Model::view) into
/// your output.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use bubbletea_datatable::datasource::{
///     DataSource, DataSourceError, PageEnvelope, PageRequest,
/// };
/// use bubbletea_datatable::table::{ColumnDef, FilterDescriptor, Model};
/// use std::sync::Arc;
///
/// struct Invoices;
///
/// #[async_trait]
/// impl DataSource for Invoices {
///     async fn list(&self, _req: &PageRequest) -> Result<PageEnvelope, DataSourceError> {
///         Ok(PageEnvelope::default())
///     }
/// }
///
/// let table = Model::new(
///     Arc::new(Invoices),
///     vec![
///         ColumnDef::new("number", "Invoice #"),
///         ColumnDef::new("customer", "Customer"),
///         ColumnDef::new("warehouse", "Warehouse")
///             .with_filter(FilterDescriptor::from_cache("warehouses")),
///     ],
/// );
/// assert_eq!(table.total_records(), 0);
/// assert!(!table.is_loading());
/// ```
pub struct Model {
    pub(super) source: Arc<dyn DataSource>,
    pub(super) columns: Vec<ColumnDef>,

    // Current page contents
    pub(super) rows: Vec<Row>,
    pub(super) total_records: u64,
    /// Page size requested from the backend.
    pub(super) per_page: usize,
    /// Page size the backend actually returned, used for footer counts.
    pub(super) page_size: usize,

    // Fetch state
    pub(super) loading: bool,
    pub(super) fetch_seq: u64,
    pub(super) last_strategy: FetchStrategy,
    pub(super) refresh_key: u64,

    // Cursor and selection
    pub(super) cursor: usize,
    pub(super) selected: HashSet<usize>,

    // Input modes
    pub(super) mode: Mode,
    pub(super) input: input::Model,
    pub(super) search_column: Option<String>,
    pub(super) filter_index: usize,
    pub(super) option_index: usize,

    // Embedded components
    pub(super) paginator: paginator::Model,
    pub(super) spinner: spinner::Model,
    pub(super) notices: notification::Model,
    pub(super) help: help::Model,
    /// Key bindings; replace or disable entries to customize.
    pub keymap: TableKeyMap,

    // Actions
    pub(super) row_actions: Vec<RowAction>,
    pub(super) bulk_actions: Vec<BulkAction>,
    pub(super) export_action: Option<ExportAction>,

    // Filter options and layout persistence
    pub(super) option_cache: Option<OptionCache>,
    pub(super) layout: TableLayout,
    pub(super) layout_store: Option<Arc<dyn LayoutStore>>,
    pub(super) layout_key: Option<String>,

    // Presentation
    pub(super) width: usize,
    pub(super) styles: TableStyles,
    pub(super) empty_message: String,
}

impl Model {
    /// Creates a table over `source` with the given column set.
    pub fn new(source: Arc<dyn DataSource>, columns: Vec<ColumnDef>) -> Self {
        let layout = default_layout(&columns);
        let mut paginator = paginator::Model::new();
        paginator.set_per_page(DEFAULT_PER_PAGE);

        let mut input = input::Model::new();
        input.prompt = String::new();

        Self {
            source,
            columns,
            rows: Vec::new(),
            total_records: 0,
            per_page: DEFAULT_PER_PAGE,
            page_size: DEFAULT_PER_PAGE,
            loading: false,
            fetch_seq: 0,
            last_strategy: FetchStrategy::default(),
            refresh_key: 0,
            cursor: 0,
            selected: HashSet::new(),
            mode: Mode::Normal,
            input,
            search_column: None,
            filter_index: 0,
            option_index: 0,
            paginator,
            spinner: spinner::new(&[]),
            notices: notification::Model::new(),
            help: help::Model::new(),
            keymap: TableKeyMap::default(),
            row_actions: Vec::new(),
            bulk_actions: Vec::new(),
            export_action: None,
            option_cache: None,
            layout,
            layout_store: None,
            layout_key: None,
            width: 80,
            styles: TableStyles::default(),
            empty_message: "No records found".to_string(),
        }
    }

    /// Sets the page size requested from the backend (builder pattern).
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.set_per_page(per_page);
        self
    }

    /// Sets the page size requested from the backend.
    pub fn set_per_page(&mut self, per_page: usize) {
        self.per_page = per_page.max(1);
        self.page_size = self.per_page;
        self.paginator.set_per_page(self.per_page);
    }

    /// Scopes searches to one column (builder pattern).
    pub fn with_search_column(mut self, column: impl Into<String>) -> Self {
        self.search_column = Some(column.into());
        self
    }

    /// Adds an action on the row under the cursor (builder pattern).
    pub fn with_row_action(mut self, action: RowAction) -> Self {
        self.row_actions.push(action);
        self
    }

    /// Adds an action on the current selection (builder pattern).
    pub fn with_bulk_action(mut self, action: BulkAction) -> Self {
        self.bulk_actions.push(action);
        self
    }

    /// Wires up the export key (builder pattern).
    pub fn with_export(mut self, action: ExportAction) -> Self {
        self.export_action = Some(action);
        self
    }

    /// Shares a dropdown option cache with the table (builder pattern).
    pub fn with_option_cache(mut self, cache: OptionCache) -> Self {
        self.option_cache = Some(cache);
        self
    }

    /// Persists column visibility under `key`, restoring any layout the
    /// store already holds (builder pattern).
    pub fn with_layout_store(mut self, store: Arc<dyn LayoutStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        if let Some(saved) = store.load(&key) {
            self.layout = saved;
        }
        self.layout_store = Some(store);
        self.layout_key = Some(key);
        self
    }

    /// Overrides the visual styles (builder pattern).
    pub fn with_styles(mut self, styles: TableStyles) -> Self {
        self.styles = styles;
        self
    }

    /// Sets the text shown when a page comes back empty (builder
    /// pattern).
    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    // Accessors

    /// The rows of the current page.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Total records across all pages, as reported by the backend.
    pub fn total_records(&self) -> u64 {
        self.total_records
    }

    /// The current 1-indexed page.
    pub fn current_page(&self) -> usize {
        self.paginator.current_page
    }

    /// Total pages, as reported by the backend.
    pub fn total_pages(&self) -> usize {
        self.paginator.total_pages
    }

    /// The page size the backend last confirmed.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Whether a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The current input mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Index of the row under the cursor.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The row under the cursor, if the page has one.
    pub fn hovered_row(&self) -> Option<&Row> {
        self.rows.get(self.cursor)
    }

    /// Indices of the selected rows on the current page.
    pub fn selected(&self) -> &HashSet<usize> {
        &self.selected
    }

    /// The selected rows themselves, in page order.
    pub fn selected_rows(&self) -> Vec<&Row> {
        let mut indices: Vec<usize> = self.selected.iter().copied().collect();
        indices.sort_unstable();
        indices.into_iter().filter_map(|i| self.rows.get(i)).collect()
    }

    /// The transient notice area, for inspection or manual notices.
    pub fn notices(&self) -> &notification::Model {
        &self.notices
    }

    /// Mutable access to the notice area.
    pub fn notices_mut(&mut self) -> &mut notification::Model {
        &mut self.notices
    }

    /// The column declarations.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// The current column visibility layout.
    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// The columns currently visible, in layout order.
    pub fn visible(&self) -> Vec<&ColumnDef> {
        visible_columns(&self.columns, &self.layout)
    }

    // Selection

    /// Toggles selection of the row at `index`; out-of-range indices are
    /// ignored.
    pub fn toggle_row(&mut self, index: usize) {
        if index >= self.rows.len() {
            return;
        }
        if !self.selected.remove(&index) {
            self.selected.insert(index);
        }
    }

    /// Selects the given row indices, ignoring any outside the current
    /// page.
    pub fn select_rows(&mut self, indices: impl IntoIterator<Item = usize>) {
        let len = self.rows.len();
        self.selected.extend(indices.into_iter().filter(|i| *i < len));
    }

    /// Selects every row on the current page.
    pub fn select_all(&mut self) {
        self.selected = (0..self.rows.len()).collect();
    }

    /// Clears the selection.
    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    // Cursor

    pub(super) fn move_cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub(super) fn move_cursor_down(&mut self) {
        if self.cursor + 1 < self.rows.len() {
            self.cursor += 1;
        }
    }

    // Column visibility

    /// Toggles visibility of the column with `key` and persists the
    /// resulting layout. The layout is normalized to declaration order.
    pub fn toggle_column(&mut self, key: &str) {
        if !self.columns.iter().any(|c| c.key == key) {
            return;
        }
        let was_visible = self.layout.contains(key);
        let next: Vec<String> = self
            .columns
            .iter()
            .filter(|c| {
                if c.key == key {
                    !was_visible
                } else {
                    self.layout.contains(&c.key)
                }
            })
            .map(|c| c.key.clone())
            .collect();
        self.layout.visible = next;
        self.persist_layout();
    }

    pub(super) fn persist_layout(&self) {
        if let (Some(store), Some(key)) = (&self.layout_store, &self.layout_key) {
            if let Err(err) = store.save(key, &self.layout) {
                tracing::warn!(key = %key, error = %err, "failed to persist column layout");
            }
        }
    }

    // Filters

    /// The active filter selections as a sparse filter map.
    pub fn filter_map(&self) -> FilterMap {
        let mut map = FilterMap::new();
        for column in &self.columns {
            if let Some(filter) = &column.filter {
                let value = filter.filter_value();
                if !value.is_empty() {
                    map.insert(filter.param.clone(), value);
                }
            }
        }
        map
    }

    /// Clears every filter selection without re-fetching.
    pub fn clear_filters(&mut self) {
        for column in &mut self.columns {
            if let Some(filter) = column.filter.as_mut() {
                filter.clear();
            }
        }
    }

    /// Column indices that carry a filter, in declaration order.
    pub(super) fn filterable_indices(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.filter.is_some())
            .map(|(i, _)| i)
            .collect()
    }

    pub(super) fn focused_filter(&self) -> Option<&FilterDescriptor> {
        let indices = self.filterable_indices();
        let col = *indices.get(self.filter_index)?;
        self.columns[col].filter.as_ref()
    }

    pub(super) fn focused_filter_mut(&mut self) -> Option<&mut FilterDescriptor> {
        let indices = self.filterable_indices();
        let col = *indices.get(self.filter_index)?;
        self.columns[col].filter.as_mut()
    }

    pub(super) fn focused_filter_label(&self) -> Option<&str> {
        let indices = self.filterable_indices();
        let col = *indices.get(self.filter_index)?;
        Some(self.columns[col].label.as_str())
    }

    /// Moves filter focus by `delta` columns with wraparound, resetting
    /// the option cursor and narrowing text.
    pub(super) fn focus_filter_step(&mut self, delta: isize) {
        let count = self.filterable_indices().len();
        if count == 0 {
            return;
        }
        let next = self.filter_index as isize + delta;
        self.filter_index = next.rem_euclid(count as isize) as usize;
        self.option_index = 0;
        self.input.set_value("");
    }

    /// Options of the focused filter, narrowed by the typed text.
    ///
    /// Narrowing is a fuzzy match on the option label, best matches
    /// first, same as list filtering elsewhere in this crate.
    pub(super) fn active_filter_options(&self) -> Vec<SelectOption> {
        let Some(filter) = self.focused_filter() else {
            return Vec::new();
        };
        let needle = self.input.value();
        if needle.is_empty() {
            return filter.options.clone();
        }
        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(i64, SelectOption)> = filter
            .options
            .iter()
            .filter_map(|opt| {
                matcher
                    .fuzzy_match(&opt.label, &needle)
                    .map(|score| (score, opt.clone()))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, opt)| opt).collect()
    }

    pub(super) fn clamp_option_index(&mut self) {
        let count = self.active_filter_options().len();
        if count == 0 {
            self.option_index = 0;
        } else if self.option_index >= count {
            self.option_index = count - 1;
        }
    }
}
