#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/bubbletea-datatable/")]

//! # bubbletea-datatable
//!
//! A REST-backed, paginated data table for terminal admin dashboards built
//! with [bubbletea-rs](https://github.com/whit3rabbit/bubbletea-rs).
//!
//! The crate provides the one component business-operations dashboards reuse
//! on every page: a table over a remote collection with server-side
//! pagination, dropdown filters, search, row selection, bulk actions, export
//! triggering, and persisted column layouts. Pages supply a
//! [`DataSource`](datasource::DataSource) and a set of
//! [`ColumnDef`](table::ColumnDef)s; the table owns the rest of the state
//! and orchestrates every fetch.
//!
//! ## Overview
//!
//! - **Server-driven pagination**: the backend is the sole authority on
//!   `current_page`/`total_pages`; the table relays its metadata and never
//!   computes page counts from row data.
//! - **Sparse queries**: filter and search parameters with empty values are
//!   dropped before transmission, enforced at insertion time by
//!   [`QueryParams`](datasource::QueryParams).
//! - **Stale-response protection**: every fetch carries a monotonic token
//!   and only the response matching the latest dispatch is applied, so
//!   rapid filter changes cannot overwrite fresh state with stale data.
//! - **Tolerant envelope normalization**: the backend's envelope variants
//!   are recognized as named shapes and normalized through a single entry
//!   point ([`datasource::normalize`]).
//! - **Page-scoped selection**: selected indices always reference the
//!   current page's rows; selection never survives a page change.
//!
//! ## Components
//!
//! - **`table`**: the table model itself (controller, column registry,
//!   rendering, key bindings)
//! - **`datasource`**: the adapter contract, query construction, envelope
//!   normalization, and the error taxonomy
//! - **`actions`**: row and bulk action dispatch, including the
//!   `{ids, status}` bulk status-update flow
//! - **`export`**: export triggering and the download URL fallback chain
//! - **`options`**: the shared read-through dropdown option cache
//! - **`ident`**: explicit row identifier resolution with a declared
//!   field priority
//! - **`prefs`**: column layout persistence
//! - **`key`**, **`help`**, **`input`**, **`paginator`**, **`spinner`**,
//!   **`notification`**: the supporting widgets the table embeds
//!
//! ## Quick Start
//!
//! ```rust
//! use async_trait::async_trait;
//! use bubbletea_datatable::datasource::{
//!     DataSource, DataSourceError, PageEnvelope, PageRequest,
//! };
//! use bubbletea_datatable::table::{ColumnDef, FilterDescriptor, Model as Table};
//! use std::sync::Arc;
//!
//! struct InvoiceSource;
//!
//! #[async_trait]
//! impl DataSource for InvoiceSource {
//!     async fn list(&self, req: &PageRequest) -> Result<PageEnvelope, DataSourceError> {
//!         // Call the backend with req.query() and normalize the body;
//!         // static data stands in here.
//!         Ok(PageEnvelope {
//!             per_page: req.per_page,
//!             ..PageEnvelope::default()
//!         })
//!     }
//! }
//!
//! let mut table = Table::new(
//!     Arc::new(InvoiceSource),
//!     vec![
//!         ColumnDef::new("invoice_number", "Invoice #"),
//!         ColumnDef::new("customer_name", "Customer"),
//!         ColumnDef::new("warehouse", "Warehouse")
//!             .with_filter(FilterDescriptor::from_cache("warehouses")),
//!     ],
//! )
//! .with_per_page(25);
//!
//! // In your program's init(): hand the first fetch to the runtime.
//! let _first_fetch = table.init();
//! ```
//!
//! ## Integration with bubbletea-rs
//!
//! The table is embedded, not run on its own: forward every message your
//! program receives to its `update` and splice its `view` into your output.
//!
//! ```rust,ignore
//! impl bubbletea_rs::Model for App {
//!     fn update(&mut self, msg: Msg) -> Option<Cmd> {
//!         self.table.update(&msg)
//!     }
//!
//!     fn view(&self) -> String {
//!         self.table.view()
//!     }
//! }
//! ```
//!
//! External mutations (another component changed backend state) are signaled
//! by delivering a [`table::RefreshMsg`] with a bumped generation; the table
//! re-runs its last fetch exactly once per new generation.

pub mod actions;
pub mod datasource;
pub mod export;
pub mod help;
pub mod ident;
pub mod input;
pub mod key;
pub mod notification;
pub mod options;
pub mod paginator;
pub mod prefs;
pub mod spinner;
pub mod table;

use bubbletea_rs::Cmd;

/// Focus management for the widgets that accept keyboard input.
///
/// The table drives focus for its embedded input internally; implement this
/// trait when composing the widgets directly.
pub trait Component {
    /// Sets the component to focused state.
    ///
    /// May return a command for initialization tasks like starting a cursor
    /// blink timer.
    fn focus(&mut self) -> Option<Cmd>;

    /// Sets the component to blurred (unfocused) state.
    fn blur(&mut self);

    /// Returns the current focus state of the component.
    fn focused(&self) -> bool;
}

pub use actions::{
    outcome_cmd, ActionOutcomeMsg, BulkAction, RowAction, StatusAction, StatusPayload,
    StatusUpdater,
};
pub use datasource::{
    DataSource, DataSourceError, FilterMap, FilterValue, PageEnvelope, PageRequest, QueryParams,
    Row,
};
pub use export::{DownloadSink, ExportAction, ExportFormat, ExportRequest, Exporter};
pub use help::Model as HelpModel;
pub use ident::{EntityId, IdResolver, MissingIdError};
pub use input::Model as Input;
pub use key::{
    matches, matches_binding, new_binding, with_disabled, with_help, with_keys, with_keys_str,
    Binding, Help as KeyHelp, KeyMap, KeyPress,
};
pub use notification::Severity;
pub use options::{OptionCache, OptionLoader, SelectOption};
pub use paginator::Model as Paginator;
pub use prefs::{FileLayoutStore, LayoutStore, MemoryLayoutStore, TableLayout};
pub use spinner::{
    new as spinner_new, with_spinner, with_style, Model as Spinner, SpinnerOption,
    TickMsg as SpinnerTickMsg, DOT, ELLIPSIS, LINE, MINI_DOT, POINTS,
};
pub use table::{
    ColumnDef, FetchResultMsg, FetchStrategy, FilterDescriptor, Model as Table, RefreshMsg,
    TableKeyMap,
};

/// Prelude module for convenient imports.
///
/// Re-exports the types most embedding applications need: the table model
/// and its declarations, the data source contract, the action and export
/// builders, and the key binding helpers.
///
/// # Usage
///
/// ```rust
/// use bubbletea_datatable::prelude::*;
/// ```
pub mod prelude {
    pub use crate::actions::{
        outcome_cmd, ActionOutcomeMsg, BulkAction, RowAction, StatusAction, StatusPayload,
        StatusUpdater,
    };
    pub use crate::datasource::{
        DataSource, DataSourceError, FilterMap, FilterValue, PageEnvelope, PageRequest,
        QueryParams, Row,
    };
    pub use crate::export::{DownloadSink, ExportAction, ExportFormat, Exporter, ExportRequest};
    pub use crate::ident::{EntityId, IdResolver};
    pub use crate::key::{
        matches, matches_binding, new_binding, with_disabled, with_help, with_keys,
        with_keys_str, Binding, KeyMap, KeyPress,
    };
    pub use crate::notification::Severity;
    pub use crate::options::{OptionCache, OptionLoader, SelectOption};
    pub use crate::prefs::{FileLayoutStore, LayoutStore, MemoryLayoutStore, TableLayout};
    pub use crate::table::{
        ColumnDef, FetchResultMsg, FetchStrategy, FilterDescriptor, Model as Table, RefreshMsg,
        TableKeyMap,
    };
    pub use crate::Component;
}
