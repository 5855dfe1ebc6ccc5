//! A page indicator for server-paginated tables.
//!
//! This component renders pagination state and handles prev/next key
//! bindings. It deliberately never computes page counts from row data: the
//! backend owns `current_page`/`total_pages`, and the table feeds the
//! normalized values in through [`Model::set_meta`] after every fetch. Pages
//! are 1-indexed to match the wire contract.

use crate::key::{self, KeyMap as KeyMapTrait};
use bubbletea_rs::{KeyMsg, Msg};

/// The display style of the page indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Type {
    /// Arabic numerals, e.g. `"3/12"`.
    #[default]
    Arabic,
    /// One dot per page, e.g. `"○ ○ • ○"`.
    Dots,
}

/// Key bindings for page navigation.
///
/// # Examples
///
/// ```rust
/// use bubbletea_datatable::paginator::PaginatorKeyMap;
/// use bubbletea_datatable::key;
///
/// let custom = PaginatorKeyMap {
///     prev_page: key::new_binding(vec![
///         key::with_keys_str(&["a", "left"]),
///         key::with_help("a/←", "previous page"),
///     ]),
///     next_page: key::new_binding(vec![
///         key::with_keys_str(&["d", "right"]),
///         key::with_help("d/→", "next page"),
///     ]),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct PaginatorKeyMap {
    /// Navigate to the previous page.
    pub prev_page: key::Binding,
    /// Navigate to the next page.
    pub next_page: key::Binding,
}

impl Default for PaginatorKeyMap {
    fn default() -> Self {
        Self {
            prev_page: key::new_binding(vec![
                key::with_keys_str(&["pgup", "left", "h"]),
                key::with_help("←/h", "prev page"),
            ]),
            next_page: key::new_binding(vec![
                key::with_keys_str(&["pgdown", "right", "l"]),
                key::with_help("→/l", "next page"),
            ]),
        }
    }
}

impl KeyMapTrait for PaginatorKeyMap {
    fn short_help(&self) -> Vec<&key::Binding> {
        vec![&self.prev_page, &self.next_page]
    }

    fn full_help(&self) -> Vec<Vec<&key::Binding>> {
        vec![vec![&self.prev_page, &self.next_page]]
    }
}

/// Pagination state as reported by the backend, plus display settings.
///
/// # Examples
///
/// ```rust
/// use bubbletea_datatable::paginator::{Model, Type};
///
/// let mut paginator = Model::new().with_per_page(25);
/// paginator.set_meta(3, 12);
/// assert_eq!(paginator.current_page, 3);
/// assert_eq!(paginator.view(), "3/12");
///
/// paginator.paginator_type = Type::Dots;
/// assert!(paginator.view().contains('•'));
/// ```
#[derive(Debug, Clone)]
pub struct Model {
    /// The display style (Arabic or Dots).
    pub paginator_type: Type,
    /// The current page, 1-indexed.
    pub current_page: usize,
    /// Rows requested per page.
    pub per_page: usize,
    /// Total pages reported by the backend.
    pub total_pages: usize,

    /// Dot drawn for the current page in Dots mode.
    pub active_dot: String,
    /// Dot drawn for every other page in Dots mode.
    pub inactive_dot: String,
    /// Format string for Arabic mode, with two `%d` slots.
    pub arabic_format: String,

    /// Key bindings.
    pub keymap: PaginatorKeyMap,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            paginator_type: Type::default(),
            current_page: 1,
            per_page: 10,
            total_pages: 1,
            active_dot: "•".to_string(),
            inactive_dot: "○".to_string(),
            arabic_format: "%d/%d".to_string(),
            keymap: PaginatorKeyMap::default(),
        }
    }
}

impl Model {
    /// Creates a paginator on page 1 of 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the display style (builder pattern).
    pub fn with_type(mut self, paginator_type: Type) -> Self {
        self.paginator_type = paginator_type;
        self
    }

    /// Sets the requested page size (builder pattern). Clamped to at least 1.
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Sets the requested page size in place. Clamped to at least 1.
    pub fn set_per_page(&mut self, per_page: usize) {
        self.per_page = per_page.max(1);
    }

    /// Sets the active dot string (builder pattern).
    pub fn with_active_dot(mut self, dot: &str) -> Self {
        self.active_dot = dot.to_string();
        self
    }

    /// Sets the inactive dot string (builder pattern).
    pub fn with_inactive_dot(mut self, dot: &str) -> Self {
        self.inactive_dot = dot.to_string();
        self
    }

    /// Applies backend pagination metadata.
    ///
    /// `total_pages` is clamped to at least 1 and `current_page` into
    /// `[1, total_pages]`, so inconsistent backend values cannot leave the
    /// indicator out of range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bubbletea_datatable::paginator::Model;
    ///
    /// let mut paginator = Model::new();
    /// paginator.set_meta(0, 0);
    /// assert_eq!((paginator.current_page, paginator.total_pages), (1, 1));
    ///
    /// paginator.set_meta(99, 4);
    /// assert_eq!((paginator.current_page, paginator.total_pages), (4, 4));
    /// ```
    pub fn set_meta(&mut self, current_page: usize, total_pages: usize) {
        self.total_pages = total_pages.max(1);
        self.current_page = current_page.clamp(1, self.total_pages);
    }

    /// Moves to the previous page if not already on the first.
    pub fn prev_page(&mut self) {
        if self.current_page > 1 {
            self.current_page -= 1;
        }
    }

    /// Moves to the next page if not already on the last.
    pub fn next_page(&mut self) {
        if !self.on_last_page() {
            self.current_page += 1;
        }
    }

    /// Returns `true` on page 1.
    pub fn on_first_page(&self) -> bool {
        self.current_page <= 1
    }

    /// Returns `true` on the final page.
    pub fn on_last_page(&self) -> bool {
        self.current_page >= self.total_pages
    }

    /// Handles prev/next key messages for standalone embedding.
    ///
    /// The table component does not use this; it intercepts the same
    /// bindings itself so that a page change can issue a fetch, and only
    /// calls [`set_meta`](Model::set_meta) once the response arrives.
    pub fn update(&mut self, msg: &Msg) {
        if let Some(key_msg) = msg.downcast_ref::<KeyMsg>() {
            if self.keymap.next_page.matches(key_msg) {
                self.next_page();
            } else if self.keymap.prev_page.matches(key_msg) {
                self.prev_page();
            }
        }
    }

    /// Renders the page indicator.
    pub fn view(&self) -> String {
        match self.paginator_type {
            Type::Arabic => self.arabic_view(),
            Type::Dots => self.dots_view(),
        }
    }

    fn arabic_view(&self) -> String {
        self.arabic_format
            .replacen("%d", &self.current_page.to_string(), 1)
            .replacen("%d", &self.total_pages.to_string(), 1)
    }

    fn dots_view(&self) -> String {
        let mut s = String::new();
        for page in 1..=self.total_pages {
            if page == self.current_page {
                s.push_str(&self.active_dot);
            } else {
                s.push_str(&self.inactive_dot);
            }
            if page < self.total_pages {
                s.push(' ');
            }
        }
        s
    }
}
