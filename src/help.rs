//! A help bar that renders a component's key bindings.
//!
//! The help model turns any [`KeyMap`](crate::key::KeyMap) into either a
//! compact single-line view (for the footer of a table) or an expanded
//! multi-column view toggled with a "more" key. Disabled bindings are
//! skipped, so context-dependent keys (e.g. "next page" on the last page)
//! disappear from the help automatically.
//!
//! # Quick Start
//!
//! ```rust
//! use bubbletea_datatable::help;
//! use bubbletea_datatable::key::{Binding, KeyMap};
//! use crossterm::event::KeyCode;
//!
//! struct InvoiceKeys {
//!     refresh: Binding,
//!     export: Binding,
//!     quit: Binding,
//! }
//!
//! impl KeyMap for InvoiceKeys {
//!     fn short_help(&self) -> Vec<&Binding> {
//!         vec![&self.refresh, &self.quit]
//!     }
//!     fn full_help(&self) -> Vec<Vec<&Binding>> {
//!         vec![vec![&self.refresh, &self.export], vec![&self.quit]]
//!     }
//! }
//!
//! let keys = InvoiceKeys {
//!     refresh: Binding::new(vec![KeyCode::Char('r')]).with_help("r", "refresh"),
//!     export: Binding::new(vec![KeyCode::Char('e')]).with_help("e", "export"),
//!     quit: Binding::new(vec![KeyCode::Char('q')]).with_help("q", "quit"),
//! };
//!
//! let help = help::Model::new().with_width(80);
//! let line = help.view(&keys); // "r refresh • q quit"
//! ```

use crate::key;
pub use crate::key::KeyMap;
use lipgloss_extras::lipgloss;
use lipgloss_extras::prelude::*;

/// Styles for the help view.
///
/// Separate key/description/separator styles are kept for the short and full
/// views so a theme can de-emphasize the expanded view independently.
#[derive(Debug, Clone)]
pub struct Styles {
    /// Style for the ellipsis shown when content is truncated.
    pub ellipsis: Style,
    /// Style for key labels in the short view.
    pub short_key: Style,
    /// Style for descriptions in the short view.
    pub short_desc: Style,
    /// Style for the separator between short view items.
    pub short_separator: Style,
    /// Style for key labels in the full view.
    pub full_key: Style,
    /// Style for descriptions in the full view.
    pub full_desc: Style,
    /// Style for the separator between full view columns.
    pub full_separator: Style,
}

impl Default for Styles {
    fn default() -> Self {
        use lipgloss::AdaptiveColor;

        let key_style = Style::new().foreground(AdaptiveColor {
            Light: "#909090",
            Dark: "#626262",
        });
        let desc_style = Style::new().foreground(AdaptiveColor {
            Light: "#B2B2B2",
            Dark: "#4A4A4A",
        });
        let sep_style = Style::new().foreground(AdaptiveColor {
            Light: "#DDDADA",
            Dark: "#3C3C3C",
        });

        Self {
            ellipsis: sep_style.clone(),
            short_key: key_style.clone(),
            short_desc: desc_style.clone(),
            short_separator: sep_style.clone(),
            full_key: key_style,
            full_desc: desc_style,
            full_separator: sep_style,
        }
    }
}

/// The help model.
///
/// Holds display state only; which bindings appear comes from the
/// [`KeyMap`] passed to [`view`](Model::view). Toggle `show_all` to switch
/// between the compact and expanded layouts, and set `width` to truncate
/// with an ellipsis instead of wrapping.
///
/// # Examples
///
/// ```rust
/// use bubbletea_datatable::help::Model;
///
/// let mut help = Model::new().with_width(100);
/// assert!(!help.show_all);
/// help.show_all = true; // expanded view on next render
/// ```
#[derive(Debug, Clone)]
pub struct Model {
    /// Whether to render the expanded multi-column view.
    pub show_all: bool,
    /// Maximum render width in cells; 0 means unlimited.
    pub width: usize,

    /// Separator between items in the short view.
    pub short_separator: String,
    /// Separator between columns in the full view.
    pub full_separator: String,
    /// Truncation indicator.
    pub ellipsis: String,

    /// Visual styles.
    pub styles: Styles,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            show_all: false,
            width: 0,
            short_separator: " • ".to_string(),
            full_separator: "    ".to_string(),
            ellipsis: "…".to_string(),
            styles: Styles::default(),
        }
    }
}

impl Model {
    /// Creates a help model with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum render width (builder pattern).
    ///
    /// When the rendered help would exceed this width, trailing items (short
    /// view) or whole columns (full view) are dropped and an ellipsis is
    /// shown if it fits. A width of 0 disables truncation.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Sets the maximum render width in place.
    pub fn set_width(&mut self, width: usize) {
        self.width = width;
    }

    /// Renders the help view for the given keymap.
    ///
    /// Chooses the short or full layout based on `show_all`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bubbletea_datatable::help::Model;
    /// use bubbletea_datatable::key::{Binding, KeyMap};
    /// use crossterm::event::KeyCode;
    ///
    /// struct Keys {
    ///     quit: Binding,
    /// }
    /// impl KeyMap for Keys {
    ///     fn short_help(&self) -> Vec<&Binding> {
    ///         vec![&self.quit]
    ///     }
    ///     fn full_help(&self) -> Vec<Vec<&Binding>> {
    ///         vec![vec![&self.quit]]
    ///     }
    /// }
    ///
    /// let keys = Keys {
    ///     quit: Binding::new(vec![KeyCode::Char('q')]).with_help("q", "quit"),
    /// };
    /// let out = Model::new().view(&keys);
    /// assert!(!out.is_empty());
    /// ```
    pub fn view<K: KeyMap>(&self, keymap: &K) -> String {
        if self.show_all {
            self.full_help_view(keymap.full_help())
        } else {
            self.short_help_view(keymap.short_help())
        }
    }

    /// Renders the compact single-line view: `key desc • key desc • …`.
    ///
    /// Items are added left to right; once the width limit would be
    /// exceeded, rendering stops and an ellipsis is appended if it fits.
    pub fn short_help_view(&self, bindings: Vec<&key::Binding>) -> String {
        if bindings.is_empty() {
            return String::new();
        }

        let mut out = String::new();
        let mut total_width = 0;
        let separator = self
            .styles
            .short_separator
            .clone()
            .inline(true)
            .render(&self.short_separator);

        for kb in bindings {
            if !kb.enabled() {
                continue;
            }

            let sep = if total_width > 0 { separator.as_str() } else { "" };

            let help = kb.help();
            let key_part = self.styles.short_key.clone().inline(true).render(&help.key);
            let desc_part = self
                .styles
                .short_desc
                .clone()
                .inline(true)
                .render(&help.desc);
            let item = format!("{}{} {}", sep, key_part, desc_part);
            let item_width = lipgloss::width_visible(&item);

            if let Some(tail) = self.truncation_tail(total_width, item_width) {
                out.push_str(&tail);
                break;
            }

            total_width += item_width;
            out.push_str(&item);
        }
        out
    }

    /// Renders the expanded multi-column view, one column per binding group.
    ///
    /// Columns keep their integrity under width limits: a column that does
    /// not fit is dropped whole rather than clipped.
    pub fn full_help_view(&self, groups: Vec<Vec<&key::Binding>>) -> String {
        if groups.is_empty() {
            return String::new();
        }

        let mut columns = Vec::new();
        let mut total_width = 0;
        let separator = self
            .styles
            .full_separator
            .clone()
            .inline(true)
            .render(&self.full_separator);

        for group in groups.iter() {
            if !should_render_column(group) {
                continue;
            }

            let rows: Vec<String> = group
                .iter()
                .filter(|b| b.enabled())
                .map(|b| {
                    let help = b.help();
                    let key_part = self.styles.full_key.clone().inline(true).render(&help.key);
                    let desc_part = self
                        .styles
                        .full_desc
                        .clone()
                        .inline(true)
                        .render(&help.desc);
                    format!("{} {}", key_part, desc_part)
                })
                .collect();

            let col = rows.join("\n");
            let col_width = lipgloss::width_visible(&col);

            if let Some(tail) = self.truncation_tail(total_width, col_width) {
                if !tail.is_empty() {
                    columns.push(tail);
                }
                break;
            }

            total_width += col_width;
            columns.push(col);
        }

        let mut parts = Vec::new();
        for (i, col) in columns.iter().enumerate() {
            if i > 0 {
                parts.push(separator.as_str());
            }
            parts.push(col.as_str());
        }

        lipgloss::join_horizontal(lipgloss::TOP, &parts)
    }

    /// Decides whether another item of `item_width` fits.
    ///
    /// Returns `None` when it fits; otherwise the string to terminate the
    /// view with (a styled ellipsis when there is room for one, else empty).
    fn truncation_tail(&self, total_width: usize, item_width: usize) -> Option<String> {
        if self.width > 0 && total_width + item_width > self.width {
            let tail = format!(
                " {}",
                self.styles
                    .ellipsis
                    .clone()
                    .inline(true)
                    .render(&self.ellipsis)
            );
            if total_width + lipgloss::width_visible(&tail) < self.width {
                return Some(tail);
            }
            return Some(String::new());
        }
        None
    }
}

/// Returns `true` when a column contains at least one enabled binding.
///
/// Columns whose bindings are all disabled are dropped from the full view.
pub fn should_render_column(bindings: &[&key::Binding]) -> bool {
    bindings.iter().any(|b| b.enabled())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Binding;
    use crossterm::event::KeyCode;

    struct TestKeys {
        refresh: Binding,
        export: Binding,
        quit: Binding,
    }

    impl TestKeys {
        fn new() -> Self {
            Self {
                refresh: Binding::new(vec![KeyCode::Char('r')]).with_help("r", "refresh"),
                export: Binding::new(vec![KeyCode::Char('e')]).with_help("e", "export"),
                quit: Binding::new(vec![KeyCode::Char('q')]).with_help("q", "quit"),
            }
        }
    }

    impl KeyMap for TestKeys {
        fn short_help(&self) -> Vec<&Binding> {
            vec![&self.refresh, &self.quit]
        }
        fn full_help(&self) -> Vec<Vec<&Binding>> {
            vec![vec![&self.refresh, &self.export], vec![&self.quit]]
        }
    }

    #[test]
    fn test_short_view_lists_enabled_bindings() {
        let help = Model::new();
        let out = lipgloss::strip_ansi(&help.view(&TestKeys::new()));
        assert_eq!(out, "r refresh • q quit");
    }

    #[test]
    fn test_full_view_renders_columns() {
        let mut help = Model::new();
        help.show_all = true;
        let out = lipgloss::strip_ansi(&help.view(&TestKeys::new()));
        assert!(out.contains("r refresh"));
        assert!(out.contains("e export"));
        assert!(out.contains("q quit"));
    }

    #[test]
    fn test_disabled_bindings_are_hidden() {
        let mut keys = TestKeys::new();
        keys.refresh.set_enabled(false);
        let help = Model::new();
        let out = lipgloss::strip_ansi(&help.view(&keys));
        assert_eq!(out, "q quit");
    }

    #[test]
    fn test_width_truncates_short_view() {
        let help = Model::new().with_width(10);
        let out = lipgloss::strip_ansi(&help.view(&TestKeys::new()));
        assert!(lipgloss::width_visible(&out) <= 10);
    }

    #[test]
    fn test_all_disabled_column_is_dropped() {
        let mut keys = TestKeys::new();
        keys.refresh.set_enabled(false);
        keys.export.set_enabled(false);
        let refs: Vec<&Binding> = vec![&keys.refresh, &keys.export];
        assert!(!should_render_column(&refs));
    }
}
