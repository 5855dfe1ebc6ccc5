//! Key bindings for the table.

use crate::key::{self, Binding, KeyMap};

/// Key bindings for table navigation, selection, and mode changes.
///
/// All bindings are rebindable after construction. Bindings that only
/// apply in one mode (for example [`accept`](TableKeyMap::accept)) are
/// matched by the mode handlers, so overlapping keys across modes are
/// fine.
#[derive(Debug, Clone)]
pub struct TableKeyMap {
    /// Move the cursor up one row.
    pub cursor_up: Binding,
    /// Move the cursor down one row.
    pub cursor_down: Binding,
    /// Jump to the first row of the page.
    pub go_to_start: Binding,
    /// Jump to the last row of the page.
    pub go_to_end: Binding,
    /// Fetch the previous page.
    pub prev_page: Binding,
    /// Fetch the next page.
    pub next_page: Binding,
    /// Toggle selection of the row under the cursor.
    pub toggle_select: Binding,
    /// Select every row on the current page.
    pub select_all: Binding,
    /// Clear the selection.
    pub clear_selection: Binding,
    /// Enter search mode.
    pub search: Binding,
    /// Enter filter mode.
    pub filter: Binding,
    /// Re-run the last fetch.
    pub refresh: Binding,
    /// Trigger the export action, when one is configured.
    pub export: Binding,
    /// Copy the selected rows to the clipboard.
    pub yank: Binding,
    /// Toggle visibility of the Nth column (digit keys).
    pub toggle_column: Binding,
    /// Confirm the current mode input.
    pub accept: Binding,
    /// Leave the current mode without applying.
    pub cancel: Binding,
    /// Move up within a filter option list.
    pub option_up: Binding,
    /// Move down within a filter option list.
    pub option_down: Binding,
    /// Focus the next filterable column.
    pub column_next: Binding,
    /// Focus the previous filterable column.
    pub column_prev: Binding,
    /// Toggle the full help view.
    pub show_help: Binding,
    /// Quit.
    pub quit: Binding,
    /// Quit unconditionally.
    pub force_quit: Binding,
}

impl Default for TableKeyMap {
    fn default() -> Self {
        #[allow(unused_mut)]
        let mut yank = key::new_binding(vec![
            key::with_keys_str(&["y"]),
            key::with_help("y", "copy selection"),
        ]);
        #[cfg(not(feature = "clipboard-support"))]
        yank.set_enabled(false);

        Self {
            cursor_up: key::new_binding(vec![
                key::with_keys_str(&["up", "k"]),
                key::with_help("↑/k", "up"),
            ]),
            cursor_down: key::new_binding(vec![
                key::with_keys_str(&["down", "j"]),
                key::with_help("↓/j", "down"),
            ]),
            go_to_start: key::new_binding(vec![
                key::with_keys_str(&["home", "g"]),
                key::with_help("g/home", "go to start"),
            ]),
            go_to_end: key::new_binding(vec![
                key::with_keys_str(&["end", "G"]),
                key::with_help("G/end", "go to end"),
            ]),
            prev_page: key::new_binding(vec![
                key::with_keys_str(&["pgup", "left", "h"]),
                key::with_help("←/h/pgup", "prev page"),
            ]),
            next_page: key::new_binding(vec![
                key::with_keys_str(&["pgdown", "right", "l"]),
                key::with_help("→/l/pgdn", "next page"),
            ]),
            toggle_select: key::new_binding(vec![
                key::with_keys_str(&[" "]),
                key::with_help("space", "select"),
            ]),
            select_all: key::new_binding(vec![
                key::with_keys_str(&["ctrl+a"]),
                key::with_help("ctrl+a", "select all"),
            ]),
            clear_selection: key::new_binding(vec![
                key::with_keys_str(&["esc"]),
                key::with_help("esc", "clear selection"),
            ]),
            search: key::new_binding(vec![
                key::with_keys_str(&["/"]),
                key::with_help("/", "search"),
            ]),
            filter: key::new_binding(vec![
                key::with_keys_str(&["f"]),
                key::with_help("f", "filter"),
            ]),
            refresh: key::new_binding(vec![
                key::with_keys_str(&["r"]),
                key::with_help("r", "refresh"),
            ]),
            export: key::new_binding(vec![
                key::with_keys_str(&["e"]),
                key::with_help("e", "export"),
            ]),
            yank,
            toggle_column: key::new_binding(vec![
                key::with_keys_str(&["1", "2", "3", "4", "5", "6", "7", "8", "9"]),
                key::with_help("1-9", "toggle column"),
            ]),
            accept: key::new_binding(vec![
                key::with_keys_str(&["enter"]),
                key::with_help("enter", "apply"),
            ]),
            cancel: key::new_binding(vec![
                key::with_keys_str(&["esc"]),
                key::with_help("esc", "cancel"),
            ]),
            option_up: key::new_binding(vec![
                key::with_keys_str(&["up"]),
                key::with_help("↑", "option up"),
            ]),
            option_down: key::new_binding(vec![
                key::with_keys_str(&["down"]),
                key::with_help("↓", "option down"),
            ]),
            column_next: key::new_binding(vec![
                key::with_keys_str(&["right", "tab"]),
                key::with_help("→/tab", "next column"),
            ]),
            column_prev: key::new_binding(vec![
                key::with_keys_str(&["left"]),
                key::with_help("←", "prev column"),
            ]),
            show_help: key::new_binding(vec![
                key::with_keys_str(&["?"]),
                key::with_help("?", "toggle help"),
            ]),
            quit: key::new_binding(vec![
                key::with_keys_str(&["q"]),
                key::with_help("q", "quit"),
            ]),
            force_quit: key::new_binding(vec![
                key::with_keys_str(&["ctrl+c"]),
                key::with_help("ctrl+c", "quit"),
            ]),
        }
    }
}

impl KeyMap for TableKeyMap {
    fn short_help(&self) -> Vec<&Binding> {
        vec![
            &self.cursor_up,
            &self.cursor_down,
            &self.next_page,
            &self.toggle_select,
            &self.search,
            &self.filter,
            &self.show_help,
        ]
    }

    fn full_help(&self) -> Vec<Vec<&Binding>> {
        vec![
            vec![
                &self.cursor_up,
                &self.cursor_down,
                &self.go_to_start,
                &self.go_to_end,
            ],
            vec![
                &self.prev_page,
                &self.next_page,
                &self.toggle_select,
                &self.select_all,
                &self.clear_selection,
            ],
            vec![&self.search, &self.filter, &self.refresh, &self.export, &self.yank],
            vec![&self.toggle_column],
            vec![&self.show_help, &self.quit, &self.force_quit],
        ]
    }
}
