//! Server-paginated data table with filtering, search, selection, and
//! keyed actions.
//!
//! This is the centerpiece component of the crate: a table over a remote
//! collection that only ever holds one page of rows. Everything that
//! changes what is displayed (paging, filters, search, refresh) turns
//! into a backend fetch through the [`DataSource`](crate::datasource::DataSource)
//! the table was built with, and the backend's pagination metadata is
//! taken at face value.
//!
//! ## Architecture Overview
//!
//! - **One page in memory**: `rows` holds the current page only. The
//!   paginator mirrors `current_page`/`total_pages` exactly as reported.
//! - **Strategy replay**: the last fetch strategy (list, filter, search)
//!   is recorded and replayed for paging and refresh, so navigation
//!   never silently drops an applied constraint.
//! - **Stale-response protection**: each dispatch carries a token;
//!   results with an out-of-date token are dropped.
//! - **Mode-driven input**: normal mode navigates and triggers actions,
//!   search mode types a term, filter mode browses dropdowns. Each mode
//!   owns its keys, so bindings may overlap across modes.
//!
//! ## Message Flow
//!
//! The table is embedded, not run: forward every message your program
//! receives to [`Model::update`] and splice [`Model::view`] into your
//! output. Fetches resolve to [`FetchResultMsg`], actions resolve to
//! [`ActionOutcomeMsg`](crate::actions::ActionOutcomeMsg), and both are
//! handled internally. Externally triggered re-fetches go through
//! [`RefreshMsg`].

/// Key bindings and keyboard input handling for table interaction.
///
/// Defines [`TableKeyMap`] with every binding the table reacts to, and
/// wires it into the help system so embedded help views stay accurate
/// when bindings are rebound or disabled.
pub mod keys;

mod fetch;
mod model;
mod rendering;
mod types;

pub use fetch::{FetchResultMsg, FetchStrategy, OptionsLoadedMsg, RefreshMsg};
pub use keys::TableKeyMap;
pub use model::{Mode, Model};
pub use rendering::TableStyles;
pub use types::{
    default_layout, visible_columns, ColumnDef, FilterDescriptor, RenderFn, CELL_PLACEHOLDER,
};

use crate::actions::ActionOutcomeMsg;
use crate::{spinner, Component};
use bubbletea_rs::{Cmd, KeyMsg, Msg, WindowSizeMsg};

impl Model {
    /// Returns the command that fetches the first page and starts the
    /// loading spinner's tick chain. Call this once from your program's
    /// `init` and hand the command to the runtime.
    pub fn init(&mut self) -> Cmd {
        let fetch = self.load(1);
        bubbletea_rs::batch(vec![fetch, self.spinner.tick()])
    }

    /// Routes a message through the table.
    ///
    /// Handles fetch results, refresh generations, action outcomes,
    /// option loads, spinner ticks, window sizing, and keyboard input.
    /// Messages the table does not recognize are ignored, so it is safe
    /// to forward everything.
    pub fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        // Expired notices drop out on whatever message arrives next.
        self.notices.sweep();

        if let Some(result) = msg.downcast_ref::<FetchResultMsg>() {
            return self.handle_fetch_result(result);
        }
        if let Some(refresh) = msg.downcast_ref::<RefreshMsg>() {
            return self.set_refresh_key(refresh.key);
        }
        if let Some(outcome) = msg.downcast_ref::<ActionOutcomeMsg>() {
            return self.handle_action_outcome(outcome);
        }
        if let Some(loaded) = msg.downcast_ref::<OptionsLoadedMsg>() {
            return self.handle_options_loaded(loaded);
        }
        if msg.downcast_ref::<spinner::TickMsg>().is_some() {
            return self.spinner.update(msg);
        }
        if let Some(size) = msg.downcast_ref::<WindowSizeMsg>() {
            self.width = (size.width as usize).max(20);
            self.help.set_width(size.width as usize);
            return None;
        }
        if let Some(key_msg) = msg.downcast_ref::<KeyMsg>() {
            return match self.mode {
                Mode::Normal => self.update_normal(key_msg),
                Mode::Search => self.update_search(key_msg),
                Mode::Filter => self.update_filter(key_msg),
            };
        }
        None
    }

    /// Renders the table: mode line, rows, footer with counts and
    /// pagination, and contextual help.
    pub fn view(&self) -> String {
        let mut sections = Vec::new();
        let mode_line = self.view_mode_line();
        if !mode_line.is_empty() {
            sections.push(mode_line);
        }
        sections.push(self.view_table());
        sections.push(self.view_footer());
        sections.join("\n")
    }

    fn update_normal(&mut self, key_msg: &KeyMsg) -> Option<Cmd> {
        if self.keymap.force_quit.matches(key_msg) || self.keymap.quit.matches(key_msg) {
            return Some(bubbletea_rs::quit());
        }
        if self.keymap.cursor_up.matches(key_msg) {
            self.move_cursor_up();
        } else if self.keymap.cursor_down.matches(key_msg) {
            self.move_cursor_down();
        } else if self.keymap.go_to_start.matches(key_msg) {
            self.cursor = 0;
        } else if self.keymap.go_to_end.matches(key_msg) {
            self.cursor = self.rows.len().saturating_sub(1);
        } else if self.keymap.prev_page.matches(key_msg) {
            if !self.paginator.on_first_page() {
                let page = self.paginator.current_page - 1;
                return Some(self.goto_page(page));
            }
        } else if self.keymap.next_page.matches(key_msg) {
            if !self.paginator.on_last_page() {
                let page = self.paginator.current_page + 1;
                return Some(self.goto_page(page));
            }
        } else if self.keymap.toggle_select.matches(key_msg) {
            self.toggle_row(self.cursor);
        } else if self.keymap.select_all.matches(key_msg) {
            self.select_all();
        } else if self.keymap.clear_selection.matches(key_msg) {
            self.clear_selection();
        } else if self.keymap.search.matches(key_msg) {
            self.mode = Mode::Search;
            self.input.reset();
            return self.input.focus();
        } else if self.keymap.filter.matches(key_msg) {
            if self.filterable_indices().is_empty() {
                self.notices.info("No filters available");
                return None;
            }
            self.mode = Mode::Filter;
            self.filter_index = 0;
            self.option_index = 0;
            self.input.reset();
            let blink = self.input.focus();
            // Loading dropdown options outranks the cursor blink command.
            return self.ensure_options_cmd().or(blink);
        } else if self.keymap.refresh.matches(key_msg) {
            return Some(self.refresh());
        } else if self.keymap.export.matches(key_msg) {
            if let Some(action) = &self.export_action {
                return Some(action.command(&self.current_params()));
            }
        } else if self.keymap.yank.matches(key_msg) {
            self.yank_selection();
        } else if self.keymap.toggle_column.matches(key_msg) {
            if let crossterm::event::KeyCode::Char(digit) = key_msg.key {
                let index = digit.to_digit(10).unwrap_or(0) as usize;
                if let Some(key) = index
                    .checked_sub(1)
                    .and_then(|i| self.columns.get(i))
                    .map(|c| c.key.clone())
                {
                    self.toggle_column(&key);
                }
            }
        } else if self.keymap.show_help.matches(key_msg) {
            self.help.show_all = !self.help.show_all;
        } else {
            return self.dispatch_action(key_msg);
        }
        None
    }

    fn update_search(&mut self, key_msg: &KeyMsg) -> Option<Cmd> {
        if self.keymap.cancel.matches(key_msg) {
            self.mode = Mode::Normal;
            self.input.blur();
            self.input.reset();
            return None;
        }
        if self.keymap.accept.matches(key_msg) {
            let term = self.input.value();
            self.mode = Mode::Normal;
            self.input.blur();
            self.input.reset();
            return Some(self.search(&term));
        }
        let forwarded = Box::new(KeyMsg {
            key: key_msg.key,
            modifiers: key_msg.modifiers,
        }) as Msg;
        self.input.update(&forwarded)
    }

    fn update_filter(&mut self, key_msg: &KeyMsg) -> Option<Cmd> {
        if self.keymap.cancel.matches(key_msg) {
            self.mode = Mode::Normal;
            self.input.blur();
            self.input.reset();
            return None;
        }
        if self.keymap.accept.matches(key_msg) {
            let options = self.active_filter_options();
            let value = options.get(self.option_index)?.value.clone();
            if let Some(filter) = self.focused_filter_mut() {
                filter.toggle(&value);
            }
            self.input.set_value("");
            self.clamp_option_index();
            // The panel stays open so several filters can be combined.
            return Some(self.apply_filters());
        }
        if self.keymap.column_next.matches(key_msg) {
            self.focus_filter_step(1);
            return self.ensure_options_cmd();
        }
        if self.keymap.column_prev.matches(key_msg) {
            self.focus_filter_step(-1);
            return self.ensure_options_cmd();
        }
        if self.keymap.option_up.matches(key_msg) {
            self.option_index = self.option_index.saturating_sub(1);
            return None;
        }
        if self.keymap.option_down.matches(key_msg) {
            self.option_index += 1;
            self.clamp_option_index();
            return None;
        }
        let forwarded = Box::new(KeyMsg {
            key: key_msg.key,
            modifiers: key_msg.modifiers,
        }) as Msg;
        let cmd = self.input.update(&forwarded);
        self.clamp_option_index();
        cmd
    }

    fn dispatch_action(&self, key_msg: &KeyMsg) -> Option<Cmd> {
        for action in &self.row_actions {
            if action.binding.matches(key_msg) {
                if let Some(row) = self.rows.get(self.cursor) {
                    return action.dispatch(row);
                }
            }
        }
        for action in &self.bulk_actions {
            if action.binding.matches(key_msg) && action.visible(&self.rows, &self.selected) {
                return action.dispatch(&self.rows, &self.selected);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests;
