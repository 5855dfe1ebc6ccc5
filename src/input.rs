//! Single-line text input used by the table's search and filter prompts.
//!
//! A trimmed-down input: prompt, placeholder, editable value with a cursor,
//! and horizontal scrolling when the value outgrows the configured width.
//! The table embeds one of these and forwards key messages to it while in
//! search or filter mode; Enter/Esc handling stays with the table.
//!
//! ```rust
//! use bubbletea_datatable::input::Model;
//! use bubbletea_datatable::Component;
//!
//! let mut input = Model::new().with_prompt("Search: ").with_placeholder("invoice no…");
//! input.focus();
//! assert!(input.focused());
//! assert_eq!(input.value(), "");
//! ```

use crate::key::{self, Binding};
use crate::Component;
use bubbletea_rs::{Cmd, KeyMsg, Msg};
use crossterm::event::KeyCode;
use lipgloss_extras::prelude::*;
use unicode_width::UnicodeWidthChar;

/// Key bindings for in-line editing.
#[derive(Debug, Clone)]
pub struct InputKeyMap {
    /// Move the cursor one character left.
    pub character_backward: Binding,
    /// Move the cursor one character right.
    pub character_forward: Binding,
    /// Jump to the start of the line.
    pub line_start: Binding,
    /// Jump to the end of the line.
    pub line_end: Binding,
    /// Delete the character before the cursor.
    pub delete_character_backward: Binding,
    /// Delete the character under the cursor.
    pub delete_character_forward: Binding,
    /// Delete everything before the cursor.
    pub delete_before_cursor: Binding,
    /// Delete everything from the cursor to the end.
    pub delete_after_cursor: Binding,
}

impl Default for InputKeyMap {
    fn default() -> Self {
        Self {
            character_backward: Binding::new(vec![KeyCode::Left]).with_help("←", "back"),
            character_forward: Binding::new(vec![KeyCode::Right]).with_help("→", "forward"),
            line_start: key::new_binding(vec![
                key::with_keys_str(&["home", "ctrl+a"]),
                key::with_help("home", "line start"),
            ]),
            line_end: key::new_binding(vec![
                key::with_keys_str(&["end", "ctrl+e"]),
                key::with_help("end", "line end"),
            ]),
            delete_character_backward: Binding::new(vec![KeyCode::Backspace])
                .with_help("backspace", "delete back"),
            delete_character_forward: Binding::new(vec![KeyCode::Delete])
                .with_help("del", "delete forward"),
            delete_before_cursor: key::new_binding(vec![
                key::with_keys_str(&["ctrl+u"]),
                key::with_help("ctrl+u", "delete to start"),
            ]),
            delete_after_cursor: key::new_binding(vec![
                key::with_keys_str(&["ctrl+k"]),
                key::with_help("ctrl+k", "delete to end"),
            ]),
        }
    }
}

/// A single-line text input model.
///
/// The value is stored as characters with the cursor as an index into them,
/// which keeps editing operations safe for multi-byte input.
pub struct Model {
    /// Prompt rendered before the value, e.g. `"Search: "`.
    pub prompt: String,
    /// Style for the prompt.
    pub prompt_style: Style,
    /// Style for the typed value.
    pub text_style: Style,
    /// Placeholder shown while the value is empty.
    pub placeholder: String,
    /// Style for the placeholder.
    pub placeholder_style: Style,
    /// Style for the cursor cell while focused.
    pub cursor_style: Style,
    /// Display width in columns; 0 disables horizontal scrolling.
    pub width: usize,
    /// Maximum number of characters accepted; 0 means no limit.
    pub char_limit: usize,
    /// Editing key bindings.
    pub key_map: InputKeyMap,

    value: Vec<char>,
    pos: usize,
    offset: usize,
    focus: bool,
}

impl Model {
    /// Creates an unfocused, empty input.
    pub fn new() -> Self {
        Self {
            prompt: "> ".to_string(),
            prompt_style: Style::new(),
            text_style: Style::new(),
            placeholder: String::new(),
            placeholder_style: Style::new().foreground(Color::from("240")),
            cursor_style: Style::new().reverse(true),
            width: 0,
            char_limit: 0,
            key_map: InputKeyMap::default(),
            value: Vec::new(),
            pos: 0,
            offset: 0,
            focus: false,
        }
    }

    /// Sets the prompt (builder pattern).
    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.prompt = prompt.to_string();
        self
    }

    /// Sets the placeholder (builder pattern).
    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.to_string();
        self
    }

    /// Sets the display width in columns (builder pattern).
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Sets the maximum accepted length (builder pattern).
    pub fn with_char_limit(mut self, limit: usize) -> Self {
        self.char_limit = limit;
        self
    }

    /// Returns the current value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bubbletea_datatable::input::Model;
    ///
    /// let mut input = Model::new();
    /// input.set_value("paid");
    /// assert_eq!(input.value(), "paid");
    /// ```
    pub fn value(&self) -> String {
        self.value.iter().collect()
    }

    /// Replaces the value and moves the cursor to its end.
    pub fn set_value(&mut self, value: &str) {
        self.value = value.chars().collect();
        if self.char_limit > 0 && self.value.len() > self.char_limit {
            self.value.truncate(self.char_limit);
        }
        self.pos = self.value.len();
        self.scroll_to_cursor();
    }

    /// Clears the value and resets the cursor.
    pub fn reset(&mut self) {
        self.value.clear();
        self.pos = 0;
        self.offset = 0;
    }

    /// Returns the cursor position in characters.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Moves the cursor to the start of the line.
    pub fn cursor_start(&mut self) {
        self.pos = 0;
        self.scroll_to_cursor();
    }

    /// Moves the cursor to the end of the line.
    pub fn cursor_end(&mut self) {
        self.pos = self.value.len();
        self.scroll_to_cursor();
    }

    /// Handles a key message while focused.
    ///
    /// Printable characters are inserted at the cursor; editing keys follow
    /// `key_map`. Messages are ignored entirely while blurred. Enter and Esc
    /// are left untouched for the embedding component to interpret.
    pub fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        if !self.focus {
            return None;
        }
        let key_msg = match msg.downcast_ref::<KeyMsg>() {
            Some(k) => k,
            None => return None,
        };

        if self.key_map.character_backward.matches(key_msg) {
            if self.pos > 0 {
                self.pos -= 1;
            }
        } else if self.key_map.character_forward.matches(key_msg) {
            if self.pos < self.value.len() {
                self.pos += 1;
            }
        } else if self.key_map.line_start.matches(key_msg) {
            self.pos = 0;
        } else if self.key_map.line_end.matches(key_msg) {
            self.pos = self.value.len();
        } else if self.key_map.delete_character_backward.matches(key_msg) {
            if self.pos > 0 {
                self.pos -= 1;
                self.value.remove(self.pos);
            }
        } else if self.key_map.delete_character_forward.matches(key_msg) {
            if self.pos < self.value.len() {
                self.value.remove(self.pos);
            }
        } else if self.key_map.delete_before_cursor.matches(key_msg) {
            self.value.drain(..self.pos);
            self.pos = 0;
        } else if self.key_map.delete_after_cursor.matches(key_msg) {
            self.value.truncate(self.pos);
        } else if let KeyCode::Char(c) = key_msg.key {
            if key_msg.modifiers.is_empty()
                || key_msg.modifiers == crossterm::event::KeyModifiers::SHIFT
            {
                if self.char_limit == 0 || self.value.len() < self.char_limit {
                    self.value.insert(self.pos, c);
                    self.pos += 1;
                }
            }
        }

        self.scroll_to_cursor();
        None
    }

    /// Renders the prompt, value (or placeholder), and cursor.
    pub fn view(&self) -> String {
        let prompt = self.prompt_style.clone().inline(true).render(&self.prompt);

        if self.value.is_empty() && !self.placeholder.is_empty() {
            let placeholder = self
                .placeholder_style
                .clone()
                .inline(true)
                .render(&self.placeholder);
            if self.focus {
                let cursor = self.cursor_style.clone().inline(true).render(" ");
                return format!("{}{}{}", prompt, cursor, placeholder);
            }
            return format!("{}{}", prompt, placeholder);
        }

        let (start, end) = self.visible_range();
        let mut rendered = String::new();
        for (i, c) in self.value[start..end].iter().enumerate() {
            let idx = start + i;
            let s = c.to_string();
            if self.focus && idx == self.pos {
                rendered.push_str(&self.cursor_style.clone().inline(true).render(&s));
            } else {
                rendered.push_str(&self.text_style.clone().inline(true).render(&s));
            }
        }
        // Cursor sits past the last character when at the end of the value.
        if self.focus && self.pos >= end {
            rendered.push_str(&self.cursor_style.clone().inline(true).render(" "));
        }

        format!("{}{}", prompt, rendered)
    }

    fn visible_range(&self) -> (usize, usize) {
        if self.width == 0 {
            return (0, self.value.len());
        }
        let end = self.window_end(self.offset);
        (self.offset.min(self.value.len()), end)
    }

    fn window_end(&self, start: usize) -> usize {
        let mut cols = 0usize;
        let mut end = start;
        for c in self.value.iter().skip(start) {
            let w = c.width().unwrap_or(1);
            if cols + w > self.width {
                break;
            }
            cols += w;
            end += 1;
        }
        end
    }

    fn scroll_to_cursor(&mut self) {
        if self.width == 0 {
            self.offset = 0;
            return;
        }
        if self.pos < self.offset {
            self.offset = self.pos;
            return;
        }
        // Walk the window forward until the character under the cursor (or the
        // end-of-value cell) is inside it.
        let target = if self.pos < self.value.len() {
            self.pos + 1
        } else {
            self.pos
        };
        while self.window_end(self.offset) < target && self.offset < self.value.len() {
            self.offset += 1;
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Model {
    fn focus(&mut self) -> Option<Cmd> {
        self.focus = true;
        None
    }

    fn blur(&mut self) {
        self.focus = false;
    }

    fn focused(&self) -> bool {
        self.focus
    }
}
