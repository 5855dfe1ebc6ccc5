//! Keybinding definitions shared by all components in this crate.
//!
//! A [`Binding`] couples one or more key presses with help text and an
//! enabled/disabled flag. Components declare their keymaps as structs of
//! bindings, match incoming [`KeyMsg`] values against them in `update`, and
//! hand the same bindings to the help component for rendering.
//!
//! Bindings can be built either with the builder methods:
//!
//! ```rust
//! use bubbletea_datatable::key::Binding;
//! use crossterm::event::KeyCode;
//!
//! let quit = Binding::new(vec![KeyCode::Char('q'), KeyCode::Esc])
//!     .with_help("q", "quit");
//! ```
//!
//! or with the functional options accepted by [`new_binding`], which also
//! understands human-readable key names including modifier combos:
//!
//! ```rust
//! use bubbletea_datatable::key;
//!
//! let force_quit = key::new_binding(vec![
//!     key::with_keys_str(&["ctrl+c"]),
//!     key::with_help("ctrl+c", "force quit"),
//! ]);
//! ```
//!
//! Disabled bindings never match and are skipped by the help view, which
//! lets a component hide context-dependent keys without rebuilding its keymap.

use bubbletea_rs::KeyMsg;
use crossterm::event::{KeyCode, KeyModifiers};

/// A single concrete key press: a key code plus its modifier set.
///
/// `KeyPress` is what a [`Binding`] actually stores. Plain `KeyCode`s convert
/// into presses with no modifiers, so most call sites never name this type.
///
/// # Examples
///
/// ```rust
/// use bubbletea_datatable::key::KeyPress;
/// use crossterm::event::{KeyCode, KeyModifiers};
///
/// let press: KeyPress = KeyCode::Enter.into();
/// assert_eq!(press.code, KeyCode::Enter);
/// assert_eq!(press.mods, KeyModifiers::NONE);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    /// The key code of the press.
    pub code: KeyCode,
    /// Modifier keys held during the press.
    pub mods: KeyModifiers,
}

impl From<KeyCode> for KeyPress {
    fn from(code: KeyCode) -> Self {
        Self {
            code,
            mods: KeyModifiers::NONE,
        }
    }
}

/// Help text for a binding: the key label and a short description.
///
/// The `key` field is the display form (e.g. `"←/h"`), not a parseable key
/// name; the help component renders it verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Help {
    /// Display label for the key(s), e.g. `"↑/k"`.
    pub key: String,
    /// Short description of what the key does, e.g. `"move up"`.
    pub desc: String,
}

/// A keybinding: the set of key presses it responds to, its help text, and
/// whether it is currently enabled.
///
/// # Examples
///
/// ```rust
/// use bubbletea_datatable::key::Binding;
/// use crossterm::event::KeyCode;
///
/// let refresh = Binding::new(vec![KeyCode::Char('r')]).with_help("r", "refresh");
/// assert!(refresh.enabled());
/// assert_eq!(refresh.help().key, "r");
/// ```
#[derive(Debug, Clone)]
pub struct Binding {
    keys: Vec<KeyPress>,
    help: Help,
    disabled: bool,
}

impl Default for Binding {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            help: Help::default(),
            disabled: false,
        }
    }
}

impl Binding {
    /// Creates a binding that responds to the given key codes with no
    /// modifiers.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bubbletea_datatable::key::Binding;
    /// use crossterm::event::KeyCode;
    ///
    /// let up = Binding::new(vec![KeyCode::Up, KeyCode::Char('k')]);
    /// ```
    pub fn new(keys: Vec<KeyCode>) -> Self {
        Self {
            keys: keys.into_iter().map(KeyPress::from).collect(),
            help: Help::default(),
            disabled: false,
        }
    }

    /// Replaces the bound keys (builder pattern).
    pub fn with_keys(mut self, keys: Vec<KeyCode>) -> Self {
        self.keys = keys.into_iter().map(KeyPress::from).collect();
        self
    }

    /// Sets the help label and description (builder pattern).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bubbletea_datatable::key::Binding;
    /// use crossterm::event::KeyCode;
    ///
    /// let b = Binding::new(vec![KeyCode::Char('/')]).with_help("/", "search");
    /// assert_eq!(b.help().desc, "search");
    /// ```
    pub fn with_help(mut self, key: &str, desc: &str) -> Self {
        self.help = Help {
            key: key.to_string(),
            desc: desc.to_string(),
        };
        self
    }

    /// Marks the binding disabled (builder pattern). Disabled bindings never
    /// match and are hidden from help views.
    pub fn with_disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Enables or disables the binding in place.
    ///
    /// Useful for context-dependent keys, e.g. disabling "next page" while on
    /// the last page.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.disabled = !enabled;
    }

    /// Returns `true` when the binding is enabled.
    pub fn enabled(&self) -> bool {
        !self.disabled
    }

    /// Returns the binding's help text.
    pub fn help(&self) -> &Help {
        &self.help
    }

    /// Returns the key presses this binding responds to.
    pub fn keys(&self) -> &[KeyPress] {
        &self.keys
    }

    /// Reports whether the given key message triggers this binding.
    ///
    /// Disabled bindings never match. For character keys bound without
    /// modifiers, an incoming SHIFT modifier is ignored since the character
    /// itself already carries the case (`G` arrives as `Char('G')` + SHIFT).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bubbletea_datatable::key::Binding;
    /// use bubbletea_rs::KeyMsg;
    /// use crossterm::event::{KeyCode, KeyModifiers};
    ///
    /// let quit = Binding::new(vec![KeyCode::Char('q')]).with_help("q", "quit");
    /// let msg = KeyMsg {
    ///     key: KeyCode::Char('q'),
    ///     modifiers: KeyModifiers::NONE,
    /// };
    /// assert!(quit.matches(&msg));
    /// ```
    pub fn matches(&self, msg: &KeyMsg) -> bool {
        if self.disabled {
            return false;
        }
        self.keys.iter().any(|press| {
            if press.code != msg.key {
                return false;
            }
            if press.mods == msg.modifiers {
                return true;
            }
            matches!(press.code, KeyCode::Char(_))
                && press.mods == KeyModifiers::NONE
                && msg.modifiers == KeyModifiers::SHIFT
        })
    }
}

/// A functional option for [`new_binding`].
///
/// Options are produced by [`with_keys`], [`with_keys_str`], [`with_help`],
/// and [`with_disabled`], and applied in order.
pub enum BindingOpt {
    /// Sets the bound keys from key codes.
    WithKeys(Vec<KeyCode>),
    /// Sets the bound keys from parsed key names.
    WithKeysStr(Vec<KeyPress>),
    /// Sets the help label and description.
    WithHelp(Help),
    /// Disables the binding.
    WithDisabled,
}

impl BindingOpt {
    fn apply(self, b: &mut Binding) {
        match self {
            BindingOpt::WithKeys(keys) => {
                b.keys = keys.into_iter().map(KeyPress::from).collect();
            }
            BindingOpt::WithKeysStr(presses) => b.keys = presses,
            BindingOpt::WithHelp(help) => b.help = help,
            BindingOpt::WithDisabled => b.disabled = true,
        }
    }
}

/// Creates a binding from a list of functional options.
///
/// # Examples
///
/// ```rust
/// use bubbletea_datatable::key;
///
/// let prev = key::new_binding(vec![
///     key::with_keys_str(&["pgup", "left", "h"]),
///     key::with_help("←/h", "prev page"),
/// ]);
/// assert!(prev.enabled());
/// ```
pub fn new_binding(opts: Vec<BindingOpt>) -> Binding {
    let mut b = Binding::default();
    for opt in opts {
        opt.apply(&mut b);
    }
    b
}

/// Option: sets the bound keys from raw key codes.
pub fn with_keys(keys: Vec<KeyCode>) -> BindingOpt {
    BindingOpt::WithKeys(keys)
}

/// Option: sets the bound keys from human-readable key names.
///
/// Recognized names include single characters, `"enter"`, `"esc"`, `"tab"`,
/// `"backspace"`, `"delete"`, `"space"`, `"up"`, `"down"`, `"left"`,
/// `"right"`, `"home"`, `"end"`, `"pgup"`, `"pgdown"`, and modifier combos
/// like `"ctrl+c"` or `"alt+enter"`. Unrecognized names are skipped.
pub fn with_keys_str(keys: &[&str]) -> BindingOpt {
    BindingOpt::WithKeysStr(keys.iter().filter_map(|s| parse_key(s)).collect())
}

/// Option: sets the binding's help label and description.
pub fn with_help(key: &str, desc: &str) -> BindingOpt {
    BindingOpt::WithHelp(Help {
        key: key.to_string(),
        desc: desc.to_string(),
    })
}

/// Option: marks the binding disabled.
pub fn with_disabled() -> BindingOpt {
    BindingOpt::WithDisabled
}

/// Reports whether the message triggers the given binding.
///
/// Free-function form of [`Binding::matches`].
pub fn matches_binding(msg: &KeyMsg, binding: &Binding) -> bool {
    binding.matches(msg)
}

/// Reports whether the message triggers any of the given bindings.
///
/// # Examples
///
/// ```rust
/// use bubbletea_datatable::key::{matches, Binding};
/// use bubbletea_rs::KeyMsg;
/// use crossterm::event::{KeyCode, KeyModifiers};
///
/// let up = Binding::new(vec![KeyCode::Up]);
/// let down = Binding::new(vec![KeyCode::Down]);
/// let msg = KeyMsg {
///     key: KeyCode::Down,
///     modifiers: KeyModifiers::NONE,
/// };
/// assert!(matches(&msg, &[&up, &down]));
/// ```
pub fn matches(msg: &KeyMsg, bindings: &[&Binding]) -> bool {
    bindings.iter().any(|b| b.matches(msg))
}

/// The set of key bindings a component exposes to the help view.
///
/// Implemented by every component keymap in this crate. `short_help` feeds
/// the single-line help bar; `full_help` feeds the expanded multi-column
/// view, one inner `Vec` per column.
pub trait KeyMap {
    /// The most important bindings, for the single-line help view.
    fn short_help(&self) -> Vec<&Binding>;
    /// All bindings grouped into columns, for the expanded help view.
    fn full_help(&self) -> Vec<Vec<&Binding>>;
}

/// Parses a single human-readable key name into a key press.
fn parse_key(s: &str) -> Option<KeyPress> {
    let mut mods = KeyModifiers::NONE;
    let mut name = s;

    while let Some((prefix, rest)) = name.split_once('+') {
        match prefix {
            "ctrl" => mods |= KeyModifiers::CONTROL,
            "alt" => mods |= KeyModifiers::ALT,
            "shift" => mods |= KeyModifiers::SHIFT,
            _ => return None,
        }
        name = rest;
    }

    let code = match name {
        "enter" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "delete" | "del" => KeyCode::Delete,
        "insert" => KeyCode::Insert,
        "space" => KeyCode::Char(' '),
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pgup" | "pageup" => KeyCode::PageUp,
        "pgdown" | "pgdn" | "pagedown" => KeyCode::PageDown,
        _ => {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return None,
            }
        }
    };

    Some(KeyPress { code, mods })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_msg(code: KeyCode, mods: KeyModifiers) -> KeyMsg {
        KeyMsg {
            key: code,
            modifiers: mods,
        }
    }

    #[test]
    fn test_binding_matches_plain_key() {
        let b = Binding::new(vec![KeyCode::Char('q'), KeyCode::Esc]);
        assert!(b.matches(&key_msg(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(b.matches(&key_msg(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(!b.matches(&key_msg(KeyCode::Char('x'), KeyModifiers::NONE)));
    }

    #[test]
    fn test_binding_requires_modifiers() {
        let b = new_binding(vec![with_keys_str(&["ctrl+c"])]);
        assert!(b.matches(&key_msg(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!b.matches(&key_msg(KeyCode::Char('c'), KeyModifiers::NONE)));
    }

    #[test]
    fn test_shifted_char_matches_unmodified_binding() {
        // Uppercase keys arrive as Char('G') + SHIFT
        let b = Binding::new(vec![KeyCode::Char('G')]);
        assert!(b.matches(&key_msg(KeyCode::Char('G'), KeyModifiers::SHIFT)));
    }

    #[test]
    fn test_disabled_binding_never_matches() {
        let b = Binding::new(vec![KeyCode::Enter]).with_disabled();
        assert!(!b.matches(&key_msg(KeyCode::Enter, KeyModifiers::NONE)));
        assert!(!b.enabled());
    }

    #[test]
    fn test_set_enabled_round_trip() {
        let mut b = Binding::new(vec![KeyCode::Enter]);
        b.set_enabled(false);
        assert!(!b.matches(&key_msg(KeyCode::Enter, KeyModifiers::NONE)));
        b.set_enabled(true);
        assert!(b.matches(&key_msg(KeyCode::Enter, KeyModifiers::NONE)));
    }

    #[test]
    fn test_parse_named_keys() {
        let b = new_binding(vec![with_keys_str(&["pgup", "left", "h"])]);
        assert_eq!(b.keys().len(), 3);
        assert!(b.matches(&key_msg(KeyCode::PageUp, KeyModifiers::NONE)));
        assert!(b.matches(&key_msg(KeyCode::Left, KeyModifiers::NONE)));
        assert!(b.matches(&key_msg(KeyCode::Char('h'), KeyModifiers::NONE)));
    }

    #[test]
    fn test_parse_skips_unknown_names() {
        let b = new_binding(vec![with_keys_str(&["no-such-key", "q"])]);
        assert_eq!(b.keys().len(), 1);
    }

    #[test]
    fn test_matches_any_of() {
        let up = Binding::new(vec![KeyCode::Up]);
        let down = Binding::new(vec![KeyCode::Down]);
        let msg = key_msg(KeyCode::Up, KeyModifiers::NONE);
        assert!(matches(&msg, &[&up, &down]));
        assert!(matches_binding(&msg, &up));
        assert!(!matches_binding(&msg, &down));
    }

    #[test]
    fn test_help_text() {
        let b = Binding::new(vec![KeyCode::Char('/')]).with_help("/", "search");
        assert_eq!(b.help().key, "/");
        assert_eq!(b.help().desc, "search");
    }
}
