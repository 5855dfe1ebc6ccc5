//! Transient status notifications.
//!
//! The table surfaces fetch failures and action results through a short
//! lived message line. Each notification carries its own expiry deadline
//! and [`Model::sweep`] drops it once the deadline passes. The table
//! sweeps at the top of every update, so expiry rides the normal message
//! flow instead of occupying a command slot that a fetch may need.

use lipgloss_extras::prelude::*;
use std::time::{Duration, Instant};

/// How loudly a notification should read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Neutral progress or status text.
    Info,
    /// A completed action.
    Success,
    /// A failed fetch or action.
    Error,
}

/// Styles for each severity level.
#[derive(Debug, Clone)]
pub struct Styles {
    /// Style for [`Severity::Info`].
    pub info: Style,
    /// Style for [`Severity::Success`].
    pub success: Style,
    /// Style for [`Severity::Error`].
    pub error: Style,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            info: Style::new().foreground(AdaptiveColor {
                Light: "#0087D7",
                Dark: "#5FAFFF",
            }),
            success: Style::new().foreground(AdaptiveColor {
                Light: "#008700",
                Dark: "#5FD700",
            }),
            error: Style::new().foreground(AdaptiveColor {
                Light: "#D70000",
                Dark: "#FF5F5F",
            }),
        }
    }
}

#[derive(Debug, Clone)]
struct Notice {
    severity: Severity,
    text: String,
    expires_at: Instant,
}

/// A single-slot notification area.
///
/// A newer message supersedes whatever is on screen, deadline included.
///
/// # Examples
///
/// ```rust
/// use bubbletea_datatable::notification::{Model, Severity};
///
/// let mut notices = Model::new();
/// notices.notify(Severity::Error, "Failed to fetch data");
/// assert!(notices.is_visible());
/// assert_eq!(notices.message(), Some("Failed to fetch data"));
/// ```
#[derive(Debug, Clone)]
pub struct Model {
    /// How long a message stays visible.
    pub ttl: Duration,
    /// Severity styles.
    pub styles: Styles,
    current: Option<Notice>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5),
            styles: Styles::default(),
            current: None,
        }
    }
}

impl Model {
    /// Creates an empty notification area with a 5 second TTL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message TTL (builder pattern).
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Shows a message until its deadline passes or a newer one replaces
    /// it.
    pub fn notify(&mut self, severity: Severity, text: impl Into<String>) {
        self.current = Some(Notice {
            severity,
            text: text.into(),
            expires_at: Instant::now() + self.ttl,
        });
    }

    /// Shows an informational message.
    pub fn info(&mut self, text: impl Into<String>) {
        self.notify(Severity::Info, text);
    }

    /// Shows a success message.
    pub fn success(&mut self, text: impl Into<String>) {
        self.notify(Severity::Success, text);
    }

    /// Shows an error message.
    pub fn error(&mut self, text: impl Into<String>) {
        self.notify(Severity::Error, text);
    }

    /// Drops the current message once its deadline has passed.
    ///
    /// Returns `true` when a message was dropped.
    pub fn sweep(&mut self) -> bool {
        match &self.current {
            Some(notice) if Instant::now() >= notice.expires_at => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    /// Clears the current message immediately.
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Returns `true` while a message is on screen.
    pub fn is_visible(&self) -> bool {
        self.current.is_some()
    }

    /// Returns the current message text, if any.
    pub fn message(&self) -> Option<&str> {
        self.current.as_ref().map(|notice| notice.text.as_str())
    }

    /// Returns the current message severity, if any.
    pub fn severity(&self) -> Option<Severity> {
        self.current.as_ref().map(|notice| notice.severity)
    }

    /// Renders the current message, or an empty string.
    pub fn view(&self) -> String {
        match &self.current {
            Some(notice) => {
                let style = match notice.severity {
                    Severity::Info => &self.styles.info,
                    Severity::Success => &self.styles.success,
                    Severity::Error => &self.styles.error,
                };
                style.render(&notice.text)
            }
            None => String::new(),
        }
    }
}
