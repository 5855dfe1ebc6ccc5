//! Loading spinner shown while a table fetch is in flight.
//!
//! The spinner animates by scheduling a tick command after each frame; the
//! tick message carries the owning spinner's ID so that several tables on
//! one screen animate independently. The table component embeds one of
//! these and renders it next to the header whenever its data source is
//! being queried.
//!
//! # Basic Usage
//!
//! ```rust
//! use bubbletea_datatable::spinner::{new, with_spinner, with_style, MINI_DOT};
//! use lipgloss_extras::prelude::*;
//!
//! let spinner = new(&[
//!     with_spinner(MINI_DOT.clone()),
//!     with_style(Style::new().foreground(Color::from("205"))),
//! ]);
//! ```

use bubbletea_rs::{tick as bubbletea_tick, Cmd, Msg};
use lipgloss_extras::prelude::*;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Returns the next unique spinner instance ID.
fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// Animation frames and timing for a spinner.
///
/// # Examples
///
/// ```rust
/// use bubbletea_datatable::spinner::Spinner;
/// use std::time::Duration;
///
/// let custom = Spinner::new(
///     vec!["◐".to_string(), "◓".to_string(), "◑".to_string(), "◒".to_string()],
///     Duration::from_millis(200),
/// );
/// assert_eq!(custom.frames.len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct Spinner {
    /// Animation frames to cycle through.
    pub frames: Vec<String>,
    /// Delay between frames; smaller is faster.
    pub fps: Duration,
}

impl Spinner {
    /// Creates a spinner definition from frames and a frame delay.
    pub fn new(frames: Vec<String>, fps: Duration) -> Self {
        Self { frames, fps }
    }
}

/// Basic line spinner (`|`, `/`, `-`, `\`).
pub static LINE: Lazy<Spinner> = Lazy::new(|| Spinner {
    frames: vec![
        "|".to_string(),
        "/".to_string(),
        "-".to_string(),
        "\\".to_string(),
    ],
    fps: Duration::from_millis(100),
});

/// Braille dot pattern spinner.
pub static DOT: Lazy<Spinner> = Lazy::new(|| Spinner {
    frames: vec![
        "⣾ ".to_string(),
        "⣽ ".to_string(),
        "⣻ ".to_string(),
        "⢿ ".to_string(),
        "⡿ ".to_string(),
        "⣟ ".to_string(),
        "⣯ ".to_string(),
        "⣷ ".to_string(),
    ],
    fps: Duration::from_millis(100),
});

/// Compact braille spinner, the default for table loading.
pub static MINI_DOT: Lazy<Spinner> = Lazy::new(|| Spinner {
    frames: vec![
        "⠋".to_string(),
        "⠙".to_string(),
        "⠹".to_string(),
        "⠸".to_string(),
        "⠼".to_string(),
        "⠴".to_string(),
        "⠦".to_string(),
        "⠧".to_string(),
        "⠇".to_string(),
        "⠏".to_string(),
    ],
    fps: Duration::from_millis(83),
});

/// Three-dot bounce animation.
pub static POINTS: Lazy<Spinner> = Lazy::new(|| Spinner {
    frames: vec![
        "∙∙∙".to_string(),
        "●∙∙".to_string(),
        "∙●∙".to_string(),
        "∙∙●".to_string(),
    ],
    fps: Duration::from_millis(143),
});

/// Text ellipsis animation ("", ".", "..", "...").
pub static ELLIPSIS: Lazy<Spinner> = Lazy::new(|| Spinner {
    frames: vec![
        "".to_string(),
        ".".to_string(),
        "..".to_string(),
        "...".to_string(),
    ],
    fps: Duration::from_millis(333),
});

/// Message advancing a spinner by one frame.
///
/// Carries the owning spinner's ID and a tag; messages with a foreign ID or
/// a stale tag are rejected so forwarded broadcasts cannot speed a spinner
/// up.
#[derive(Debug, Clone)]
pub struct TickMsg {
    /// When the tick fired.
    pub time: std::time::SystemTime,
    /// ID of the spinner this tick belongs to (0 matches any).
    pub id: i64,
    tag: i64,
}

/// Spinner state: the animation definition, style, current frame, and
/// routing identifiers.
#[derive(Debug)]
pub struct Model {
    /// Animation frames and timing.
    pub spinner: Spinner,
    /// Style applied to the rendered frame.
    pub style: Style,
    frame: usize,
    id: i64,
    tag: i64,
}

/// Configuration option for [`new`].
pub enum SpinnerOption {
    /// Sets the animation frames and timing.
    WithSpinner(Spinner),
    /// Sets the render style.
    WithStyle(Box<Style>),
}

impl SpinnerOption {
    fn apply(&self, m: &mut Model) {
        match self {
            SpinnerOption::WithSpinner(spinner) => m.spinner = spinner.clone(),
            SpinnerOption::WithStyle(style) => m.style = style.as_ref().clone(),
        }
    }
}

/// Option: sets the animation frames and timing.
pub fn with_spinner(spinner: Spinner) -> SpinnerOption {
    SpinnerOption::WithSpinner(spinner)
}

/// Option: sets the render style.
pub fn with_style(style: Style) -> SpinnerOption {
    SpinnerOption::WithStyle(Box::new(style))
}

impl Model {
    /// Creates a spinner with the default animation and a fresh instance ID.
    pub fn new() -> Self {
        Self {
            spinner: MINI_DOT.clone(),
            style: Style::new(),
            frame: 0,
            id: next_id(),
            tag: 0,
        }
    }

    /// Creates a spinner from configuration options.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bubbletea_datatable::spinner::{Model, with_spinner, DOT};
    ///
    /// let spinner = Model::new_with_options(&[with_spinner(DOT.clone())]);
    /// assert_eq!(spinner.spinner.frames.len(), 8);
    /// ```
    pub fn new_with_options(opts: &[SpinnerOption]) -> Self {
        let mut m = Self::new();
        for opt in opts {
            opt.apply(&mut m);
        }
        m
    }

    /// Sets the animation (builder pattern).
    pub fn with_spinner(mut self, spinner: Spinner) -> Self {
        self.spinner = spinner;
        self
    }

    /// Sets the render style (builder pattern).
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Returns this spinner's unique instance ID.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Builds a tick message addressed to this spinner.
    pub fn tick_msg(&self) -> TickMsg {
        TickMsg {
            time: std::time::SystemTime::now(),
            id: self.id,
            tag: self.tag,
        }
    }

    /// Schedules the next frame advance as a command.
    ///
    /// Call once when the spinner becomes visible; `update` keeps the loop
    /// going from there.
    pub fn tick(&self) -> Cmd {
        let id = self.id;
        let tag = self.tag;
        let fps = self.spinner.fps;

        bubbletea_tick(fps, move |_| {
            Box::new(TickMsg {
                time: std::time::SystemTime::now(),
                id,
                tag,
            }) as Msg
        })
    }

    /// Advances the animation when a matching tick arrives.
    ///
    /// Ticks addressed to another spinner, or carrying a stale tag, are
    /// ignored and produce no follow-up command.
    pub fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        if let Some(tick_msg) = msg.downcast_ref::<TickMsg>() {
            if tick_msg.id > 0 && tick_msg.id != self.id {
                return None;
            }
            if tick_msg.tag > 0 && tick_msg.tag != self.tag {
                return None;
            }

            self.frame += 1;
            if self.frame >= self.spinner.frames.len() {
                self.frame = 0;
            }

            self.tag += 1;
            return Some(self.tick());
        }

        None
    }

    /// Renders the current frame with the configured style.
    pub fn view(&self) -> String {
        match self.spinner.frames.get(self.frame) {
            Some(frame) => self.style.render(frame),
            None => String::new(),
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates a spinner from configuration options.
///
/// # Examples
///
/// ```rust
/// use bubbletea_datatable::spinner::{new, with_spinner, LINE};
///
/// let spinner = new(&[with_spinner(LINE.clone())]);
/// assert_eq!(spinner.view(), "|");
/// ```
pub fn new(opts: &[SpinnerOption]) -> Model {
    Model::new_with_options(opts)
}
