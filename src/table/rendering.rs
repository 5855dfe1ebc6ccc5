//! View rendering for the data table.
//!
//! The view is assembled from four stacked sections: a mode line (search
//! prompt or filter panel, only outside normal mode), the table itself,
//! a footer with record counts and pagination, and contextual help.

use super::model::{Mode, Model};
use super::types::ColumnDef;
use lipgloss_extras::prelude::*;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "…";

/// Widest a content-sized column is allowed to grow.
const MAX_COLUMN_WIDTH: usize = 32;

/// Styling for every visual element of the table.
///
/// All defaults use `AdaptiveColor` so the table stays readable in both
/// light and dark terminals.
#[derive(Debug, Clone)]
pub struct TableStyles {
    /// Style for the header row.
    pub header: Style,
    /// Style for rows in the current selection.
    pub selected: Style,
    /// Style for the row under the cursor.
    pub cursor_row: Style,
    /// Style for the footer counts and pagination line.
    pub footer: Style,
    /// Style for the empty-page message.
    pub empty: Style,
    /// Style for mode prompts (search and filter headers).
    pub prompt: Style,
    /// Style for the highlighted entry in a filter option list.
    pub option_cursor: Style,
}

impl Default for TableStyles {
    fn default() -> Self {
        let subdued = AdaptiveColor {
            Light: "#A49FA5",
            Dark: "#777777",
        };
        Self {
            header: Style::new().bold(true),
            selected: Style::new().foreground(AdaptiveColor {
                Light: "#EE6FF8",
                Dark: "#EE6FF8",
            }),
            cursor_row: Style::new().reverse(true),
            footer: Style::new().foreground(subdued),
            empty: Style::new().foreground(AdaptiveColor {
                Light: "#909090",
                Dark: "#626262",
            }),
            prompt: Style::new().foreground(AdaptiveColor {
                Light: "#04B575",
                Dark: "#ECFD65",
            }),
            option_cursor: Style::new().reverse(true),
        }
    }
}

impl Model {
    pub(super) fn view_mode_line(&self) -> String {
        match self.mode {
            Mode::Normal => String::new(),
            Mode::Search => format!(
                "{} {}",
                self.styles.prompt.clone().render("Search:"),
                self.input.view()
            ),
            Mode::Filter => self.view_filter_panel(),
        }
    }

    fn view_filter_panel(&self) -> String {
        let Some(label) = self.focused_filter_label() else {
            return self.styles.empty.clone().render("No filters configured");
        };
        let count = self.filterable_indices().len();
        let header = format!("Filter: {} ({}/{})", label, self.filter_index + 1, count);

        let mut lines = vec![self.styles.prompt.clone().render(&header)];
        lines.push(format!("  {}", self.input.view()));

        let options = self.active_filter_options();
        if options.is_empty() {
            lines.push(self.styles.empty.clone().render("  no options"));
            return lines.join("\n");
        }

        let window = 8usize;
        let start = if options.len() <= window {
            0
        } else {
            self.option_index
                .saturating_sub(window / 2)
                .min(options.len() - window)
        };
        let descriptor = self.focused_filter();
        for (i, option) in options.iter().enumerate().skip(start).take(window) {
            let marked = descriptor.is_some_and(|f| f.is_selected(&option.value));
            let marker = if marked { "[x]" } else { "[ ]" };
            let line = format!("  {} {}", marker, option.label);
            if i == self.option_index {
                lines.push(self.styles.option_cursor.clone().render(&line));
            } else {
                lines.push(line);
            }
        }
        lines.join("\n")
    }

    pub(super) fn view_table(&self) -> String {
        let visible = self.visible();
        if visible.is_empty() {
            return self.styles.empty.clone().render(&self.empty_message);
        }
        let widths = self.column_widths(&visible);

        let mut lines = Vec::new();
        let header_cells: Vec<String> = visible
            .iter()
            .zip(&widths)
            .map(|(col, width)| pad_to_width(&col.label, *width))
            .collect();
        // Six-column gutter matches the cursor and selection markers below.
        lines.push(
            self.styles
                .header
                .clone()
                .render(&format!("      {}", header_cells.join("  "))),
        );

        if self.rows.is_empty() {
            lines.push(self.styles.empty.clone().render(&self.empty_message));
            return lines.join("\n");
        }

        for (i, row) in self.rows.iter().enumerate() {
            let cursor_mark = if i == self.cursor { "> " } else { "  " };
            let select_mark = if self.selected.contains(&i) {
                "[x] "
            } else {
                "[ ] "
            };
            let cells: Vec<String> = visible
                .iter()
                .zip(&widths)
                .map(|(col, width)| pad_to_width(&col.display_value(row), *width))
                .collect();
            let line = format!("{}{}{}", cursor_mark, select_mark, cells.join("  "));
            let styled = if i == self.cursor {
                self.styles.cursor_row.clone().render(&line)
            } else if self.selected.contains(&i) {
                self.styles.selected.clone().render(&line)
            } else {
                line
            };
            lines.push(styled);
        }
        lines.join("\n")
    }

    pub(super) fn view_footer(&self) -> String {
        let counts = if self.rows.is_empty() {
            format!("0 of {}", self.total_records)
        } else {
            let start = (self.paginator.current_page - 1) * self.page_size + 1;
            let end = start + self.rows.len() - 1;
            format!("{}-{} of {}", start, end, self.total_records)
        };

        let mut status = format!("{}  {}", counts, self.paginator.view());
        if !self.selected.is_empty() {
            status.push_str(&format!("  {} selected", self.selected.len()));
        }
        if self.loading {
            status.push_str(&format!("  {}", self.spinner.view()));
        }

        let mut parts = vec![self.styles.footer.clone().render(&status)];
        if self.notices.is_visible() {
            parts.push(self.notices.view());
        }
        let help_view = self.help.view(&self.keymap);
        if !help_view.is_empty() {
            parts.push(help_view);
        }
        parts.join("\n")
    }

    fn column_widths(&self, visible: &[&ColumnDef]) -> Vec<usize> {
        visible
            .iter()
            .map(|col| {
                if let Some(width) = col.width {
                    return width;
                }
                let mut max = col.label.width();
                for row in &self.rows {
                    max = max.max(col.display_value(row).width());
                }
                max.min(MAX_COLUMN_WIDTH)
            })
            .collect()
    }

    /// The selected rows (or the hovered row when nothing is selected)
    /// as tab-separated text, one line per row, visible columns only.
    pub fn selection_tsv(&self) -> String {
        let visible = self.visible();
        let mut indices: Vec<usize> = self.selected.iter().copied().collect();
        indices.sort_unstable();
        if indices.is_empty() && !self.rows.is_empty() {
            indices.push(self.cursor);
        }
        let lines: Vec<String> = indices
            .into_iter()
            .filter_map(|i| self.rows.get(i))
            .map(|row| {
                visible
                    .iter()
                    .map(|col| col.display_value(row))
                    .collect::<Vec<String>>()
                    .join("\t")
            })
            .collect();
        lines.join("\n")
    }

    pub(super) fn yank_selection(&mut self) {
        let text = self.selection_tsv();
        if text.is_empty() {
            self.notices.info("Nothing to copy");
            return;
        }
        let count = text.lines().count();

        #[cfg(feature = "clipboard-support")]
        {
            use clipboard::{ClipboardContext, ClipboardProvider};
            let result: Result<(), String> = (|| {
                let mut ctx: ClipboardContext = ClipboardProvider::new()
                    .map_err(|e| format!("Failed to create clipboard context: {}", e))?;
                ctx.set_contents(text.clone())
                    .map_err(|e| format!("Failed to write clipboard: {}", e))
            })();
            match result {
                Ok(()) => {
                    if count == 1 {
                        self.notices.success("Copied 1 row");
                    } else {
                        self.notices.success(format!("Copied {} rows", count));
                    }
                }
                Err(err) => self.notices.error(err),
            }
        }

        #[cfg(not(feature = "clipboard-support"))]
        {
            let _ = count;
            self.notices.info("Clipboard support not enabled");
        }
    }
}

fn truncate_to_width(text: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push_str(ELLIPSIS);
    out
}

fn pad_to_width(text: &str, width: usize) -> String {
    let truncated = truncate_to_width(text, width);
    let pad = width.saturating_sub(truncated.width());
    format!("{}{}", truncated, " ".repeat(pad))
}
