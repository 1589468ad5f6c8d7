//! Display rendering
//!
//! Turns a colored [`HighlightBuffer`] into styled terminal output.
//! Overlapping formats are resolved the way a text widget would: the format
//! sent last wins.

use std::io::Write;

use unicode_width::UnicodeWidthChar;

use crate::buffer::HighlightBuffer;
use crate::error::Result;
use crate::syntax::{Format, StateTable, Style, Theme};
use crate::terminal::Terminal;

/// Display state
#[derive(Debug, Clone)]
pub struct Display {
    theme: Theme,
    /// Whether to show line numbers
    pub show_line_numbers: bool,
    /// Whether to show each line's ending state before the text
    pub show_states: bool,
    /// Tab width for display
    pub tab_width: usize,
    /// Columns available for text, `None` for unlimited
    pub max_cols: Option<usize>,
}

impl Display {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            show_line_numbers: false,
            show_states: false,
            tab_width: 8,
            max_cols: None,
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Calculate width needed for line numbers (including separator)
    fn line_number_width(&self, line_count: usize) -> usize {
        if !self.show_line_numbers {
            return 0;
        }
        let digits = line_count.max(1).to_string().len();
        digits.max(3) + 1
    }

    /// Split a line into runs of equal style
    pub fn segments<'a>(&self, line: &'a str, formats: &[Format]) -> Vec<(Style, &'a str)> {
        let mut styles = vec![Style::default(); line.len()];
        for f in formats {
            let start = find_safe_boundary(line, f.start, false);
            let end = find_safe_boundary(line, f.end(), false);
            if start < end {
                styles[start..end].fill(self.theme.style(f.tag));
            }
        }

        let mut runs = Vec::new();
        let mut run_start = 0;
        for (i, _) in line.char_indices().skip(1) {
            if styles[i] != styles[run_start] {
                runs.push((styles[run_start], &line[run_start..i]));
                run_start = i;
            }
        }
        if run_start < line.len() {
            runs.push((styles[run_start], &line[run_start..]));
        }
        runs
    }

    /// Render every line of `buffer`
    ///
    /// `states` is only consulted when [`show_states`](Self::show_states) is set.
    pub fn render<W: Write>(
        &self,
        terminal: &mut Terminal<W>,
        buffer: &HighlightBuffer,
        states: Option<&StateTable>,
    ) -> Result<()> {
        let lnum_width = self.line_number_width(buffer.line_count());
        for (idx, text) in buffer.lines().iter().enumerate() {
            if lnum_width > 0 {
                terminal.set_dim(true)?;
                terminal.write_str(&format!("{:>width$} ", idx + 1, width = lnum_width - 1))?;
                terminal.set_dim(false)?;
            }
            if self.show_states {
                let shown = match (states, buffer.state(idx)) {
                    (Some(table), Some(n)) => table.show(n),
                    (_, Some(n)) => n.to_string(),
                    (_, None) => "-".to_string(),
                };
                terminal.set_dim(true)?;
                terminal.write_str(&format!("[{}] ", shown))?;
                terminal.set_dim(false)?;
            }
            self.render_line(terminal, text, buffer.formats(idx))?;
            terminal.newline()?;
        }
        terminal.flush()
    }

    /// Render one line, expanding tabs and stopping at `max_cols`
    fn render_line<W: Write>(&self, terminal: &mut Terminal<W>, text: &str, formats: &[Format]) -> Result<()> {
        let mut col = 0;
        for (style, run) in self.segments(text, formats) {
            let (shown, end_col, truncated) = self.expand(run, col);
            if !shown.is_empty() {
                if style.is_default() {
                    terminal.write_str(&shown)?;
                } else {
                    terminal.apply_style(&style)?;
                    terminal.write_str(&shown)?;
                    terminal.reset_attributes()?;
                }
            }
            col = end_col;
            if truncated {
                break;
            }
        }
        Ok(())
    }

    /// Expand tabs in `s` starting at display column `col`
    ///
    /// Returns the text, the column after it, and whether it was cut short.
    fn expand(&self, s: &str, mut col: usize) -> (String, usize, bool) {
        let mut result = String::new();
        let limit = self.max_cols.unwrap_or(usize::MAX);
        for ch in s.chars() {
            let width = match ch {
                '\t' => self.tab_width - col % self.tab_width,
                _ => ch.width().unwrap_or(1),
            };
            if col + width > limit {
                return (result, col, true);
            }
            match ch {
                '\t' => result.extend(std::iter::repeat(' ').take(width)),
                _ => result.push(ch),
            }
            col += width;
        }
        (result, col, false)
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new(Theme::new())
    }
}

/// Find a safe UTF-8 boundary near the given byte offset
/// If forward is true, search forward; otherwise search backward
fn find_safe_boundary(s: &str, offset: usize, forward: bool) -> usize {
    if offset >= s.len() {
        return s.len();
    }
    let mut i = offset;
    while !s.is_char_boundary(i) {
        if forward {
            i += 1;
        } else {
            i -= 1;
        }
    }
    i
}
