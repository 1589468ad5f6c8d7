//! Highlight buffer - lines of text with their formats and ending states
//!
//! A reference [`Host`] for the colorizer. It keeps what a text widget
//! would: one ending state and one list of formats per line. Edits mark
//! lines dirty; recoloring a dirty line continues onto the following lines
//! only while their starting state keeps changing.

use std::path::Path;

use crate::syntax::{Colorizer, Format, Host, Tag, NO_STATE};

/// Ending state of a line that has not been colored since it changed
const UNSCANNED: i32 = i32::MIN;

/// Host view of the line being colored
struct LineHost {
    previous: i32,
    formats: Vec<Format>,
    state: i32,
}

impl Host for LineHost {
    fn set_format(&mut self, start: usize, len: usize, tag: Tag) {
        if len > 0 {
            self.formats.push(Format::new(start, len, tag));
        }
    }

    fn previous_block_state(&self) -> i32 {
        self.previous
    }

    fn set_current_block_state(&mut self, state: i32) {
        self.state = state;
    }
}

/// Lines of text with the colorizer's results for each
#[derive(Debug, Clone)]
pub struct HighlightBuffer {
    lines: Vec<String>,
    states: Vec<i32>,
    formats: Vec<Vec<Format>>,
    /// State table generation the stored states belong to
    generation: Option<u32>,
}

impl HighlightBuffer {
    /// Create a buffer holding `text`, split into lines
    pub fn new(text: &str) -> Self {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        let n = lines.len();
        Self {
            lines,
            states: vec![UNSCANNED; n],
            formats: vec![Vec::new(); n],
            generation: None,
        }
    }

    /// Create a buffer from file contents
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(&content))
    }

    /// Get number of lines
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Get a line by index
    pub fn line(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(String::as_str)
    }

    /// Get all lines
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Formats of a line from its last coloring
    pub fn formats(&self, idx: usize) -> &[Format] {
        self.formats.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ending state of a line, `None` if it has not been colored since it changed
    pub fn state(&self, idx: usize) -> Option<i32> {
        self.states.get(idx).copied().filter(|&n| n != UNSCANNED)
    }

    /// Replace the text of a line
    pub fn set_line(&mut self, idx: usize, text: &str) {
        if let Some(line) = self.lines.get_mut(idx) {
            text.clone_into(line);
            self.states[idx] = UNSCANNED;
        }
    }

    /// Insert a line before `idx`, or append it if `idx` is past the end
    pub fn insert_line(&mut self, idx: usize, text: &str) {
        let idx = idx.min(self.lines.len());
        self.lines.insert(idx, text.to_string());
        self.states.insert(idx, UNSCANNED);
        self.formats.insert(idx, Vec::new());
    }

    /// Delete a line by index
    pub fn delete_line(&mut self, idx: usize) {
        if idx < self.lines.len() {
            self.lines.remove(idx);
            self.states.remove(idx);
            self.formats.remove(idx);
            // The line that moved up has a new predecessor
            if let Some(state) = self.states.get_mut(idx) {
                *state = UNSCANNED;
            }
        }
    }

    /// Forget every state and color every line, first to last
    pub fn recolor_all(&mut self, colorizer: &mut Colorizer) {
        colorizer.force_full_rescan();
        self.generation = Some(colorizer.states().generation());
        for idx in 0..self.lines.len() {
            self.recolor_line(colorizer, idx);
        }
    }

    /// Color line `idx` and as many following lines as its new state affects
    ///
    /// Stops after the first line whose ending state is unchanged, unless the
    /// next line is itself dirty. Returns the number of lines colored.
    pub fn recolor_from(&mut self, colorizer: &mut Colorizer, idx: usize) -> usize {
        if self.generation != Some(colorizer.states().generation()) {
            self.recolor_all(colorizer);
            return self.lines.len();
        }
        let mut count = 0;
        for k in idx..self.lines.len() {
            let old = self.states[k];
            self.recolor_line(colorizer, k);
            count += 1;
            let next_dirty = self.states.get(k + 1) == Some(&UNSCANNED);
            if self.states[k] == old && !next_dirty {
                break;
            }
        }
        count
    }

    /// Color every dirty line and whatever they affect
    ///
    /// Returns the number of lines colored.
    pub fn recolor(&mut self, colorizer: &mut Colorizer) -> usize {
        if self.generation != Some(colorizer.states().generation()) {
            self.recolor_all(colorizer);
            return self.lines.len();
        }
        let mut count = 0;
        let mut k = 0;
        while let Some(first) = (k..self.lines.len()).find(|&i| self.states[i] == UNSCANNED) {
            let n = self.recolor_from(colorizer, first);
            count += n;
            k = first + n;
        }
        count
    }

    fn recolor_line(&mut self, colorizer: &mut Colorizer, idx: usize) {
        let previous = match idx {
            0 => NO_STATE,
            _ => self.states[idx - 1],
        };
        let mut host = LineHost {
            previous,
            formats: Vec::new(),
            state: NO_STATE,
        };
        colorizer.recolor_one_line(&mut host, &self.lines[idx]);
        self.states[idx] = host.state;
        self.formats[idx] = host.formats;
    }
}

impl Default for HighlightBuffer {
    fn default() -> Self {
        Self::new("")
    }
}
