//! Test helpers shared by the scanner and matcher tests

use std::collections::HashSet;

use super::host::{Format, Host};
use super::registry::ModeRegistry;
use super::scanner::{ScanContext, ScanOptions};
use super::state::{StateTable, NO_STATE};
use super::tags::Tag;

/// A host that records every format it is sent
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub previous: i32,
    pub formats: Vec<Format>,
    pub state: Option<i32>,
}

impl RecordingHost {
    pub fn new(previous: i32) -> Self {
        Self {
            previous,
            ..Default::default()
        }
    }
}

impl Host for RecordingHost {
    fn set_format(&mut self, start: usize, len: usize, tag: Tag) {
        self.formats.push(Format::new(start, len, tag));
    }

    fn previous_block_state(&self) -> i32 {
        self.previous
    }

    fn set_current_block_state(&mut self, state: i32) {
        self.state = Some(state);
    }
}

/// Everything a scan borrows, owned in one place
pub struct Harness {
    pub registry: ModeRegistry,
    pub states: StateTable,
    pub options: ScanOptions,
    pub section_names: HashSet<String>,
    pub language: String,
}

impl Harness {
    pub fn new(language: &str) -> Self {
        Self {
            registry: ModeRegistry::default(),
            states: StateTable::new(language),
            options: ScanOptions::default(),
            section_names: HashSet::new(),
            language: language.to_string(),
        }
    }

    /// Scan one line that follows a line which ended in `previous`
    pub fn scan(&mut self, previous: i32, line: &str) -> (Vec<Format>, i32) {
        let mut host = RecordingHost::new(previous);
        let mut cx = ScanContext::resume(
            &mut host,
            &mut self.registry,
            &mut self.states,
            &self.options,
            &self.section_names,
            &self.language,
        );
        cx.scan_line(line);
        let state = cx.finish();
        assert_eq!(host.state, Some(state));
        (host.formats, state)
    }

    /// Scan consecutive lines, threading the states through
    pub fn scan_lines(&mut self, lines: &[&str]) -> Vec<(Vec<Format>, i32)> {
        let mut previous = NO_STATE;
        let mut out = Vec::new();
        for line in lines {
            let (formats, state) = self.scan(previous, line);
            previous = state;
            out.push((formats, state));
        }
        out
    }
}

/// Text and tag of each format, in the order they were sent
pub fn spans<'a>(line: &'a str, formats: &[Format]) -> Vec<(&'a str, Tag)> {
    formats
        .iter()
        .map(|f| (&line[f.start..f.end()], f.tag))
        .collect()
}
