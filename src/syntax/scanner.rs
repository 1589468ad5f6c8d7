//! The line scanner
//!
//! A [`ScanContext`] holds everything that changes while one line is being
//! colored: the active mode, the delegate stack and the state the line will
//! end in. Rules receive it by `&mut` and report back with a
//! [`MatchResult`]; they never touch the host directly.

use std::collections::HashSet;
use std::rc::Rc;

use log::{debug, trace};

use super::directives;
use super::host::Host;
use super::matchers;
use super::mode::Mode;
use super::registry::{qualified_name, ModeRegistry};
use super::rules::{char_at, MatchResult};
use super::state::{Continuation, StateTable, NO_STATE};
use super::tags::Tag;

/// Settings that affect scanning rather than mode construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Scan doc parts with the `rest` rules instead of a flat `docpart` tag
    pub doc_parts_as_rest: bool,
    /// Deepest delegate nesting allowed on one line
    pub max_delegate_depth: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            doc_parts_as_rest: false,
            max_delegate_depth: 16,
        }
    }
}

/// An outer mode paused while a delegate colors part of the line
#[derive(Debug)]
struct DelegateFrame {
    mode: Rc<Mode>,
    language: String,
    state: i32,
    initial_state: i32,
    suppressed: bool,
}

/// Per-line scanning state
pub struct ScanContext<'a> {
    host: &'a mut dyn Host,
    registry: &'a mut ModeRegistry,
    states: &'a mut StateTable,
    options: &'a ScanOptions,
    section_names: &'a HashSet<String>,
    mode: Rc<Mode>,
    /// The active language; for placeholder modes, the name that was asked for
    language: String,
    delegates: Vec<DelegateFrame>,
    state: i32,
    /// State for "no continuation" in the active mode
    initial_state: i32,
    /// Set while the current state forbids coloring
    suppressed: bool,
}

impl<'a> ScanContext<'a> {
    /// Start scanning in the initial state of `mode_name`
    pub fn new(
        host: &'a mut dyn Host,
        registry: &'a mut ModeRegistry,
        states: &'a mut StateTable,
        options: &'a ScanOptions,
        section_names: &'a HashSet<String>,
        mode_name: &str,
    ) -> Self {
        let mode = registry.init_mode(mode_name);
        let language = if mode.is_unknown() {
            registry.ruleset_for(mode_name).0
        } else {
            mode.language.clone()
        };
        let initial_state = states.intern(&language, &mode.ruleset, None);
        Self {
            host,
            registry,
            states,
            options,
            section_names,
            mode,
            language,
            delegates: Vec::new(),
            state: initial_state,
            initial_state,
            suppressed: false,
        }
    }

    /// Pick up where the host's previous line left off
    ///
    /// A previous state this table never issued counts as a fresh start in
    /// `fallback_language`.
    pub fn resume(
        host: &'a mut dyn Host,
        registry: &'a mut ModeRegistry,
        states: &'a mut StateTable,
        options: &'a ScanOptions,
        section_names: &'a HashSet<String>,
        fallback_language: &str,
    ) -> Self {
        let previous = host.previous_block_state();
        let name = states
            .entry(previous)
            .map(|entry| qualified_name(&entry.language, &entry.ruleset));
        match name {
            Some(name) => {
                let mut cx = Self::new(host, registry, states, options, section_names, &name);
                cx.set_state(previous);
                cx
            }
            None => {
                if previous != NO_STATE {
                    debug!("state {} is not in this generation; starting fresh", previous);
                }
                Self::new(host, registry, states, options, section_names, fallback_language)
            }
        }
    }

    pub fn mode(&self) -> &Rc<Mode> {
        &self.mode
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn state(&self) -> i32 {
        self.state
    }

    pub fn options(&self) -> &ScanOptions {
        self.options
    }

    pub fn delegate_depth(&self) -> usize {
        self.delegates.len()
    }

    /// True if the current state forbids coloring
    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// True if `name` is an alias or spelling of the active language
    pub fn is_active_language(&self, name: &str) -> bool {
        self.registry.canonical_language(name) == self.language
    }

    /// The continuation the current state will run on the next line
    pub fn continuation(&self) -> Option<&Continuation> {
        self.states.resolve(self.state)
    }

    /// True if a section reference to `name` resolves
    pub fn is_section_name(&self, name: &str) -> bool {
        self.section_names.contains(name)
    }

    /// True if `c` belongs to words in the active mode
    pub fn is_word_char(&self, c: char) -> bool {
        self.mode.is_word_char(c)
    }

    pub fn set_state(&mut self, n: i32) {
        self.state = n;
        self.suppressed = self.states.suppresses_coloring(n);
    }

    /// Make `restart` run first on the next line
    pub fn set_restart(&mut self, restart: Continuation) -> i32 {
        let n = self.states.intern(&self.language, &self.mode.ruleset, Some(restart));
        self.set_state(n);
        n
    }

    /// Return to the active mode's initial state
    pub fn clear_state(&mut self) {
        self.set_state(self.initial_state);
    }

    /// Make `name` the active language, in its initial state
    ///
    /// Returns false, changing nothing, if the language has no rules.
    pub fn switch_language(&mut self, name: &str) -> bool {
        let mode = self.registry.init_mode(name);
        if mode.is_unknown() {
            return false;
        }
        self.enter(mode);
        true
    }

    fn enter(&mut self, mode: Rc<Mode>) {
        self.language = mode.language.clone();
        self.initial_state = self.states.intern(&self.language, &mode.ruleset, None);
        self.mode = mode;
        self.clear_state();
    }

    /// Pause the active mode and make the delegate `name` active
    ///
    /// Refused when the stack is full, when `name` has no rules, or when it
    /// names the mode that is already active.
    pub fn push_delegate(&mut self, name: &str) -> bool {
        if self.delegates.len() >= self.options.max_delegate_depth {
            debug!("delegate {} refused at depth {}", name, self.delegates.len());
            return false;
        }
        let mode = self.registry.init_mode(name);
        if mode.is_unknown() || Rc::ptr_eq(&mode, &self.mode) {
            return false;
        }
        self.delegates.push(DelegateFrame {
            mode: Rc::clone(&self.mode),
            language: self.language.clone(),
            state: self.state,
            initial_state: self.initial_state,
            suppressed: self.suppressed,
        });
        self.enter(mode);
        true
    }

    /// Resume the most recently paused mode
    ///
    /// Whatever state the delegate reached is dropped.
    pub fn pop_delegate(&mut self) -> bool {
        let Some(frame) = self.delegates.pop() else {
            debug!("pop_delegate with no delegate active");
            return false;
        };
        self.mode = frame.mode;
        self.language = frame.language;
        self.state = frame.state;
        self.initial_state = frame.initial_state;
        self.suppressed = frame.suppressed;
        true
    }

    /// Color `line[i..j]`, or rescan it with a delegate's rules
    ///
    /// Nothing happens while coloring is suppressed. A refused delegate
    /// falls back to `tag`. URLs inside the range are recolored afterwards.
    pub fn color_range(
        &mut self,
        line: &str,
        i: usize,
        j: usize,
        tag: Tag,
        delegate: Option<&str>,
        exclude_match: bool,
    ) {
        if self.suppressed {
            return;
        }
        let j = floor_boundary(line, j.min(line.len()));
        if i >= j {
            return;
        }
        match delegate.filter(|d| !d.is_empty()) {
            Some(name) if self.push_delegate(name) => {
                let default_tag = self.mode.default_color();
                self.run_rules(&line[..j], i, Some(default_tag));
                self.pop_delegate();
            }
            _ => {
                if !exclude_match {
                    self.set_tag(line, i, j, tag);
                }
            }
        }
        if tag != Tag::Url {
            self.color_urls(line, i, j);
        }
    }

    /// Send one range to the host
    pub fn set_tag(&mut self, line: &str, i: usize, j: usize, tag: Tag) {
        if tag.is_null() || self.suppressed {
            return;
        }
        let j = j.min(line.len());
        if i >= j {
            return;
        }
        trace!("{:>3} {:>3} {:<12} {:?}", i, j, tag.name(), &line[i..j]);
        self.host.set_format(i, j - i, tag);
    }

    fn color_urls(&mut self, line: &str, i: usize, j: usize) {
        let mut k = i;
        while k < j {
            let Some(c) = char_at(line, k) else {
                break;
            };
            let n = match c.to_ascii_lowercase() {
                'u' => directives::unl_len(line, k),
                'f' | 'g' | 'h' | 'm' | 'n' | 'p' | 't' | 'w' => directives::url_len(line, k),
                _ => 0,
            };
            if n > 0 {
                self.set_tag(line, k, k + n, Tag::Url);
                k += n;
            } else {
                k += c.len_utf8();
            }
        }
    }

    /// Color one line
    ///
    /// The continuation named by the current state runs first, then the
    /// active mode's rules take over wherever it stopped.
    pub fn scan_line(&mut self, line: &str) {
        trace!("{} {:?}", self.states.show(self.state), line);
        let start = match self.states.resolve(self.state).cloned() {
            Some(restart) => self.restart(line, restart),
            None => 0,
        };
        self.run_rules(line, start, None);
    }

    /// Run a continuation; returns where the rules take over
    fn restart(&mut self, line: &str, restart: Continuation) -> usize {
        match restart {
            Continuation::Span(span) => matchers::restart_span(self, line, &span),
            Continuation::Color => directives::restart_color(self, line),
            Continuation::NoColor => directives::restart_no_color(self, line),
            // Absorbing until the next full rescan
            Continuation::NoColorNode | Continuation::KillColor => line.len() + 1,
            Continuation::DocPart { resume } => directives::restart_doc_part(self, line, resume.as_deref()),
        }
    }

    /// The main loop
    ///
    /// `default_tag` colors whatever no rule claims; it is only set inside
    /// delegated ranges.
    fn run_rules(&mut self, line: &str, start: usize, default_tag: Option<Tag>) {
        let mut i = start;
        while i < line.len() {
            let Some(c) = char_at(line, i) else {
                break;
            };
            // A rule may switch modes under us
            let mode = Rc::clone(&self.mode);
            let mut result = MatchResult::NoMatch;
            for rule in mode.rules_for(c) {
                match rule.try_match(self, line, i) {
                    MatchResult::NoMatch | MatchResult::Matched(0) | MatchResult::Skip(0) => {}
                    found => {
                        result = found;
                        break;
                    }
                }
            }
            let next = match result {
                MatchResult::Matched(n) => i + n,
                MatchResult::Skip(n) => {
                    if let Some(tag) = default_tag {
                        self.set_tag(line, i, i + n, tag);
                    }
                    i + n
                }
                MatchResult::NoMatch => {
                    let n = c.len_utf8();
                    if let Some(tag) = default_tag {
                        self.set_tag(line, i, i + n, tag);
                    }
                    i + n
                }
            };
            i = ceil_boundary(line, next);
        }
    }

    /// Store the ending state with the host and return it
    pub fn finish(mut self) -> i32 {
        while !self.delegates.is_empty() {
            debug!("delegate left active at end of line");
            self.pop_delegate();
        }
        self.host.set_current_block_state(self.state);
        self.state
    }
}

fn floor_boundary(line: &str, mut i: usize) -> usize {
    while i > 0 && !line.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_boundary(line: &str, mut i: usize) -> usize {
    while i < line.len() && !line.is_char_boundary(i) {
        i += 1;
    }
    i
}
