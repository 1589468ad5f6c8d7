//! The colorizer a host drives
//!
//! One [`Colorizer`] per document. It owns the mode cache, the state table
//! and whatever was derived from the selected node: whether coloring is
//! enabled, the initial language and the section names that resolve.

use std::collections::HashSet;

use log::debug;

use super::directives::{scan_language_directives, use_syntax_coloring};
use super::host::{Host, NodeId, Outline};
use super::registry::{LanguageCatalog, ModeRegistry};
use super::scanner::{ScanContext, ScanOptions};
use super::state::{Continuation, StateTable};

/// Line-at-a-time colorizer for one document
#[derive(Debug)]
pub struct Colorizer {
    registry: ModeRegistry,
    states: StateTable,
    options: ScanOptions,
    /// Used when neither the node nor its ancestors name a language
    default_language: String,
    /// Language a line with no previous state starts in
    language: String,
    enabled: bool,
    section_names: HashSet<String>,
}

impl Default for Colorizer {
    fn default() -> Self {
        Self::new(ModeRegistry::default(), ScanOptions::default(), "python")
    }
}

impl Colorizer {
    /// Create a colorizer that starts in `default_language`
    pub fn new(registry: ModeRegistry, options: ScanOptions, default_language: &str) -> Self {
        let language = registry.canonical_language(default_language);
        Self {
            registry,
            states: StateTable::new(&language),
            options,
            default_language: language.clone(),
            language,
            enabled: true,
            section_names: HashSet::new(),
        }
    }

    /// The language lines with no previous state start in
    pub fn language(&self) -> &str {
        &self.language
    }

    /// False if directives disable coloring for the current node
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn registry(&self) -> &ModeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ModeRegistry {
        &mut self.registry
    }

    pub fn states(&self) -> &StateTable {
        &self.states
    }

    /// Use `language` for lines with no previous state
    ///
    /// Unknown languages are accepted; their lines stay uncolored.
    pub fn set_language(&mut self, language: &str) {
        self.language = self.registry.canonical_language(language);
        if !self.registry.is_known(&self.language) {
            debug!("{} has no rules; lines will not be colored", self.language);
        }
        self.force_full_rescan();
    }

    /// Section names that section references may resolve to
    pub fn set_section_names<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.section_names = names.into_iter().map(Into::into).collect();
    }

    /// Color one line
    ///
    /// Reads the previous line's ending state from `host`, sends formats
    /// and stores this line's ending state.
    pub fn recolor_one_line(&mut self, host: &mut dyn Host, line: &str) {
        let fresh = !self.states.is_valid(host.previous_block_state());
        let mut cx = ScanContext::resume(
            host,
            &mut self.registry,
            &mut self.states,
            &self.options,
            &self.section_names,
            &self.language,
        );
        if fresh && !self.enabled {
            // A disabled node behaves as if it began with @nocolor
            cx.set_restart(Continuation::NoColor);
        }
        cx.scan_line(line);
        cx.finish();
    }

    /// Forget every state number
    ///
    /// The host must recolor every line, first to last, afterwards.
    pub fn force_full_rescan(&mut self) {
        self.states.reset(&self.language);
        debug!(
            "full rescan in {} (generation {})",
            self.language,
            self.states.generation()
        );
    }

    /// Rederive everything that depends on the selected node
    pub fn node_selection_changed(&mut self, outline: &dyn Outline, node: NodeId) {
        self.enabled = use_syntax_coloring(outline, node);
        let language = scan_language_directives(outline, node, &self.registry, &self.default_language);
        self.language = self.registry.canonical_language(&language);
        self.section_names = outline.section_names(node).into_iter().collect();
        debug!(
            "node {}: language {}, coloring {}",
            node,
            self.language,
            if self.enabled { "enabled" } else { "disabled" }
        );
        self.force_full_rescan();
    }
}
