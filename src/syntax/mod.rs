//! Syntax coloring
//!
//! Modes are built from rule tables and cached by the [`ModeRegistry`]. A
//! [`Colorizer`] scans one line at a time: it reads the state the previous
//! line ended in from the [`Host`], sends formats back, and stores the state
//! this line ends in. Multi-line constructs survive between lines only as
//! state numbers handed out by the [`StateTable`].

mod builtin;
mod colorizer;
pub mod directives;
mod host;
mod matchers;
mod mode;
mod mode_file;
mod registry;
mod rules;
mod scanner;
mod state;
mod style;
mod tags;

#[cfg(test)]
mod testing;

pub use builtin::{language_for_path, LANGUAGES as BUILTIN_LANGUAGES};
pub use colorizer::Colorizer;
pub use host::{Format, Host, NodeId, Outline};
pub use mode::{Mode, ModeAttributes};
pub use mode_file::{AttributesDef, ModeDefinition, RuleDef, RuleKind, RulesetDef};
pub use registry::{LanguageCatalog, ModeRegistry, RegistryOptions};
pub use rules::{Directive, MatchResult, Position, Regexp, Rule, SpanOptions};
pub use scanner::{ScanContext, ScanOptions};
pub use state::{Continuation, SpanContinuation, StateEntry, StateTable, NO_STATE};
pub use style::{Color, Style, Theme};
pub use tags::Tag;
