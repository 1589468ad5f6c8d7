//! Scan states carried from one line to the next
//!
//! The host stores one integer per line. This module maps those integers
//! to what they mean: which language and ruleset were active when the line
//! ended, and which continuation (if any) must run first on the next line.
//!
//! Numbers are allocated from 1 upwards and never reused until the table
//! is reset. `0` is never issued and [`NO_STATE`] means "no previous line".

use std::collections::HashMap;

use super::rules::SpanOptions;
use super::tags::Tag;

/// The state the host reports for the first line, or for an unknown line
pub const NO_STATE: i32 = -1;

/// A span that did not end on its line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpanContinuation {
    pub tag: Tag,
    /// Only meaningful for nested spans
    pub begin: String,
    pub end: String,
    pub delegate: Option<String>,
    pub exclude_match: bool,
    pub options: SpanOptions,
    /// Open nesting levels beyond the outermost one
    pub depth: usize,
}

/// What must run at the start of the next line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Continuation {
    /// Finish an unterminated span
    Span(SpanContinuation),
    /// Coloring re-enabled by `@color`
    Color,
    /// Coloring suspended by `@nocolor` until the next `@color`
    NoColor,
    /// Coloring suspended for the rest of the node
    NoColorNode,
    /// Coloring killed for the rest of the node
    KillColor,
    /// Inside a doc part; `resume` is the language to return to at `@c`
    /// when the doc part is being colored as another language
    DocPart { resume: Option<String> },
}

impl Continuation {
    /// Identity used in state names
    pub fn function_name(&self) -> &'static str {
        match self {
            Continuation::Span(_) => "span",
            Continuation::Color => "@color",
            Continuation::NoColor => "@nocolor",
            Continuation::NoColorNode => "@nocolor-node",
            Continuation::KillColor => "@killcolor",
            Continuation::DocPart { .. } => "@docpart",
        }
    }

    /// The same continuation with the fields that cannot affect scanning
    /// cleared, so that equivalent continuations share one state
    pub fn canonical(self) -> Self {
        match self {
            Continuation::Span(mut span) => {
                if !span.options.nested {
                    span.begin.clear();
                    span.depth = 0;
                }
                span.delegate = span.delegate.filter(|d| !d.is_empty());
                Continuation::Span(span)
            }
            other => other,
        }
    }

    /// True if lines in this state must not be colored
    pub fn suppresses_coloring(&self) -> bool {
        matches!(
            self,
            Continuation::NoColor | Continuation::NoColorNode | Continuation::KillColor
        )
    }

    /// Bound arguments as `(key, value)` pairs
    ///
    /// Boolean flags are `Some("")` when set and absent otherwise. Keys are
    /// already abbreviated.
    fn arguments(&self) -> Vec<(&'static str, String)> {
        let mut args = Vec::new();
        match self {
            Continuation::Span(span) => {
                if let Some(delegate) = span.delegate.as_deref().filter(|d| !d.is_empty()) {
                    args.push(("=>", delegate.to_string()));
                }
                if span.options.nested {
                    args.push(("begin", span.begin.clone()));
                    args.push(("depth", span.depth.to_string()));
                }
                args.push(("end", span.end.clone()));
                if span.exclude_match {
                    args.push(("!match", String::new()));
                }
                // The tag is rendered without its key
                args.push(("", span.tag.name().replace("literal", "lit")));
                if span.options.no_escape {
                    args.push(("!esc", String::new()));
                }
                if span.options.no_line_break {
                    args.push(("!lbrk", String::new()));
                }
                if span.options.no_word_break {
                    args.push(("!wbrk", String::new()));
                }
            }
            Continuation::DocPart { resume: Some(language) } => {
                args.push(("resume", language.clone()));
            }
            _ => {}
        }
        args
    }
}

/// One allocated state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub name: String,
    pub language: String,
    pub ruleset: String,
    pub restart: Option<Continuation>,
}

/// Bidirectional map between canonical state names and state numbers
#[derive(Debug, Clone)]
pub struct StateTable {
    numbers: HashMap<String, i32>,
    /// Entry for state `n` lives at index `n - 1`
    entries: Vec<StateEntry>,
    /// Language reported for [`NO_STATE`]
    fallback_language: String,
    generation: u32,
}

impl StateTable {
    /// Create an empty table whose fresh-start language is `language`
    pub fn new(language: &str) -> Self {
        Self {
            numbers: HashMap::new(),
            entries: Vec::new(),
            fallback_language: language.to_string(),
            generation: 0,
        }
    }

    /// Forget every state and start a new generation
    pub fn reset(&mut self, language: &str) {
        self.numbers.clear();
        self.entries.clear();
        self.fallback_language = language.to_string();
        self.generation += 1;
    }

    /// Number of resets so far
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Number of allocated states
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no state has been allocated in this generation
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical name for a (language, ruleset, continuation) triple
    ///
    /// The main ruleset is left out to keep the common names short. The
    /// language and ruleset are lowercased; argument values are kept as
    /// they are, with `\`, `;` and `=` escaped by a backslash.
    pub fn name_for(language: &str, ruleset: &str, restart: Option<&Continuation>) -> String {
        let mut parts = vec![language_tag(&language.to_lowercase())];
        if !ruleset.is_empty() && !ruleset.ends_with("_main") {
            parts.push(ruleset.to_lowercase());
        }
        if let Some(restart) = restart {
            parts.push(restart.function_name().to_string());
            for (key, value) in restart.arguments() {
                match (key.is_empty(), value.is_empty()) {
                    (true, _) => parts.push(escape_value(&value)),
                    (false, true) => parts.push(key.to_string()),
                    (false, false) => parts.push(format!("{}={}", key, escape_value(&value))),
                }
            }
        }
        parts.join(";")
    }

    /// Look up a state name, allocating the next number if it is new
    ///
    /// `entry` is only called when a new number is allocated.
    pub fn number_for(&mut self, name: &str, entry: impl FnOnce() -> StateEntry) -> i32 {
        if let Some(&n) = self.numbers.get(name) {
            return n;
        }
        let mut entry = entry();
        entry.name = name.to_string();
        self.entries.push(entry);
        let n = self.entries.len() as i32;
        self.numbers.insert(name.to_string(), n);
        n
    }

    /// Name, then number, for a triple
    pub fn intern(&mut self, language: &str, ruleset: &str, restart: Option<Continuation>) -> i32 {
        let restart = restart.map(Continuation::canonical);
        let name = Self::name_for(language, ruleset, restart.as_ref());
        self.number_for(&name, || StateEntry {
            name: String::new(),
            language: language.to_string(),
            ruleset: ruleset.to_string(),
            restart,
        })
    }

    /// The entry for a state number
    pub fn entry(&self, n: i32) -> Option<&StateEntry> {
        if n < 1 {
            return None;
        }
        self.entries.get((n - 1) as usize)
    }

    /// The continuation to run at the start of a line that begins in state `n`
    pub fn resolve(&self, n: i32) -> Option<&Continuation> {
        self.entry(n).and_then(|entry| entry.restart.as_ref())
    }

    /// The language that governs a line beginning in state `n`
    pub fn language_of(&self, n: i32) -> Option<&str> {
        if n == NO_STATE {
            return Some(&self.fallback_language);
        }
        self.entry(n).map(|entry| entry.language.as_str())
    }

    /// True if `n` was issued in this generation
    pub fn is_valid(&self, n: i32) -> bool {
        self.entry(n).is_some()
    }

    /// True if lines in state `n` must not be colored
    pub fn suppresses_coloring(&self, n: i32) -> bool {
        self.resolve(n).is_some_and(Continuation::suppresses_coloring)
    }

    /// Human-readable form of a state, for tracing
    pub fn show(&self, n: i32) -> String {
        let name = self.entry(n).map_or("no-state", |entry| entry.name.as_str());
        format!("{:>2}:{}", n, name)
    }
}

fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ';' | '=') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Standardized short form of a language name
pub fn language_tag(name: &str) -> String {
    if name.is_empty() {
        return "no-language".to_string();
    }
    name.replace("markdown", "md")
        .replace("python", "py")
        .replace("javascript", "js")
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn triple_quote() -> Continuation {
        Continuation::Span(SpanContinuation {
            tag: Tag::Literal2,
            begin: "\"\"\"".to_string(),
            end: "\"\"\"".to_string(),
            delegate: None,
            exclude_match: false,
            options: SpanOptions::default(),
            depth: 0,
        })
    }

    #[test]
    fn test_name_for_initial_state() {
        assert_eq!(StateTable::name_for("python", "python_main", None), "py");
        assert_eq!(StateTable::name_for("javascript", "javascript_main", None), "js");
        assert_eq!(StateTable::name_for("", "", None), "no-language");
    }

    #[test]
    fn test_name_for_span() {
        let name = StateTable::name_for("python", "python_main", Some(&triple_quote()));
        assert_eq!(name, "py;span;end=\"\"\";lit2");
    }

    #[test]
    fn test_name_for_keeps_delegate_ruleset() {
        let name = StateTable::name_for("html", "html_tags", Some(&Continuation::NoColor));
        assert_eq!(name, "html;html_tags;@nocolor");
    }

    #[test]
    fn test_name_for_flags() {
        let cont = Continuation::Span(SpanContinuation {
            tag: Tag::Comment1,
            begin: "<!--".to_string(),
            end: "-->".to_string(),
            delegate: Some("javascript".to_string()),
            exclude_match: true,
            options: SpanOptions {
                no_escape: true,
                ..Default::default()
            },
            depth: 0,
        });
        let name = StateTable::name_for("html", "html_main", Some(&cont));
        assert_eq!(name, "html;span;=>=javascript;end=-->;!match;comment1;!esc");
    }

    fn span_ending(end: &str) -> Continuation {
        Continuation::Span(SpanContinuation {
            tag: Tag::Literal1,
            begin: String::new(),
            end: end.to_string(),
            delegate: None,
            exclude_match: false,
            options: SpanOptions::default(),
            depth: 0,
        })
    }

    #[test]
    fn test_name_for_keeps_argument_case() {
        assert_eq!(StateTable::name_for("Toy", "toy_main", Some(&span_ending("END"))), "toy;span;end=END;lit1");
        assert_ne!(
            StateTable::name_for("toy", "toy_main", Some(&span_ending("END"))),
            StateTable::name_for("toy", "toy_main", Some(&span_ending("end")))
        );
    }

    #[test]
    fn test_name_for_escapes_separators() {
        let name = StateTable::name_for("toy", "toy_main", Some(&span_ending("a;b=c\\")));
        assert_eq!(name, "toy;span;end=a\\;b\\=c\\\\;lit1");
    }

    #[test]
    fn test_intern_ignores_fields_of_plain_spans() {
        let mut table = StateTable::new("toy");
        let plain = span_ending("*/");
        let mut noisy = match plain.clone() {
            Continuation::Span(span) => span,
            _ => unreachable!(),
        };
        noisy.begin = "/*".to_string();
        noisy.delegate = Some(String::new());
        let a = table.intern("toy", "toy_main", Some(plain.clone()));
        let b = table.intern("toy", "toy_main", Some(Continuation::Span(noisy)));
        assert_eq!(a, b);
        assert_eq!(table.resolve(a), Some(&plain));
    }

    #[test]
    fn test_numbers_start_at_one_and_are_stable() {
        let mut table = StateTable::new("python");
        let a = table.intern("python", "python_main", None);
        let b = table.intern("python", "python_main", Some(triple_quote()));
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(table.intern("python", "python_main", Some(triple_quote())), b);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_resolve_and_language_of() {
        let mut table = StateTable::new("python");
        let n = table.intern("c", "c_main", Some(Continuation::KillColor));
        assert_eq!(table.resolve(n), Some(&Continuation::KillColor));
        assert_eq!(table.language_of(n), Some("c"));
        assert_eq!(table.language_of(NO_STATE), Some("python"));
        assert!(table.suppresses_coloring(n));
        assert_eq!(table.resolve(0), None);
        assert_eq!(table.resolve(99), None);
    }

    #[test]
    fn test_reset_starts_new_generation() {
        let mut table = StateTable::new("python");
        let n = table.intern("python", "python_main", Some(Continuation::NoColor));
        table.reset("c");
        assert!(!table.is_valid(n));
        assert_eq!(table.generation(), 1);
        assert_eq!(table.language_of(NO_STATE), Some("c"));
        assert_eq!(table.intern("c", "c_main", None), 1);
    }

    fn any_text() -> impl Strategy<Value = String> {
        "[a-zA-Z;=\\\\'\"]{0,4}"
    }

    fn any_span() -> impl Strategy<Value = Continuation> {
        (
            0..4usize,
            any_text(),
            any_text(),
            proptest::option::of(any_text()),
            any::<[bool; 5]>(),
            0..3usize,
        )
            .prop_map(|(tag, begin, end, delegate, flags, depth)| {
                Continuation::Span(SpanContinuation {
                    tag: [Tag::Literal1, Tag::Literal2, Tag::Comment1, Tag::Markup][tag],
                    begin,
                    end,
                    delegate,
                    exclude_match: flags[0],
                    options: SpanOptions {
                        no_escape: flags[1],
                        no_line_break: flags[2],
                        no_word_break: flags[3],
                        nested: flags[4],
                    },
                    depth,
                })
            })
    }

    fn any_continuation() -> impl Strategy<Value = Continuation> {
        prop_oneof![
            any_span(),
            Just(Continuation::Color),
            Just(Continuation::NoColor),
            Just(Continuation::NoColorNode),
            Just(Continuation::KillColor),
            proptest::option::of(any_text()).prop_map(|resume| Continuation::DocPart { resume }),
        ]
    }

    proptest! {
        #[test]
        fn test_names_identify_continuations(a in any_continuation(), b in any_continuation()) {
            let mut table = StateTable::new("toy");
            let name_a = StateTable::name_for("toy", "toy_main", Some(&a));
            let name_b = StateTable::name_for("toy", "toy_main", Some(&b));
            let n_a = table.intern("toy", "toy_main", Some(a.clone()));
            let n_b = table.intern("toy", "toy_main", Some(b.clone()));
            let same = a.clone().canonical() == b.clone().canonical();

            prop_assert_eq!(same, name_a == name_b);
            prop_assert_eq!(same, n_a == n_b);
            prop_assert_eq!(table.intern("toy", "toy_main", Some(a.clone())), n_a);
            prop_assert_eq!(table.resolve(n_a), Some(&a.canonical()));
            prop_assert_eq!(table.entry(n_b).map(|e| e.name.as_str()), Some(name_b.as_str()));
        }
    }

    #[test]
    fn test_show() {
        let mut table = StateTable::new("python");
        let n = table.intern("python", "python_main", None);
        assert_eq!(table.show(n), " 1:py");
        assert_eq!(table.show(7), " 7:no-state");
    }
}
