//! Mode descriptors
//!
//! A [`Mode`] is everything the scanner needs to color text in one ruleset
//! of one language. Modes are built once by the registry, then shared as
//! `Rc<Mode>` and never changed again.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use super::rules::{Regexp, Rule};
use super::tags::Tag;

/// Language name used by placeholder modes
pub const UNKNOWN_LANGUAGE: &str = "unknown-language";

/// Scanning attributes of a ruleset
#[derive(Debug)]
pub struct ModeAttributes {
    /// Tag for text no rule claims; only applied inside delegated spans
    pub default_tag: Tag,
    /// Words matching this pattern are digits when `highlight_digits` is set
    pub digit_re: Option<Regexp>,
    /// Escape character honored by spans
    pub escape: Option<char>,
    pub highlight_digits: bool,
    pub ignore_case: bool,
    /// Extra characters that belong to words
    pub no_word_sep: String,
}

impl Default for ModeAttributes {
    fn default() -> Self {
        Self {
            default_tag: Tag::Null,
            digit_re: None,
            escape: None,
            highlight_digits: true,
            ignore_case: true,
            no_word_sep: String::new(),
        }
    }
}

/// One ruleset of one language
#[derive(Debug)]
pub struct Mode {
    pub language: String,
    /// Munged ruleset name, such as `python_main` or `html_tags`
    pub ruleset: String,
    pub attributes: ModeAttributes,
    pub properties: BTreeMap<String, String>,
    /// Keyword to tag; keys are lowercased when the ruleset ignores case
    keywords: HashMap<String, Tag>,
    /// Rules tried for text starting with a given character
    rules: HashMap<char, Vec<Rc<Rule>>>,
    /// Rules tried at every offset, after the per-character rules
    any_char_rules: Vec<Rc<Rule>>,
    /// Rules tried last for a character, after the any-char rules
    fallback_rules: HashMap<char, Vec<Rc<Rule>>>,
    word_chars: HashSet<char>,
}

impl Mode {
    /// Create an empty mode
    pub fn new(language: &str, ruleset: &str, attributes: ModeAttributes) -> Self {
        let mut mode = Self {
            language: language.to_string(),
            ruleset: ruleset.to_string(),
            attributes,
            properties: BTreeMap::new(),
            keywords: HashMap::new(),
            rules: HashMap::new(),
            any_char_rules: Vec::new(),
            fallback_rules: HashMap::new(),
            word_chars: HashSet::new(),
        };
        mode.rebuild_word_chars();
        mode
    }

    /// Placeholder for a language with no rule table
    ///
    /// The placeholder has no rules at all, so text scanned with it stays
    /// uncolored.
    pub fn unknown(ruleset: &str) -> Self {
        let attributes = ModeAttributes {
            highlight_digits: false,
            ..Default::default()
        };
        Self::new(UNKNOWN_LANGUAGE, ruleset, attributes)
    }

    /// True for placeholder modes
    pub fn is_unknown(&self) -> bool {
        self.language == UNKNOWN_LANGUAGE
    }

    /// Tag used for text inside delegated spans that no rule claims
    pub fn default_color(&self) -> Tag {
        self.attributes.default_tag
    }

    /// Register a keyword
    pub fn add_keyword(&mut self, word: &str, tag: Tag) {
        if word.is_empty() {
            return;
        }
        let key = if self.attributes.ignore_case {
            word.to_lowercase()
        } else {
            word.to_string()
        };
        self.keywords.insert(key, tag);
        for c in word.chars().filter(|c| *c != ' ' && *c != '\t') {
            self.word_chars.insert(c);
        }
    }

    /// Look a scanned word up in the keyword table
    pub fn keyword_tag(&self, word: &str) -> Option<Tag> {
        if self.attributes.ignore_case {
            self.keywords.get(&word.to_lowercase()).copied()
        } else {
            self.keywords.get(word).copied()
        }
    }

    /// Number of keywords
    pub fn keyword_count(&self) -> usize {
        self.keywords.len()
    }

    /// Characters that can start a keyword
    pub fn keyword_leaders(&self) -> HashSet<char> {
        self.keywords.keys().filter_map(|k| k.chars().next()).collect()
    }

    /// True if `c` can be part of a word in this ruleset
    pub fn is_word_char(&self, c: char) -> bool {
        c.is_alphanumeric() || c == '_' || self.word_chars.contains(&c)
    }

    /// Append a rule to the list for `c`
    pub fn push_rule(&mut self, c: char, rule: Rc<Rule>) {
        self.rules.entry(c).or_default().push(rule);
    }

    /// Insert a rule at the front of the list for `c`
    pub fn prepend_rule(&mut self, c: char, rule: Rc<Rule>) {
        self.rules.entry(c).or_default().insert(0, rule);
    }

    /// Append a rule that is tried at every offset
    pub fn push_any_char_rule(&mut self, rule: Rc<Rule>) {
        self.any_char_rules.push(rule);
    }

    /// Append a rule for `c` that runs after every other rule
    ///
    /// Holds the implicit keyword lookup.
    pub fn push_fallback_rule(&mut self, c: char, rule: Rc<Rule>) {
        self.fallback_rules.entry(c).or_default().push(rule);
    }

    /// Rules to try, in order, for text starting with `c`
    pub fn rules_for(&self, c: char) -> impl Iterator<Item = &Rc<Rule>> {
        self.rules
            .get(&c)
            .into_iter()
            .flatten()
            .chain(self.any_char_rules.iter())
            .chain(self.fallback_rules.get(&c).into_iter().flatten())
    }

    /// Total number of rule list entries
    pub fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum::<usize>()
            + self.any_char_rules.len()
            + self.fallback_rules.values().map(Vec::len).sum::<usize>()
    }

    /// Append the rules of `other` that this mode does not already hold
    ///
    /// Rules are compared by identity so the shared directive rules are
    /// never duplicated.
    pub fn import_rules(&mut self, other: &Mode) {
        for (c, theirs) in &other.rules {
            let ours = self.rules.entry(*c).or_default();
            for rule in theirs {
                if !ours.iter().any(|r| Rc::ptr_eq(r, rule)) {
                    ours.push(Rc::clone(rule));
                }
            }
        }
        for rule in &other.any_char_rules {
            if !self.any_char_rules.iter().any(|r| Rc::ptr_eq(r, rule)) {
                self.any_char_rules.push(Rc::clone(rule));
            }
        }
        for (c, theirs) in &other.fallback_rules {
            let ours = self.fallback_rules.entry(*c).or_default();
            for rule in theirs {
                if !ours.iter().any(|r| Rc::ptr_eq(r, rule)) {
                    ours.push(Rc::clone(rule));
                }
            }
        }
    }

    fn rebuild_word_chars(&mut self) {
        self.word_chars = self
            .attributes
            .no_word_sep
            .chars()
            .filter(|c| *c != ' ' && *c != '\t')
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_case_folding() {
        let mut mode = Mode::new("test", "test_main", ModeAttributes::default());
        mode.add_keyword("if", Tag::Keyword1);
        assert_eq!(mode.keyword_tag("IF"), Some(Tag::Keyword1));
        assert_eq!(mode.keyword_tag("If"), Some(Tag::Keyword1));
        assert_eq!(mode.keyword_tag("iF"), Some(Tag::Keyword1));

        let attributes = ModeAttributes {
            ignore_case: false,
            ..Default::default()
        };
        let mut mode = Mode::new("test", "test_main", attributes);
        mode.add_keyword("if", Tag::Keyword1);
        assert_eq!(mode.keyword_tag("if"), Some(Tag::Keyword1));
        assert_eq!(mode.keyword_tag("IF"), None);
    }

    #[test]
    fn test_word_chars_include_keyword_chars() {
        let mut mode = Mode::new("test", "test_main", ModeAttributes::default());
        assert!(!mode.is_word_char('$'));
        mode.add_keyword("$var", Tag::Keyword2);
        assert!(mode.is_word_char('$'));
        assert!(mode.is_word_char('x'));
        assert!(mode.is_word_char('_'));
        assert!(!mode.is_word_char(' '));
    }

    #[test]
    fn test_no_word_sep() {
        let attributes = ModeAttributes {
            no_word_sep: "-".to_string(),
            ..Default::default()
        };
        let mode = Mode::new("css", "css_main", attributes);
        assert!(mode.is_word_char('-'));
    }

    #[test]
    fn test_rule_order_and_any_char_rules() {
        let mut mode = Mode::new("test", "test_main", ModeAttributes::default());
        mode.push_rule('#', Rc::new(Rule::Keywords));
        mode.prepend_rule('#', Rc::new(Rule::Line { tag: Tag::Comment1, delegate: None }));
        mode.push_any_char_rule(Rc::new(Rule::Keywords));
        mode.push_fallback_rule('#', Rc::new(Rule::Line { tag: Tag::Comment2, delegate: None }));

        let found: Vec<String> = mode.rules_for('#').map(|r| r.describe()).collect();
        assert_eq!(found, ["line -> comment1", "keywords", "keywords", "line -> comment2"]);
        assert_eq!(mode.rules_for('x').count(), 1);
        assert_eq!(mode.rule_count(), 4);
    }

    #[test]
    fn test_import_rules_dedupes_shared_rules() {
        let shared = Rc::new(Rule::Keywords);
        let mut a = Mode::new("a", "a_main", ModeAttributes::default());
        let mut b = Mode::new("b", "b_main", ModeAttributes::default());
        a.push_rule('x', Rc::clone(&shared));
        b.push_rule('x', Rc::clone(&shared));
        b.push_rule('y', Rc::new(Rule::Keywords));

        a.import_rules(&b);
        assert_eq!(a.rules_for('x').count(), 1);
        assert_eq!(a.rules_for('y').count(), 1);
    }

    #[test]
    fn test_unknown_placeholder() {
        let mode = Mode::unknown("klingon_main");
        assert!(mode.is_unknown());
        assert_eq!(mode.rule_count(), 0);
        assert_eq!(mode.ruleset, "klingon_main");
    }
}
