//! Rule table definitions
//!
//! A [`ModeDefinition`] describes every ruleset of one language in plain
//! data. Definitions come from TOML files in the modes directory or from
//! the built-in tables, and are turned into [`Mode`]s by the registry.
//!
//! ```toml
//! language = "ini"
//!
//! [properties]
//! lineComment = ";"
//!
//! [rulesets.main]
//! attributes = { ignore_case = true, highlight_digits = false }
//! keywords = { keyword1 = ["true", "false"] }
//!
//! [[rulesets.main.rules]]
//! type = "eol_span"
//! seq = ";"
//! tag = "comment1"
//!
//! [[rulesets.main.rules]]
//! type = "span"
//! begin = "["
//! end = "]"
//! tag = "keyword2"
//! no_line_break = true
//! ```
//!
//! Imports name other rulesets whose rules are appended to a ruleset.
//! `"other"` means a ruleset of the same file; `"lang::ruleset"` names a
//! ruleset of another language.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use serde::Deserialize;

use super::mode::{Mode, ModeAttributes};
use super::rules::{Position, Regexp, Rule, SpanOptions};
use super::tags::Tag;
use crate::error::{ColorizerError, Result};

/// All rulesets of one language
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModeDefinition {
    pub language: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub rulesets: BTreeMap<String, RulesetDef>,
    #[serde(default)]
    pub imports: BTreeMap<String, Vec<String>>,
}

/// One ruleset: attributes, keywords and rules
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RulesetDef {
    pub attributes: AttributesDef,
    /// Tag name to the words that get that tag
    pub keywords: BTreeMap<String, Vec<String>>,
    pub rules: Vec<RuleDef>,
}

/// Scanning attributes as written in a rule table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AttributesDef {
    pub default: String,
    pub digit_re: String,
    pub escape: String,
    pub highlight_digits: bool,
    pub ignore_case: bool,
    pub no_word_sep: String,
}

impl Default for AttributesDef {
    fn default() -> Self {
        Self {
            default: "null".to_string(),
            digit_re: String::new(),
            escape: String::new(),
            highlight_digits: true,
            ignore_case: true,
            no_word_sep: String::new(),
        }
    }
}

/// Rule kinds, named as in the `type` key of a rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Seq,
    SeqRegexp,
    Span,
    SpanRegexp,
    EolSpan,
    EolSpanRegexp,
    MarkFollowing,
    MarkPrevious,
    WordAndRegexp,
    Line,
    Keywords,
}

/// One rule as written in a rule table
///
/// Which fields matter depends on `kind`; the rest are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RuleDef {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    /// Literal for `seq`, `eol_span` and the marks; the word of `word_and_regexp`
    #[serde(default)]
    pub seq: Option<String>,
    #[serde(default)]
    pub begin: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub regexp: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    /// Tag of the regexp part of `word_and_regexp`
    #[serde(default)]
    pub regexp_tag: Option<String>,
    /// Characters that may start a regexp or line rule; without it a
    /// regexp rule is tried at every offset
    #[serde(default)]
    pub leading: Option<String>,
    #[serde(default)]
    pub delegate: Option<String>,
    #[serde(default)]
    pub at_line_start: bool,
    #[serde(default)]
    pub at_whitespace_end: bool,
    #[serde(default)]
    pub at_word_start: bool,
    #[serde(default)]
    pub exclude_match: bool,
    #[serde(default)]
    pub no_escape: bool,
    #[serde(default)]
    pub no_line_break: bool,
    #[serde(default)]
    pub no_word_break: bool,
    #[serde(default)]
    pub nested: bool,
}

/// Munged ruleset name for a ruleset of a language
///
/// Anything that is not a letter, digit or underscore becomes `_`.
pub fn ruleset_name(language: &str, ruleset: &str) -> String {
    format!("{}_{}", language, ruleset)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn parse_tag(name: &str) -> Result<Tag> {
    Tag::from_name(name).ok_or_else(|| ColorizerError::UnknownTag(name.to_string()))
}

fn required<'a>(value: &'a Option<String>, field: &str, kind: RuleKind) -> Result<&'a str> {
    match value.as_deref() {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(ColorizerError::InvalidMode(format!(
            "{:?} rule needs a non-empty `{}`",
            kind, field
        ))),
    }
}

impl ModeDefinition {
    /// Create an empty definition
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
            ..Default::default()
        }
    }

    /// Parse a TOML rule table
    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Read and parse a rule table file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut definition = Self::from_toml(&text).map_err(|source| ColorizerError::ModeFile {
            path: path.to_path_buf(),
            source,
        })?;
        definition.language = definition.language.to_lowercase();
        Ok(definition)
    }

    /// Builder: add a property
    pub fn property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    /// Builder: add a ruleset
    pub fn ruleset(mut self, name: &str, ruleset: RulesetDef) -> Self {
        self.rulesets.insert(name.to_string(), ruleset);
        self
    }

    /// Builder: import another ruleset's rules into `ruleset`
    pub fn import(mut self, ruleset: &str, from: &str) -> Self {
        self.imports
            .entry(ruleset.to_string())
            .or_default()
            .push(from.to_string());
        self
    }

    /// Local key of the ruleset whose munged name is `munged`
    pub fn ruleset_key(&self, munged: &str) -> Option<&str> {
        self.rulesets
            .keys()
            .find(|key| ruleset_name(&self.language, key) == munged)
            .map(String::as_str)
    }

    /// Fully qualified names of the rulesets imported into `key`
    pub fn imports_for(&self, key: &str) -> Vec<String> {
        self.imports
            .get(key)
            .into_iter()
            .flatten()
            .map(|name| self.qualify(name))
            .collect()
    }

    /// Qualify a delegate or import name
    ///
    /// A bare name that is a ruleset of this definition refers to it.
    /// Any other bare name is a language.
    pub fn qualify(&self, name: &str) -> String {
        if !name.contains("::") && self.rulesets.contains_key(name) {
            format!("{}::{}", self.language, name)
        } else {
            name.to_string()
        }
    }

    /// Build the mode for the ruleset stored under `key`
    ///
    /// Directive rules and imports are added later by the registry.
    pub fn build_mode(&self, key: &str) -> Result<Mode> {
        let ruleset = self.rulesets.get(key).ok_or_else(|| {
            ColorizerError::InvalidMode(format!("{} has no ruleset {}", self.language, key))
        })?;

        let mut mode = Mode::new(
            &self.language,
            &ruleset_name(&self.language, key),
            ruleset.attributes.to_attributes()?,
        );
        mode.properties = self.properties.clone();

        for (tag_name, words) in &ruleset.keywords {
            let tag = parse_tag(tag_name)?;
            for word in words {
                mode.add_keyword(word, tag);
            }
        }

        let keywords = Rc::new(Rule::Keywords);
        let mut explicit_keywords = false;
        for def in &ruleset.rules {
            if def.kind == RuleKind::Keywords {
                explicit_keywords = true;
                let leaders = match &def.leading {
                    Some(chars) => chars.chars().collect(),
                    None => word_leaders(&mode),
                };
                for c in leaders {
                    mode.push_rule(c, Rc::clone(&keywords));
                }
                continue;
            }
            let rule = Rc::new(def.to_rule(self)?);
            match def.leaders()? {
                Some(leaders) => {
                    for c in leaders {
                        mode.push_rule(c, Rc::clone(&rule));
                    }
                }
                None => mode.push_any_char_rule(rule),
            }
        }

        // Without an explicit keywords rule the lookup runs after every
        // other rule for each character that can start a word
        if !explicit_keywords && (mode.keyword_count() > 0 || mode.attributes.highlight_digits) {
            for c in word_leaders(&mode) {
                mode.push_fallback_rule(c, Rc::clone(&keywords));
            }
        }
        Ok(mode)
    }
}

/// Characters that can start a word: ASCII letters, digits, `_`, plus the
/// first characters of keywords and the extra word characters
fn word_leaders(mode: &Mode) -> Vec<char> {
    let mut seen = HashSet::new();
    ('a'..='z')
        .chain('A'..='Z')
        .chain('0'..='9')
        .chain(['_'])
        .chain(mode.keyword_leaders())
        .chain(mode.attributes.no_word_sep.chars())
        .filter(|c| *c != ' ' && *c != '\t')
        .filter(|c| seen.insert(*c))
        .collect()
}

impl AttributesDef {
    fn to_attributes(&self) -> Result<ModeAttributes> {
        Ok(ModeAttributes {
            default_tag: parse_tag(&self.default)?,
            digit_re: (!self.digit_re.is_empty()).then(|| Regexp::new(self.digit_re.clone())),
            escape: self.escape.chars().next(),
            highlight_digits: self.highlight_digits,
            ignore_case: self.ignore_case,
            no_word_sep: self.no_word_sep.clone(),
        })
    }
}

impl RulesetDef {
    /// Create an empty ruleset with default attributes
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: replace the attributes
    pub fn attributes(mut self, attributes: AttributesDef) -> Self {
        self.attributes = attributes;
        self
    }

    /// Builder: give `words` the tag `tag`
    pub fn keywords(mut self, tag: Tag, words: &[&str]) -> Self {
        self.keywords
            .entry(tag.name().to_string())
            .or_default()
            .extend(words.iter().map(|w| w.to_string()));
        self
    }

    /// Builder: append a rule
    pub fn rule(mut self, rule: RuleDef) -> Self {
        self.rules.push(rule);
        self
    }
}

impl RuleDef {
    fn of(kind: RuleKind, tag: Tag) -> Self {
        Self {
            kind,
            seq: None,
            begin: None,
            end: None,
            regexp: None,
            tag: Some(tag.name().to_string()),
            regexp_tag: None,
            leading: None,
            delegate: None,
            at_line_start: false,
            at_whitespace_end: false,
            at_word_start: false,
            exclude_match: false,
            no_escape: false,
            no_line_break: false,
            no_word_break: false,
            nested: false,
        }
    }

    pub fn seq(seq: &str, tag: Tag) -> Self {
        Self {
            seq: Some(seq.to_string()),
            ..Self::of(RuleKind::Seq, tag)
        }
    }

    pub fn seq_regexp(regexp: &str, leading: &str, tag: Tag) -> Self {
        Self {
            regexp: Some(regexp.to_string()),
            leading: Some(leading.to_string()),
            ..Self::of(RuleKind::SeqRegexp, tag)
        }
    }

    pub fn span(begin: &str, end: &str, tag: Tag) -> Self {
        Self {
            begin: Some(begin.to_string()),
            end: Some(end.to_string()),
            ..Self::of(RuleKind::Span, tag)
        }
    }

    pub fn span_regexp(begin: &str, leading: &str, end: &str, tag: Tag) -> Self {
        Self {
            regexp: Some(begin.to_string()),
            leading: Some(leading.to_string()),
            end: Some(end.to_string()),
            ..Self::of(RuleKind::SpanRegexp, tag)
        }
    }

    pub fn eol_span(seq: &str, tag: Tag) -> Self {
        Self {
            seq: Some(seq.to_string()),
            ..Self::of(RuleKind::EolSpan, tag)
        }
    }

    pub fn eol_span_regexp(regexp: &str, leading: &str, tag: Tag) -> Self {
        Self {
            regexp: Some(regexp.to_string()),
            leading: Some(leading.to_string()),
            ..Self::of(RuleKind::EolSpanRegexp, tag)
        }
    }

    pub fn mark_following(seq: &str, tag: Tag) -> Self {
        Self {
            seq: Some(seq.to_string()),
            ..Self::of(RuleKind::MarkFollowing, tag)
        }
    }

    pub fn mark_previous(seq: &str, tag: Tag) -> Self {
        Self {
            seq: Some(seq.to_string()),
            ..Self::of(RuleKind::MarkPrevious, tag)
        }
    }

    pub fn word_and_regexp(word: &str, word_tag: Tag, regexp: &str, regexp_tag: Tag) -> Self {
        Self {
            seq: Some(word.to_string()),
            regexp: Some(regexp.to_string()),
            regexp_tag: Some(regexp_tag.name().to_string()),
            ..Self::of(RuleKind::WordAndRegexp, word_tag)
        }
    }

    pub fn line(leading: &str, tag: Tag) -> Self {
        Self {
            leading: Some(leading.to_string()),
            ..Self::of(RuleKind::Line, tag)
        }
    }

    pub fn at_line_start(mut self) -> Self {
        self.at_line_start = true;
        self
    }

    pub fn at_whitespace_end(mut self) -> Self {
        self.at_whitespace_end = true;
        self
    }

    pub fn at_word_start(mut self) -> Self {
        self.at_word_start = true;
        self
    }

    pub fn exclude_match(mut self) -> Self {
        self.exclude_match = true;
        self
    }

    pub fn no_escape(mut self) -> Self {
        self.no_escape = true;
        self
    }

    pub fn no_line_break(mut self) -> Self {
        self.no_line_break = true;
        self
    }

    pub fn no_word_break(mut self) -> Self {
        self.no_word_break = true;
        self
    }

    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }

    pub fn delegate(mut self, delegate: &str) -> Self {
        self.delegate = Some(delegate.to_string());
        self
    }

    fn position(&self) -> Position {
        Position {
            at_line_start: self.at_line_start,
            at_whitespace_end: self.at_whitespace_end,
            at_word_start: self.at_word_start,
        }
    }

    fn options(&self) -> SpanOptions {
        SpanOptions {
            no_escape: self.no_escape,
            no_line_break: self.no_line_break,
            no_word_break: self.no_word_break,
            nested: self.nested,
        }
    }

    /// Characters the rule is registered under; `None` means every offset
    fn leaders(&self) -> Result<Option<Vec<char>>> {
        if let Some(leading) = self.leading.as_deref().filter(|s| !s.is_empty()) {
            return Ok(Some(leading.chars().collect()));
        }
        let literal = match self.kind {
            RuleKind::Span => self.begin.as_deref(),
            RuleKind::Seq
            | RuleKind::EolSpan
            | RuleKind::MarkFollowing
            | RuleKind::MarkPrevious
            | RuleKind::WordAndRegexp => self.seq.as_deref(),
            RuleKind::SeqRegexp | RuleKind::SpanRegexp | RuleKind::EolSpanRegexp => return Ok(None),
            RuleKind::Line | RuleKind::Keywords => {
                return Err(ColorizerError::InvalidMode(format!(
                    "{:?} rule needs `leading` characters",
                    self.kind
                )))
            }
        };
        Ok(literal.and_then(|s| s.chars().next()).map(|c| vec![c]))
    }

    /// Convert to a rule of `definition`
    pub fn to_rule(&self, definition: &ModeDefinition) -> Result<Rule> {
        let kind = self.kind;
        let tag = parse_tag(self.tag.as_deref().unwrap_or("null"))?;
        let position = self.position();
        let delegate = self
            .delegate
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| definition.qualify(d));
        let exclude_match = self.exclude_match;

        let rule = match kind {
            RuleKind::Seq => Rule::Seq {
                seq: required(&self.seq, "seq", kind)?.to_string(),
                tag,
                position,
                delegate,
            },
            RuleKind::SeqRegexp => Rule::SeqRegexp {
                regexp: Regexp::new(required(&self.regexp, "regexp", kind)?),
                tag,
                position,
                delegate,
            },
            RuleKind::Span => Rule::Span {
                begin: required(&self.begin, "begin", kind)?.to_string(),
                end: required(&self.end, "end", kind)?.to_string(),
                tag,
                position,
                options: self.options(),
                delegate,
                exclude_match,
            },
            RuleKind::SpanRegexp => Rule::SpanRegexp {
                begin: Regexp::new(required(&self.regexp, "regexp", kind)?),
                end: required(&self.end, "end", kind)?.to_string(),
                tag,
                position,
                options: self.options(),
                delegate,
                exclude_match,
            },
            RuleKind::EolSpan => Rule::EolSpan {
                seq: required(&self.seq, "seq", kind)?.to_string(),
                tag,
                position,
                delegate,
                exclude_match,
            },
            RuleKind::EolSpanRegexp => Rule::EolSpanRegexp {
                regexp: Regexp::new(required(&self.regexp, "regexp", kind)?),
                tag,
                position,
                delegate,
                exclude_match,
            },
            RuleKind::MarkFollowing => Rule::MarkFollowing {
                pattern: required(&self.seq, "seq", kind)?.to_string(),
                tag,
                position,
                exclude_match,
            },
            RuleKind::MarkPrevious => Rule::MarkPrevious {
                pattern: required(&self.seq, "seq", kind)?.to_string(),
                tag,
                position,
                exclude_match,
            },
            RuleKind::WordAndRegexp => Rule::WordAndRegexp {
                word: required(&self.seq, "seq", kind)?.to_string(),
                word_tag: tag,
                regexp: Regexp::new(required(&self.regexp, "regexp", kind)?),
                regexp_tag: parse_tag(self.regexp_tag.as_deref().unwrap_or("null"))?,
                position,
                exclude_match,
            },
            RuleKind::Line => Rule::Line { tag, delegate },
            RuleKind::Keywords => Rule::Keywords,
        };
        Ok(rule)
    }
}
