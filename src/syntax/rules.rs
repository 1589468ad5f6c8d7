//! Pattern rules for syntax coloring
//!
//! This module defines the rule variants stored in a mode's per-character
//! rule lists, plus the pure text helpers the matchers share. The matching
//! itself lives in `matchers`, which needs a live scan context.

use std::fmt;

use log::warn;
use once_cell::unsync::OnceCell;
use regex::{Regex, RegexBuilder};

use super::tags::Tag;

/// Outcome of trying one rule at one offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// The rule matched and colored this many bytes. A length that runs
    /// past the end of the line means the rule consumed the whole line.
    Matched(usize),
    /// The rule proved that nothing can match for this many bytes, so
    /// the main loop may skip them without coloring.
    Skip(usize),
    /// Try the next rule at the same offset.
    NoMatch,
}

/// Where a rule is allowed to match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Position {
    /// The match must start the line
    pub at_line_start: bool,
    /// The match must be the first non-whitespace text of the line
    pub at_whitespace_end: bool,
    /// The match must start a word
    pub at_word_start: bool,
}

impl Position {
    /// Anywhere on the line
    pub const ANYWHERE: Position = Position {
        at_line_start: false,
        at_whitespace_end: false,
        at_word_start: false,
    };

    /// Check the position constraints for a match of `len` bytes at `i`
    pub fn allows(&self, line: &str, i: usize, len: usize, is_word_char: impl Fn(char) -> bool) -> bool {
        if self.at_line_start && i != 0 {
            return false;
        }
        if self.at_whitespace_end && i != skip_ws(line, 0) {
            return false;
        }
        if self.at_word_start {
            if char_before(line, i).is_some_and(&is_word_char) {
                return false;
            }
            if char_at(line, i + len).is_some_and(&is_word_char) {
                return false;
            }
        }
        true
    }
}

/// Options that control how a span looks for its end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SpanOptions {
    /// Ignore the ruleset's escape character
    pub no_escape: bool,
    /// The end must be on the same line or the match fails
    pub no_line_break: bool,
    /// The end may not directly follow a word character
    pub no_word_break: bool,
    /// Nested begin/end pairs must balance before the span ends
    pub nested: bool,
}

/// A regular expression compiled on first use
///
/// Imported rules are shared between modes that may differ in case
/// sensitivity, so each flag gets its own compiled form. A pattern that
/// fails to compile is reported once per flag and then matches nothing
/// for the rest of the session.
pub struct Regexp {
    pattern: String,
    /// Indexed by `ignore_case as usize`
    compiled: [OnceCell<Option<Regex>>; 2],
}

impl Regexp {
    /// Wrap a pattern without compiling it
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            compiled: [OnceCell::new(), OnceCell::new()],
        }
    }

    /// The source pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The compiled expression, or `None` if the pattern is malformed
    pub fn get(&self, ignore_case: bool) -> Option<&Regex> {
        self.compiled[ignore_case as usize]
            .get_or_init(|| {
                match RegexBuilder::new(&self.pattern)
                    .multi_line(true)
                    .case_insensitive(ignore_case)
                    .build()
                {
                    Ok(regex) => Some(regex),
                    Err(err) => {
                        warn!("invalid regular expression {:?}: {}", self.pattern, err);
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Length of a match that starts exactly at `i`, or 0
    ///
    /// A match that starts later in the line does not count.
    pub fn match_len(&self, line: &str, i: usize, ignore_case: bool) -> usize {
        let Some(regex) = self.get(ignore_case) else {
            return 0;
        };
        if i > line.len() {
            return 0;
        }
        match regex.find_at(line, i) {
            Some(m) if m.start() == i => m.end() - m.start(),
            _ => 0,
        }
    }
}

impl fmt::Debug for Regexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Regexp").field(&self.pattern).finish()
    }
}

/// Built-in rules added to every ruleset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    AtColor,
    AtKillColor,
    AtLanguage,
    AtNoColor,
    AtNoColorNode,
    DocPart,
    LeoKeywords,
    SectionRef,
    Url,
    Unl,
    Blanks,
    Tabs,
    TrailingWhitespace,
}

/// One entry in a per-character rule list
#[derive(Debug)]
pub enum Rule {
    /// A literal sequence
    Seq {
        seq: String,
        tag: Tag,
        position: Position,
        delegate: Option<String>,
    },
    /// A regular expression that must match at the offset
    SeqRegexp {
        regexp: Regexp,
        tag: Tag,
        position: Position,
        delegate: Option<String>,
    },
    /// A `begin` literal followed by an `end` literal, possibly on a later line
    Span {
        begin: String,
        end: String,
        tag: Tag,
        position: Position,
        options: SpanOptions,
        delegate: Option<String>,
        exclude_match: bool,
    },
    /// A regular expression `begin` followed by an `end` literal on the same line
    SpanRegexp {
        begin: Regexp,
        end: String,
        tag: Tag,
        position: Position,
        options: SpanOptions,
        delegate: Option<String>,
        exclude_match: bool,
    },
    /// A literal that starts an end-of-line construct
    EolSpan {
        seq: String,
        tag: Tag,
        position: Position,
        delegate: Option<String>,
        exclude_match: bool,
    },
    /// A regular expression that starts an end-of-line construct
    EolSpanRegexp {
        regexp: Regexp,
        tag: Tag,
        position: Position,
        delegate: Option<String>,
        exclude_match: bool,
    },
    /// A marker whose following token gets the tag
    MarkFollowing {
        pattern: String,
        tag: Tag,
        position: Position,
        exclude_match: bool,
    },
    /// A marker whose preceding word gets the tag
    MarkPrevious {
        pattern: String,
        tag: Tag,
        position: Position,
        exclude_match: bool,
    },
    /// A literal word immediately followed by a regular expression
    WordAndRegexp {
        word: String,
        word_tag: Tag,
        regexp: Regexp,
        regexp_tag: Tag,
        position: Position,
        exclude_match: bool,
    },
    /// The rest of the line
    Line { tag: Tag, delegate: Option<String> },
    /// Keyword table lookup
    Keywords,
    /// A built-in directive matcher
    Directive(Directive),
}

impl Rule {
    /// Short description used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            Rule::Seq { seq, tag, .. } => format!("seq {:?} -> {}", seq, tag.name()),
            Rule::SeqRegexp { regexp, tag, .. } => {
                format!("seq_regexp {:?} -> {}", regexp.pattern(), tag.name())
            }
            Rule::Span { begin, end, tag, .. } => {
                format!("span {:?}..{:?} -> {}", begin, end, tag.name())
            }
            Rule::SpanRegexp { begin, end, tag, .. } => {
                format!("span_regexp {:?}..{:?} -> {}", begin.pattern(), end, tag.name())
            }
            Rule::EolSpan { seq, tag, .. } => format!("eol_span {:?} -> {}", seq, tag.name()),
            Rule::EolSpanRegexp { regexp, tag, .. } => {
                format!("eol_span_regexp {:?} -> {}", regexp.pattern(), tag.name())
            }
            Rule::MarkFollowing { pattern, tag, .. } => {
                format!("mark_following {:?} -> {}", pattern, tag.name())
            }
            Rule::MarkPrevious { pattern, tag, .. } => {
                format!("mark_previous {:?} -> {}", pattern, tag.name())
            }
            Rule::WordAndRegexp { word, regexp, .. } => {
                format!("word_and_regexp {:?} {:?}", word, regexp.pattern())
            }
            Rule::Line { tag, .. } => format!("line -> {}", tag.name()),
            Rule::Keywords => "keywords".to_string(),
            Rule::Directive(directive) => format!("directive {:?}", directive),
        }
    }
}

/// Where a span's end was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanEnd {
    /// The end delimiter starts at this byte offset
    Found(usize),
    /// No end on this line; the span continues at this nesting depth
    Continues(usize),
    /// The span cannot match
    Fail,
}

/// Search for the end of a span, starting at byte offset `from`
///
/// An end delimiter preceded by an odd number of escape characters does
/// not count. With nesting enabled, every unescaped `begin` must be closed
/// by its own `end` first; `depth` is the nesting already open on entry.
pub fn find_span_end(
    line: &str,
    from: usize,
    begin: &str,
    end: &str,
    options: SpanOptions,
    escape: Option<char>,
    depth: usize,
    is_word_char: impl Fn(char) -> bool,
) -> SpanEnd {
    if end.is_empty() {
        return SpanEnd::Fail;
    }
    let escape = if options.no_escape { None } else { escape };
    let nested = options.nested && !begin.is_empty();
    let mut depth = depth;
    let mut pos = from.min(line.len());

    loop {
        let rest = &line[pos..];
        let end_at = rest.find(end).map(|k| pos + k);

        // An unescaped begin ahead of the next end opens a nesting level
        if nested {
            if let Some(b) = rest.find(begin).map(|k| pos + k) {
                if end_at.map_or(true, |e| b < e) {
                    if is_escaped(line, b, escape) {
                        pos = next_boundary(line, b);
                    } else {
                        depth += 1;
                        pos = b + begin.len();
                    }
                    continue;
                }
            }
        }

        let Some(j) = end_at else {
            return if options.no_line_break {
                SpanEnd::Fail
            } else {
                SpanEnd::Continues(depth)
            };
        };
        if options.no_word_break && char_before(line, j).is_some_and(&is_word_char) {
            return SpanEnd::Fail;
        }
        if is_escaped(line, j, escape) {
            pos = next_boundary(line, j);
        } else if depth == 0 {
            return SpanEnd::Found(j);
        } else {
            depth -= 1;
            pos = j + end.len();
        }
    }
}

/// True if the character at `i` is preceded by an odd number of escapes
pub fn is_escaped(line: &str, i: usize, escape: Option<char>) -> bool {
    let Some(esc) = escape else {
        return false;
    };
    let count = line[..i].chars().rev().take_while(|&c| c == esc).count();
    count % 2 == 1
}

/// Offset of the first non-blank character at or after `i`
pub fn skip_ws(line: &str, i: usize) -> usize {
    let i = i.min(line.len());
    line[i..]
        .find(|c: char| c != ' ' && c != '\t')
        .map_or(line.len(), |k| i + k)
}

/// True if `word` occurs at `i` and is not followed by an identifier character
pub fn match_word(line: &str, i: usize, word: &str) -> bool {
    if word.is_empty() || !line.get(i..).is_some_and(|rest| rest.starts_with(word)) {
        return false;
    }
    !char_at(line, i + word.len()).is_some_and(is_identifier_char)
}

/// Letters, digits and underscore
pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// The character starting at byte offset `i`
pub fn char_at(line: &str, i: usize) -> Option<char> {
    line.get(i..).and_then(|rest| rest.chars().next())
}

/// The character ending at byte offset `i`
pub fn char_before(line: &str, i: usize) -> Option<char> {
    line.get(..i).and_then(|head| head.chars().next_back())
}

/// Byte offset of the character boundary after `i`
pub fn next_boundary(line: &str, i: usize) -> usize {
    match char_at(line, i) {
        Some(c) => i + c.len_utf8(),
        None => line.len() + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(c: char) -> bool {
        is_identifier_char(c)
    }

    #[test]
    fn test_find_span_end_plain() {
        let line = r#"a"b"c"#;
        let end = find_span_end(line, 2, "\"", "\"", SpanOptions::default(), None, 0, word);
        assert_eq!(end, SpanEnd::Found(3));
    }

    #[test]
    fn test_find_span_end_escaped() {
        let line = r#"a"b\"c"d"#;
        let end = find_span_end(line, 2, "\"", "\"", SpanOptions::default(), Some('\\'), 0, word);
        assert_eq!(end, SpanEnd::Found(6));

        // Two escapes cancel out
        let line = r#""b\\"c"#;
        let end = find_span_end(line, 1, "\"", "\"", SpanOptions::default(), Some('\\'), 0, word);
        assert_eq!(end, SpanEnd::Found(4));
    }

    #[test]
    fn test_find_span_end_no_escape_option() {
        let line = r#""b\"c"#;
        let options = SpanOptions {
            no_escape: true,
            ..Default::default()
        };
        let end = find_span_end(line, 1, "\"", "\"", options, Some('\\'), 0, word);
        assert_eq!(end, SpanEnd::Found(3));
    }

    #[test]
    fn test_find_span_end_continues_or_fails() {
        let line = "x = \"\"\"start";
        let end = find_span_end(line, 7, "\"\"\"", "\"\"\"", SpanOptions::default(), None, 0, word);
        assert_eq!(end, SpanEnd::Continues(0));

        let options = SpanOptions {
            no_line_break: true,
            ..Default::default()
        };
        let end = find_span_end(line, 7, "\"\"\"", "\"\"\"", options, None, 0, word);
        assert_eq!(end, SpanEnd::Fail);
    }

    #[test]
    fn test_find_span_end_nested() {
        let options = SpanOptions {
            nested: true,
            ..Default::default()
        };
        let line = "(a(b)c)";
        assert_eq!(find_span_end(line, 1, "(", ")", options, None, 0, word), SpanEnd::Found(6));

        let line = "(a(b";
        assert_eq!(find_span_end(line, 1, "(", ")", options, None, 0, word), SpanEnd::Continues(1));

        // Resuming at depth 1 skips the first close
        let line = "c) d)";
        assert_eq!(find_span_end(line, 0, "(", ")", options, None, 1, word), SpanEnd::Found(4));
    }

    #[test]
    fn test_find_span_end_no_word_break() {
        let options = SpanOptions {
            no_word_break: true,
            ..Default::default()
        };
        assert_eq!(find_span_end("'ab'", 1, "'", "'", options, None, 0, word), SpanEnd::Fail);
        assert_eq!(find_span_end("'a '", 1, "'", "'", options, None, 0, word), SpanEnd::Found(3));
    }

    #[test]
    fn test_position_allows() {
        let line = "  foo bar";
        let ws_end = Position {
            at_whitespace_end: true,
            ..Default::default()
        };
        assert!(ws_end.allows(line, 2, 3, word));
        assert!(!ws_end.allows(line, 6, 3, word));

        let line_start = Position {
            at_line_start: true,
            ..Default::default()
        };
        assert!(!line_start.allows(line, 2, 3, word));

        let word_start = Position {
            at_word_start: true,
            ..Default::default()
        };
        assert!(word_start.allows("a foo", 2, 3, word));
        assert!(!word_start.allows("afoo", 1, 3, word));
        assert!(!word_start.allows("a foox", 2, 3, word));
    }

    #[test]
    fn test_regexp_match_at_position() {
        let re = Regexp::new(r"\d+");
        assert_eq!(re.match_len("abc 123", 4, false), 3);
        // A later match is not a match at the offset
        assert_eq!(re.match_len("abc 123", 0, false), 0);
    }

    #[test]
    fn test_regexp_compiled_per_case_flag() {
        let re = Regexp::new(r"end\b");
        assert_eq!(re.match_len("END", 0, false), 0);
        assert_eq!(re.match_len("END", 0, true), 3);
        assert_eq!(re.match_len("END", 0, false), 0);
        assert_eq!(re.match_len("end", 0, false), 3);
    }

    #[test]
    fn test_regexp_malformed_matches_nothing() {
        let re = Regexp::new(r"(unclosed");
        assert!(re.get(false).is_none());
        assert_eq!(re.match_len("(unclosed", 0, false), 0);
    }

    #[test]
    fn test_match_word() {
        assert!(match_word("@color", 0, "@color"));
        assert!(match_word("@color on", 0, "@color"));
        assert!(!match_word("@colorful", 0, "@color"));
        // '-' is not an identifier character
        assert!(match_word("@nocolor-node", 0, "@nocolor"));
    }

    #[test]
    fn test_skip_ws() {
        assert_eq!(skip_ws("  \tx", 0), 3);
        assert_eq!(skip_ws("   ", 0), 3);
        assert_eq!(skip_ws("x", 0), 0);
    }
}
