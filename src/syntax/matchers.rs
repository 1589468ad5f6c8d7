//! Rule matchers
//!
//! Each matcher tests one rule at one offset. A match colors through the
//! scan context and tells the main loop how far to advance.

use std::rc::Rc;

use super::directives;
use super::mode::Mode;
use super::rules::{char_before, find_span_end, MatchResult, Position, Regexp, Rule, SpanEnd, SpanOptions};
use super::scanner::ScanContext;
use super::state::{Continuation, SpanContinuation};
use super::tags::Tag;

use MatchResult::{Matched, NoMatch, Skip};

impl Rule {
    /// Try this rule at byte offset `i` of `line`
    pub fn try_match(&self, cx: &mut ScanContext<'_>, line: &str, i: usize) -> MatchResult {
        match self {
            Rule::Seq {
                seq,
                tag,
                position,
                delegate,
            } => match_seq(cx, line, i, seq, *tag, position, delegate.as_deref()),
            Rule::SeqRegexp {
                regexp,
                tag,
                position,
                delegate,
            } => match_seq_regexp(cx, line, i, regexp, *tag, position, delegate.as_deref()),
            Rule::Span {
                begin,
                end,
                tag,
                position,
                options,
                delegate,
                exclude_match,
            } => {
                if !starts_with(line, i, begin) || !allowed(cx, position, line, i, begin.len()) {
                    return NoMatch;
                }
                let span = SpanContinuation {
                    tag: *tag,
                    begin: begin.clone(),
                    end: end.clone(),
                    delegate: delegate.clone(),
                    exclude_match: *exclude_match,
                    options: *options,
                    depth: 0,
                };
                match_span(cx, line, i, span)
            }
            Rule::SpanRegexp {
                begin,
                end,
                tag,
                position,
                options,
                delegate,
                exclude_match,
            } => match_span_regexp(
                cx,
                line,
                i,
                begin,
                end,
                *tag,
                position,
                *options,
                delegate.as_deref(),
                *exclude_match,
            ),
            Rule::EolSpan {
                seq,
                tag,
                position,
                delegate,
                exclude_match,
            } => {
                if !starts_with(line, i, seq) || !allowed(cx, position, line, i, seq.len()) {
                    return NoMatch;
                }
                color_to_eol(cx, line, i, i + seq.len(), *tag, delegate.as_deref(), *exclude_match)
            }
            Rule::EolSpanRegexp {
                regexp,
                tag,
                position,
                delegate,
                exclude_match,
            } => {
                let n = regexp.match_len(line, i, cx.mode().attributes.ignore_case);
                if n == 0 || !allowed(cx, position, line, i, n) {
                    return NoMatch;
                }
                color_to_eol(cx, line, i, i + n, *tag, delegate.as_deref(), *exclude_match)
            }
            Rule::MarkFollowing {
                pattern,
                tag,
                position,
                exclude_match,
            } => match_mark_following(cx, line, i, pattern, *tag, position, *exclude_match),
            Rule::MarkPrevious {
                pattern,
                tag,
                position,
                exclude_match,
            } => match_mark_previous(cx, line, i, pattern, *tag, position, *exclude_match),
            Rule::WordAndRegexp {
                word,
                word_tag,
                regexp,
                regexp_tag,
                position,
                exclude_match,
            } => {
                if !starts_with(line, i, word) {
                    return NoMatch;
                }
                let j = i + word.len();
                let n = regexp.match_len(line, j, cx.mode().attributes.ignore_case);
                if n == 0 || !allowed(cx, position, line, i, word.len() + n) {
                    return NoMatch;
                }
                cx.color_range(line, i, j, *word_tag, None, *exclude_match);
                cx.color_range(line, j, j + n, *regexp_tag, None, false);
                Matched(j + n - i)
            }
            Rule::Line { tag, delegate } => {
                cx.color_range(line, i, line.len(), *tag, delegate.as_deref(), false);
                Matched(line.len() - i)
            }
            Rule::Keywords => match_keywords(cx, line, i),
            Rule::Directive(directive) => directives::match_directive(cx, *directive, line, i),
        }
    }
}

fn starts_with(line: &str, i: usize, prefix: &str) -> bool {
    !prefix.is_empty() && line.get(i..).is_some_and(|rest| rest.starts_with(prefix))
}

fn allowed(cx: &ScanContext<'_>, position: &Position, line: &str, i: usize, len: usize) -> bool {
    position.allows(line, i, len, |c| cx.is_word_char(c))
}

/// Color `line[i..j]` where `from..to` is the body between two delimiters
///
/// The delimiters keep the outer mode and are dropped with `exclude_match`;
/// the body may be handed to a delegate.
fn color_delimited(
    cx: &mut ScanContext<'_>,
    line: &str,
    (i, from, to, j): (usize, usize, usize, usize),
    tag: Tag,
    delegate: Option<&str>,
    exclude_match: bool,
) {
    if delegate.is_none() && !exclude_match {
        cx.color_range(line, i, j, tag, None, false);
        return;
    }
    cx.color_range(line, i, from, tag, None, exclude_match);
    cx.color_range(line, from, to, tag, delegate, false);
    cx.color_range(line, to, j, tag, None, exclude_match);
}

fn match_seq(
    cx: &mut ScanContext<'_>,
    line: &str,
    i: usize,
    seq: &str,
    tag: Tag,
    position: &Position,
    delegate: Option<&str>,
) -> MatchResult {
    if !starts_with(line, i, seq) || !allowed(cx, position, line, i, seq.len()) {
        return NoMatch;
    }
    cx.color_range(line, i, i + seq.len(), tag, delegate, false);
    Matched(seq.len())
}

fn match_seq_regexp(
    cx: &mut ScanContext<'_>,
    line: &str,
    i: usize,
    regexp: &Regexp,
    tag: Tag,
    position: &Position,
    delegate: Option<&str>,
) -> MatchResult {
    let n = regexp.match_len(line, i, cx.mode().attributes.ignore_case);
    if n == 0 || !allowed(cx, position, line, i, n) {
        return NoMatch;
    }
    cx.color_range(line, i, i + n, tag, delegate, false);
    Matched(n)
}

/// A span whose `begin` matched at `i`
fn match_span(cx: &mut ScanContext<'_>, line: &str, i: usize, span: SpanContinuation) -> MatchResult {
    let from = i + span.begin.len();
    let mode = Rc::clone(cx.mode());
    let found = find_span_end(
        line,
        from,
        &span.begin,
        &span.end,
        span.options,
        mode.attributes.escape,
        0,
        |c| mode.is_word_char(c),
    );
    match found {
        SpanEnd::Fail => NoMatch,
        SpanEnd::Found(k) => {
            let j = k + span.end.len();
            color_delimited(cx, line, (i, from, k, j), span.tag, span.delegate.as_deref(), span.exclude_match);
            Matched(j - i)
        }
        SpanEnd::Continues(depth) => {
            let n = line.len();
            color_delimited(cx, line, (i, from, n, n), span.tag, span.delegate.as_deref(), span.exclude_match);
            cx.set_restart(Continuation::Span(SpanContinuation { depth, ..span }));
            Matched(n + 1 - i)
        }
    }
}

/// Finish a span left open by an earlier line
///
/// Returns the offset where ordinary scanning resumes, past the end of the
/// line if the span continues again.
pub fn restart_span(cx: &mut ScanContext<'_>, line: &str, span: &SpanContinuation) -> usize {
    let mode = Rc::clone(cx.mode());
    let found = find_span_end(
        line,
        0,
        &span.begin,
        &span.end,
        span.options,
        mode.attributes.escape,
        span.depth,
        |c| mode.is_word_char(c),
    );
    let delegate = span.delegate.as_deref();
    match found {
        SpanEnd::Found(k) => {
            let j = k + span.end.len();
            color_delimited(cx, line, (0, 0, k, j), span.tag, delegate, span.exclude_match);
            cx.clear_state();
            j
        }
        // A word-break failure cannot end a span that is already open
        SpanEnd::Continues(_) | SpanEnd::Fail => {
            let depth = match found {
                SpanEnd::Continues(depth) => depth,
                _ => span.depth,
            };
            let n = line.len();
            color_delimited(cx, line, (0, 0, n, n), span.tag, delegate, span.exclude_match);
            cx.set_restart(Continuation::Span(SpanContinuation {
                depth,
                ..span.clone()
            }));
            n + 1
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn match_span_regexp(
    cx: &mut ScanContext<'_>,
    line: &str,
    i: usize,
    begin: &Regexp,
    end: &str,
    tag: Tag,
    position: &Position,
    options: SpanOptions,
    delegate: Option<&str>,
    exclude_match: bool,
) -> MatchResult {
    let mode = Rc::clone(cx.mode());
    let n = begin.match_len(line, i, mode.attributes.ignore_case);
    if n == 0 || !allowed(cx, position, line, i, n) {
        return NoMatch;
    }
    let from = i + n;
    let options = SpanOptions {
        nested: false,
        ..options
    };
    // The begin pattern cannot be carried to the next line, so the end
    // must be on this one
    match find_span_end(line, from, "", end, options, mode.attributes.escape, 0, |c| mode.is_word_char(c)) {
        SpanEnd::Found(k) => {
            let j = k + end.len();
            color_delimited(cx, line, (i, from, k, j), tag, delegate, exclude_match);
            Matched(j - i)
        }
        SpanEnd::Continues(_) | SpanEnd::Fail => NoMatch,
    }
}

fn color_to_eol(
    cx: &mut ScanContext<'_>,
    line: &str,
    i: usize,
    j: usize,
    tag: Tag,
    delegate: Option<&str>,
    exclude_match: bool,
) -> MatchResult {
    let n = line.len();
    color_delimited(cx, line, (i, j, n, n), tag, delegate, exclude_match);
    Matched(n - i)
}

/// End of the token after `j`: blanks, then a run of word characters
///
/// Returns `j` when no word follows.
fn next_token_end(mode: &Mode, line: &str, j: usize) -> usize {
    let rest = &line[j..];
    let word_start = rest.find(|c: char| !c.is_whitespace()).map_or(line.len(), |k| j + k);
    let word_end = line[word_start..]
        .find(|c: char| !mode.is_word_char(c))
        .map_or(line.len(), |k| word_start + k);
    if word_end == word_start {
        j
    } else {
        word_end
    }
}

fn match_mark_following(
    cx: &mut ScanContext<'_>,
    line: &str,
    i: usize,
    pattern: &str,
    tag: Tag,
    position: &Position,
    exclude_match: bool,
) -> MatchResult {
    if !starts_with(line, i, pattern) || !allowed(cx, position, line, i, pattern.len()) {
        return NoMatch;
    }
    let j = i + pattern.len();
    let mode = Rc::clone(cx.mode());
    let k = next_token_end(&mode, line, j);
    if k == j {
        return NoMatch;
    }
    cx.color_range(line, i, j, tag, None, exclude_match);
    cx.color_range(line, j, k, tag, None, false);
    Matched(k - i)
}

fn match_mark_previous(
    cx: &mut ScanContext<'_>,
    line: &str,
    i: usize,
    pattern: &str,
    tag: Tag,
    position: &Position,
    exclude_match: bool,
) -> MatchResult {
    if !starts_with(line, i, pattern) {
        return NoMatch;
    }
    let mode = Rc::clone(cx.mode());
    let start = line[..i]
        .char_indices()
        .rev()
        .take_while(|(_, c)| mode.is_word_char(*c))
        .last()
        .map_or(i, |(k, _)| k);
    if start == i || mode.keyword_tag(&line[start..i]).is_some() {
        return NoMatch;
    }
    // Position constraints apply to the marked word
    if !allowed(cx, position, line, start, i - start) {
        return NoMatch;
    }
    cx.color_range(line, start, i, tag, None, false);
    cx.color_range(line, i, i + pattern.len(), tag, None, exclude_match);
    Matched(pattern.len())
}

fn is_digit_word(mode: &Mode, word: &str) -> bool {
    if word.starts_with(|c: char| c.is_ascii_digit()) {
        return true;
    }
    mode.attributes
        .digit_re
        .as_ref()
        .is_some_and(|re| re.match_len(word, 0, mode.attributes.ignore_case) == word.len())
}

/// Look the word at `i` up in the keyword table
///
/// A word that is not a keyword is skipped whole.
fn match_keywords(cx: &mut ScanContext<'_>, line: &str, i: usize) -> MatchResult {
    let mode = Rc::clone(cx.mode());
    if char_before(line, i).is_some_and(|c| mode.is_word_char(c)) {
        return NoMatch;
    }
    let end = line[i..]
        .find(|c: char| !mode.is_word_char(c))
        .map_or(line.len(), |k| i + k);
    if end == i {
        return NoMatch;
    }
    let word = &line[i..end];
    if let Some(tag) = mode.keyword_tag(word) {
        cx.color_range(line, i, end, tag, None, false);
        return Matched(end - i);
    }
    if mode.attributes.highlight_digits && is_digit_word(&mode, word) {
        cx.set_tag(line, i, end, Tag::Digit);
        return Matched(end - i);
    }
    Skip(end - i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::mode_file::{AttributesDef, ModeDefinition, RuleDef, RulesetDef};
    use crate::syntax::state::NO_STATE;
    use crate::syntax::testing::{spans, Harness};

    fn toy(ruleset: RulesetDef) -> Harness {
        let mut h = Harness::new("toy");
        h.registry
            .register_definition(ModeDefinition::new("toy").ruleset("main", ruleset));
        h
    }

    fn colors<'a>(h: &mut Harness, line: &'a str) -> Vec<(&'a str, Tag)> {
        let (formats, _) = h.scan(NO_STATE, line);
        spans(line, &formats)
    }

    #[test]
    fn test_escaped_quote_does_not_end_string() {
        let mut h = Harness::new("python");
        let line = r#"a"b\"c"d"#;
        assert_eq!(colors(&mut h, line), [(r#""b\"c""#, Tag::Literal1)]);
    }

    #[test]
    fn test_nested_span() {
        let mut h = toy(RulesetDef::new().rule(RuleDef::span("(", ")", Tag::Literal3).nested()));
        assert_eq!(colors(&mut h, "(a(b)c) x"), [("(a(b)c)", Tag::Literal3)]);
    }

    #[test]
    fn test_nested_span_across_lines() {
        let mut h = toy(RulesetDef::new().rule(RuleDef::span("(", ")", Tag::Literal3).nested()));
        let lines = h.scan_lines(&["(a(b", "c) d) e"]);
        let name = &h.states.entry(lines[0].1).unwrap().name;
        assert_eq!(name, "toy;span;begin=(;depth=1;end=);lit3");
        assert_eq!(spans("c) d) e", &lines[1].0), [("c) d)", Tag::Literal3)]);
        assert_eq!(h.states.show(lines[1].1), " 1:toy");
    }

    #[test]
    fn test_no_line_break_fails_instead_of_continuing() {
        let mut h = Harness::new("c");
        let line = "x = \"abc";
        let (formats, state) = h.scan(NO_STATE, line);
        assert!(!spans(line, &formats).iter().any(|(_, tag)| *tag == Tag::Literal1));
        assert_eq!(h.states.show(state), " 1:c");
    }

    #[test]
    fn test_keyword_case_folding() {
        let mut h = toy(RulesetDef::new().keywords(Tag::Keyword1, &["if"]));
        assert_eq!(
            colors(&mut h, "IF If iF"),
            [("IF", Tag::Keyword1), ("If", Tag::Keyword1), ("iF", Tag::Keyword1)]
        );

        let sensitive = AttributesDef {
            ignore_case: false,
            ..Default::default()
        };
        let mut h = toy(RulesetDef::new().attributes(sensitive).keywords(Tag::Keyword1, &["if"]));
        assert_eq!(colors(&mut h, "IF if iF"), [("if", Tag::Keyword1)]);
    }

    #[test]
    fn test_regexp_without_leading_chars_runs_before_keywords() {
        let sensitive = AttributesDef {
            ignore_case: false,
            ..Default::default()
        };
        let ruleset = RulesetDef::new()
            .attributes(sensitive)
            .keywords(Tag::Keyword1, &["if"])
            .rule(RuleDef::seq_regexp(r"[A-Z]\w*", "", Tag::Function));
        let mut h = toy(ruleset);
        assert_eq!(
            colors(&mut h, "if Foo bar"),
            [("if", Tag::Keyword1), ("Foo", Tag::Function)]
        );
    }

    #[test]
    fn test_span_ends_differing_in_case_keep_separate_states() {
        let sensitive = AttributesDef {
            ignore_case: false,
            ..Default::default()
        };
        let mut h = toy(
            RulesetDef::new()
                .attributes(sensitive)
                .rule(RuleDef::span("{", "END", Tag::Literal1))
                .rule(RuleDef::span("[", "end", Tag::Literal1)),
        );
        let (_, upper) = h.scan(NO_STATE, "{ open");
        let (_, lower) = h.scan(NO_STATE, "[ open");
        assert_ne!(upper, lower);

        let line = "close end x";
        let (formats, state) = h.scan(lower, line);
        assert_eq!(spans(line, &formats), [("close end", Tag::Literal1)]);
        assert!(h.states.resolve(state).is_none());
    }

    #[test]
    fn test_keyword_inside_word_is_ignored() {
        let mut h = Harness::new("python");
        assert_eq!(colors(&mut h, "classify"), []);
        assert_eq!(colors(&mut h, "my_if"), []);
    }

    #[test]
    fn test_digits() {
        let mut h = Harness::new("python");
        assert_eq!(colors(&mut h, "x1 42"), [("42", Tag::Digit)]);
        let mut h = Harness::new("c");
        assert_eq!(colors(&mut h, "0x1F"), [("0x1F", Tag::Digit)]);
        let mut h = Harness::new("html");
        assert_eq!(colors(&mut h, "42"), []);
    }

    #[test]
    fn test_mark_following() {
        let mut h = toy(RulesetDef::new().rule(RuleDef::mark_following("$", Tag::Keyword2)));
        assert_eq!(colors(&mut h, "$name rest"), [("$", Tag::Keyword2), ("name", Tag::Keyword2)]);
        // Nothing follows, so nothing matches
        assert_eq!(colors(&mut h, "$ +"), []);
    }

    #[test]
    fn test_mark_previous() {
        let mut h = Harness::new("c");
        let found = colors(&mut h, "foo(x)");
        assert!(found.contains(&("foo", Tag::Function)), "{:?}", found);
        assert!(!found.contains(&("(", Tag::Function)), "{:?}", found);

        let found = colors(&mut h, "  done:");
        assert!(found.contains(&("done", Tag::Label)), "{:?}", found);

        // Keywords are never marked
        let found = colors(&mut h, "while(x)");
        assert!(found.contains(&("while", Tag::Keyword1)), "{:?}", found);
        assert!(!found.contains(&("while", Tag::Function)), "{:?}", found);
    }

    #[test]
    fn test_exclude_match_span() {
        let mut h = toy(RulesetDef::new().rule(RuleDef::span("[", "]", Tag::Literal1).exclude_match()));
        assert_eq!(colors(&mut h, "[ab] c"), [("ab", Tag::Literal1)]);
    }

    #[test]
    fn test_span_regexp_needs_end_on_line() {
        let mut h = toy(RulesetDef::new().rule(RuleDef::span_regexp(r"q\{", "q", "}", Tag::Literal3)));
        assert_eq!(colors(&mut h, "q{abc} z"), [("q{abc}", Tag::Literal3)]);
        let (formats, state) = h.scan(NO_STATE, "q{abc");
        assert!(formats.is_empty());
        assert_eq!(h.states.show(state), " 1:toy");
    }

    #[test]
    fn test_word_and_regexp() {
        let rule = RuleDef::word_and_regexp("fn", Tag::Keyword1, r"\s+\w+", Tag::Function);
        let mut h = toy(RulesetDef::new().rule(rule));
        assert_eq!(colors(&mut h, "fn main"), [("fn", Tag::Keyword1), (" main", Tag::Function)]);
    }

    #[test]
    fn test_line_rule() {
        let mut h = toy(RulesetDef::new().rule(RuleDef::line("%", Tag::Comment2)));
        assert_eq!(colors(&mut h, "a % b"), [("% b", Tag::Comment2)]);
    }

    #[test]
    fn test_eol_span_delegates_to_ruleset() {
        let mut h = Harness::new("c");
        let line = "#include <stdio.h>";
        let found = colors(&mut h, line);
        assert!(found.contains(&("#", Tag::Keyword2)), "{:?}", found);
        assert!(found.contains(&("include", Tag::Markup)), "{:?}", found);
        assert!(found.contains(&("<", Tag::Keyword2)), "{:?}", found);
    }

    #[test]
    fn test_at_line_start_regexp() {
        let mut h = Harness::new("rest");
        assert_eq!(colors(&mut h, "====="), [("=====", Tag::Label)]);
        assert_eq!(colors(&mut h, " ====="), []);
    }

    #[test]
    fn test_url_inside_comment() {
        let mut h = Harness::new("python");
        let line = "# see http://example.com/x now";
        assert_eq!(
            colors(&mut h, line),
            [("# see http://example.com/x now", Tag::Comment1), ("http://example.com/x", Tag::Url)]
        );
    }
}
