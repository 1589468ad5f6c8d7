//! Leo directives
//!
//! Directives work at two levels. Line-level matchers run as rules inside
//! every mode and move the scanner between coloring states. Node-level
//! scans decide, before any line is colored, whether a node is colored at
//! all and which language it starts in.
//!
//! The line-level states:
//!
//! | directive        | effect                                              |
//! |------------------|-----------------------------------------------------|
//! | `@color`         | color from here on                                  |
//! | `@nocolor`       | stop coloring until the next `@color`               |
//! | `@nocolor-node`  | stop coloring for the rest of the node              |
//! | `@killcolor`     | stop coloring for the rest of the node; sticky      |
//! | `@language name` | switch to `name`                                    |
//! | `@` or `@doc`    | start a doc part, ended by `@c`, `@code`, `@language` |

use once_cell::sync::Lazy;
use regex::Regex;

use super::host::{NodeId, Outline};
use super::registry::LanguageCatalog;
use super::rules::{char_at, match_word, skip_ws, Directive, MatchResult};
use super::scanner::ScanContext;
use super::state::Continuation;
use super::tags::Tag;

use MatchResult::{Matched, NoMatch, Skip};

/// Directive names colored as `leokeyword` when they start a line
pub const LEO_KEYWORDS: &[&str] = &[
    "all", "code", "color", "comment", "c", "delims", "doc", "encoding", "end_raw", "first",
    "header", "ignore", "killcolor", "language", "last", "lineending", "markup", "nocolor-node",
    "nocolor", "noheader", "nowrap", "others", "pagewidth", "path", "quiet", "raw", "root-code",
    "root-doc", "root", "silent", "tabwidth", "terse", "unit", "verbose", "wrap",
];

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(file|ftp|gopher|http|https|mailto|news|nntp|prospero|telnet|wais)://[^\s'"]+[\w=/]"#)
        .unwrap()
});

static COLOR_DIRECTIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^@(color|killcolor|nocolor-node|nocolor)\b").unwrap());

static LANGUAGE_DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^@language\s+([\w-]+)").unwrap());

const AT_COLOR: &str = "@color";
const AT_KILLCOLOR: &str = "@killcolor";
const AT_LANGUAGE: &str = "@language";
const AT_NOCOLOR: &str = "@nocolor";
const AT_NOCOLOR_NODE: &str = "@nocolor-node";

/// Length of a URL starting exactly at `i`, or 0
pub fn url_len(line: &str, i: usize) -> usize {
    match URL_RE.find_at(line, i) {
        Some(m) if m.start() == i => m.len(),
        _ => 0,
    }
}

/// Length of an `unl://` link starting at `i`, or 0
///
/// A link runs to the end of the line.
pub fn unl_len(line: &str, i: usize) -> usize {
    match line.get(i..i + 6) {
        Some(head) if head.eq_ignore_ascii_case("unl://") => line.len() - i,
        _ => 0,
    }
}

/// Try a directive rule at `i`
pub fn match_directive(cx: &mut ScanContext<'_>, directive: Directive, line: &str, i: usize) -> MatchResult {
    match directive {
        Directive::AtColor => match_at_color(cx, line, i),
        Directive::AtKillColor => {
            if i != 0 || !match_word(line, 0, AT_KILLCOLOR) {
                return NoMatch;
            }
            cx.set_restart(Continuation::KillColor);
            Matched(line.len())
        }
        Directive::AtLanguage => match_at_language(cx, line, i),
        Directive::AtNoColor => {
            if i != 0 || line.starts_with("@nocolor-") || !match_word(line, 0, AT_NOCOLOR) {
                return NoMatch;
            }
            cx.set_restart(Continuation::NoColor);
            Matched(line.len())
        }
        Directive::AtNoColorNode => {
            if i != 0 || !match_word(line, 0, AT_NOCOLOR_NODE) {
                return NoMatch;
            }
            cx.set_restart(Continuation::NoColorNode);
            Matched(line.len())
        }
        Directive::DocPart => match_doc_part(cx, line, i),
        Directive::LeoKeywords => match_leo_keywords(cx, line, i),
        Directive::SectionRef => match_section_ref(cx, line, i),
        Directive::Url => match_link(cx, line, i, url_len(line, i)),
        Directive::Unl => match_link(cx, line, i, unl_len(line, i)),
        Directive::Blanks => match_run(line, i, ' '),
        Directive::Tabs => match_run(line, i, '\t'),
        Directive::TrailingWhitespace => {
            let j = skip_ws(line, i);
            if j == i || j != line.len() {
                return NoMatch;
            }
            cx.color_range(line, i, j, Tag::TrailingWhitespace, None, false);
            Matched(j - i)
        }
    }
}

fn match_at_color(cx: &mut ScanContext<'_>, line: &str, i: usize) -> MatchResult {
    if i != 0 || !match_word(line, 0, AT_COLOR) {
        return NoMatch;
    }
    cx.set_restart(Continuation::Color);
    cx.color_range(line, 0, AT_COLOR.len(), Tag::LeoKeyword, None, false);
    Matched(AT_COLOR.len())
}

fn match_at_language(cx: &mut ScanContext<'_>, line: &str, i: usize) -> MatchResult {
    if i != 0 || !match_word(line, 0, AT_LANGUAGE) {
        return NoMatch;
    }
    let j = skip_ws(line, AT_LANGUAGE.len());
    let k = line[j..]
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
        .map_or(line.len(), |n| j + n);
    let name = &line[j..k];
    let known = if name.is_empty() {
        false
    } else if cx.is_active_language(name) {
        !cx.mode().is_unknown()
    } else {
        cx.switch_language(name)
    };
    if known {
        cx.color_range(line, 0, k, Tag::LeoKeyword, None, false);
    }
    Matched(k)
}

fn match_doc_part(cx: &mut ScanContext<'_>, line: &str, i: usize) -> MatchResult {
    if i != 0 {
        return NoMatch;
    }
    let j = if match_word(line, 0, "@doc") {
        4
    } else if line.starts_with('@') && matches!(char_at(line, 1), None | Some(' ') | Some('\t')) {
        1
    } else {
        return NoMatch;
    };
    cx.color_range(line, 0, j, Tag::LeoKeyword, None, false);

    if cx.options().doc_parts_as_rest {
        // A doc part inside a doc part resumes the same language
        let resume = match cx.continuation() {
            Some(Continuation::DocPart { resume: Some(language) }) => language.clone(),
            _ => cx.language().to_string(),
        };
        if cx.switch_language("rest") {
            cx.set_restart(Continuation::DocPart { resume: Some(resume) });
            return Matched(j);
        }
    }
    cx.set_restart(Continuation::DocPart { resume: None });
    cx.color_range(line, j, line.len(), Tag::DocPart, None, false);
    Matched(line.len())
}

fn match_leo_keywords(cx: &mut ScanContext<'_>, line: &str, i: usize) -> MatchResult {
    if !line[..i].chars().all(|c| c == ' ' || c == '\t') {
        return NoMatch;
    }
    let start = i + 1;
    let j = line[start..]
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
        .map_or(line.len(), |n| start + n);
    if !matches!(char_at(line, j), None | Some(' ') | Some('\t')) {
        return NoMatch;
    }
    let word = &line[start..j];
    if LEO_KEYWORDS.contains(&word) {
        cx.color_range(line, i, j, Tag::LeoKeyword, None, false);
        // The blank after the directive goes too
        return Matched((j + 1).min(line.len()) - i);
    }
    // Languages with '@' keywords of their own
    match cx.mode().keyword_tag(&line[i..j]) {
        Some(tag) => {
            cx.color_range(line, i, j, tag, None, false);
            Matched(j - i)
        }
        None => NoMatch,
    }
}

fn match_section_ref(cx: &mut ScanContext<'_>, line: &str, i: usize) -> MatchResult {
    if !line[i..].starts_with("<<") {
        return NoMatch;
    }
    let Some(k) = line[i + 2..].find(">>").map(|n| i + 2 + n) else {
        return NoMatch;
    };
    let j = k + 2;
    let tag = if cx.is_section_name(line[i + 2..k].trim()) {
        Tag::Link
    } else {
        Tag::Name
    };
    cx.color_range(line, i, i + 2, Tag::NameBrackets, None, false);
    cx.color_range(line, i + 2, k, tag, None, false);
    cx.color_range(line, k, j, Tag::NameBrackets, None, false);
    Matched(j - i)
}

fn match_link(cx: &mut ScanContext<'_>, line: &str, i: usize, n: usize) -> MatchResult {
    if n == 0 {
        return NoMatch;
    }
    cx.color_range(line, i, i + n, Tag::Url, None, false);
    Matched(n)
}

/// Skip a run of `c`; the host shows blanks and tabs itself
fn match_run(line: &str, i: usize, c: char) -> MatchResult {
    let n = line[i..].chars().take_while(|&x| x == c).count();
    if n == 0 {
        NoMatch
    } else {
        Skip(n * c.len_utf8())
    }
}

/// Continue after `@color`: watch for directives that turn coloring off
///
/// Returns the offset where the rules take over.
pub fn restart_color(cx: &mut ScanContext<'_>, line: &str) -> usize {
    let restart = if match_word(line, 0, AT_KILLCOLOR) {
        Continuation::KillColor
    } else if match_word(line, 0, AT_NOCOLOR_NODE) {
        Continuation::NoColorNode
    } else if match_word(line, 0, AT_NOCOLOR) {
        Continuation::NoColor
    } else {
        return 0;
    };
    cx.set_restart(restart);
    line.len() + 1
}

/// Continue after `@nocolor`: the line stays uncolored unless it starts
/// with `@color`
pub fn restart_no_color(cx: &mut ScanContext<'_>, line: &str) -> usize {
    if match_word(line, 0, AT_COLOR) {
        cx.set_restart(Continuation::Color);
        cx.color_range(line, 0, AT_COLOR.len(), Tag::LeoKeyword, None, false);
        return AT_COLOR.len();
    }
    if match_word(line, 0, AT_KILLCOLOR) {
        cx.set_restart(Continuation::KillColor);
    } else if match_word(line, 0, AT_NOCOLOR_NODE) {
        cx.set_restart(Continuation::NoColorNode);
    }
    line.len() + 1
}

/// Continue a doc part until `@c`, `@code` or `@language`
pub fn restart_doc_part(cx: &mut ScanContext<'_>, line: &str, resume: Option<&str>) -> usize {
    for tag in ["@code", "@c"] {
        if match_word(line, 0, tag) {
            cx.color_range(line, 0, tag.len(), Tag::LeoKeyword, None, false);
            end_doc_part(cx, resume);
            return tag.len();
        }
    }
    if match_word(line, 0, AT_LANGUAGE) {
        end_doc_part(cx, resume);
        return match match_at_language(cx, line, 0) {
            Matched(n) => n,
            _ => 0,
        };
    }
    if resume.is_some() {
        // The rest rules color the line
        return 0;
    }
    cx.color_range(line, 0, line.len(), Tag::DocPart, None, false);
    line.len() + 1
}

fn end_doc_part(cx: &mut ScanContext<'_>, resume: Option<&str>) {
    match resume {
        Some(language) if cx.switch_language(language) => {}
        _ => cx.clear_state(),
    }
}

/// Color directives found at the start of a body's lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorDirectives {
    pub color: bool,
    pub killcolor: bool,
    pub nocolor: bool,
    pub nocolor_node: bool,
}

/// Which color directives start a line of `body`
pub fn find_color_directives(body: &str) -> ColorDirectives {
    let mut found = ColorDirectives::default();
    for caps in COLOR_DIRECTIVE_RE.captures_iter(body) {
        match &caps[1] {
            "color" => found.color = true,
            "killcolor" => found.killcolor = true,
            "nocolor" => found.nocolor = true,
            "nocolor-node" => found.nocolor_node = true,
            _ => {}
        }
    }
    found
}

fn ancestors<'a>(outline: &'a dyn Outline, node: NodeId) -> impl Iterator<Item = NodeId> + 'a {
    std::iter::successors(outline.parent(node), move |&n| outline.parent(n))
}

/// True unless directives in the node or its ancestors turn coloring off
///
/// The node itself is only checked for `@killcolor` and `@nocolor-node`;
/// its own `@nocolor` is handled line by line. The nearest ancestor with an
/// unambiguous directive decides; `@killcolor` anywhere above wins.
pub fn use_syntax_coloring(outline: &dyn Outline, node: NodeId) -> bool {
    let own = find_color_directives(outline.body(node));
    if own.killcolor || own.nocolor_node {
        return false;
    }
    for ancestor in ancestors(outline, node) {
        let found = find_color_directives(outline.body(ancestor));
        if found.killcolor {
            return false;
        }
        if found.color && !found.nocolor {
            return true;
        }
        if found.nocolor && !found.color {
            return false;
        }
    }
    true
}

/// Every valid `@language` name in `body`, sorted and without duplicates
pub fn find_language_directives(body: &str, catalog: &dyn LanguageCatalog) -> Vec<String> {
    let mut languages: Vec<String> = LANGUAGE_DIRECTIVE_RE
        .captures_iter(body)
        .map(|caps| caps[1].to_lowercase())
        .filter(|name| catalog.is_known(name))
        .collect();
    languages.sort();
    languages.dedup();
    languages
}

fn find_first_language_directive(body: &str, catalog: &dyn LanguageCatalog) -> Option<String> {
    LANGUAGE_DIRECTIVE_RE
        .captures_iter(body)
        .map(|caps| caps[1].to_lowercase())
        .find(|name| catalog.is_known(name))
}

/// The language a node starts in
///
/// The first valid `@language` in the node wins, then the nearest
/// ancestor with exactly one valid `@language`, then the language of the
/// node's file, then `default`.
pub fn scan_language_directives(
    outline: &dyn Outline,
    node: NodeId,
    catalog: &dyn LanguageCatalog,
    default: &str,
) -> String {
    if let Some(language) = find_first_language_directive(outline.body(node), catalog) {
        return language;
    }
    for ancestor in ancestors(outline, node) {
        let mut languages = find_language_directives(outline.body(ancestor), catalog);
        if languages.len() == 1 {
            return languages.remove(0);
        }
    }
    outline
        .file_language(node)
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::registry::ModeRegistry;
    use crate::syntax::scanner::ScanOptions;
    use crate::syntax::state::NO_STATE;
    use crate::syntax::testing::{spans, Harness};

    /// Nodes as (body, parent)
    struct Tree(Vec<(&'static str, Option<NodeId>)>);

    impl Outline for Tree {
        fn body(&self, node: NodeId) -> &str {
            self.0[node].0
        }

        fn parent(&self, node: NodeId) -> Option<NodeId> {
            self.0[node].1
        }
    }

    fn all_formats(h: &mut Harness, lines: &[&str]) -> Vec<Vec<(String, Tag)>> {
        h.scan_lines(lines)
            .iter()
            .zip(lines)
            .map(|((formats, _), line)| {
                spans(line, formats)
                    .into_iter()
                    .map(|(text, tag)| (text.to_string(), tag))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_url_len() {
        assert_eq!(url_len("see https://leo-editor.github.io/ x", 4), 29);
        assert_eq!(url_len("see https://x.y", 0), 0);
        assert_eq!(url_len("http://", 0), 0);
        assert_eq!(unl_len("UNL://a/b c", 0), 11);
        assert_eq!(unl_len("unl:", 0), 0);
    }

    #[test]
    fn test_nocolor_until_color() {
        let mut h = Harness::new("python");
        let found = all_formats(&mut h, &["@nocolor", "x = 1", "@color", "y = 2"]);
        assert!(found[0].is_empty());
        assert!(found[1].is_empty());
        assert_eq!(found[2], [("@color".to_string(), Tag::LeoKeyword)]);
        assert!(found[3].contains(&("=".to_string(), Tag::Operator)));
    }

    #[test]
    fn test_killcolor_is_sticky() {
        let mut h = Harness::new("python");
        let found = all_formats(&mut h, &["x = 1", "@killcolor", "@color", "y = 2", "@nocolor", "@color"]);
        assert!(!found[0].is_empty());
        for formats in &found[1..] {
            assert!(formats.is_empty(), "{:?}", formats);
        }
    }

    #[test]
    fn test_nocolor_node_after_color() {
        let mut h = Harness::new("python");
        let found = all_formats(&mut h, &["@color", "@nocolor-node", "@color", "x = 1"]);
        assert_eq!(found[0], [("@color".to_string(), Tag::LeoKeyword)]);
        assert!(found[1..].iter().all(Vec::is_empty));
    }

    #[test]
    fn test_at_language_switches_mode() {
        let mut h = Harness::new("python");
        let lines = h.scan_lines(&["@language c", "int x;"]);
        assert_eq!(spans("@language c", &lines[0].0), [("@language c", Tag::LeoKeyword)]);
        assert_eq!(h.states.language_of(lines[0].1), Some("c"));
        assert!(spans("int x;", &lines[1].0).contains(&("int", Tag::Keyword3)));
    }

    #[test]
    fn test_at_language_unknown_keeps_mode() {
        let mut h = Harness::new("python");
        let (formats, state) = h.scan(NO_STATE, "@language klingon");
        assert!(formats.is_empty());
        assert_eq!(h.states.language_of(state), Some("python"));
    }

    #[test]
    fn test_doc_part() {
        let mut h = Harness::new("python");
        let found = all_formats(&mut h, &["@ some doc", "more doc", "@c", "x = 1"]);
        assert_eq!(
            found[0],
            [("@".to_string(), Tag::LeoKeyword), (" some doc".to_string(), Tag::DocPart)]
        );
        assert_eq!(found[1], [("more doc".to_string(), Tag::DocPart)]);
        assert_eq!(found[2], [("@c".to_string(), Tag::LeoKeyword)]);
        assert!(found[3].contains(&("=".to_string(), Tag::Operator)));
    }

    #[test]
    fn test_doc_part_as_rest() {
        let mut h = Harness::new("python");
        h.options = ScanOptions {
            doc_parts_as_rest: true,
            ..Default::default()
        };
        let lines = h.scan_lines(&["@doc", "``code``", "@code", "if x:"]);
        assert_eq!(h.states.language_of(lines[0].1), Some("rest"));
        assert_eq!(h.states.entry(lines[1].1).unwrap().name, "rest;@docpart;resume=python");
        assert_eq!(spans("``code``", &lines[1].0), [("``code``", Tag::Literal1)]);
        assert_eq!(h.states.language_of(lines[2].1), Some("python"));
        assert!(spans("if x:", &lines[3].0).contains(&("if", Tag::Keyword1)));
    }

    #[test]
    fn test_doc_part_ended_by_language() {
        let mut h = Harness::new("python");
        let lines = h.scan_lines(&["@", "text", "@language c", "int x;"]);
        assert_eq!(h.states.language_of(lines[2].1), Some("c"));
        assert!(spans("int x;", &lines[3].0).contains(&("int", Tag::Keyword3)));
    }

    #[test]
    fn test_leo_keywords() {
        let mut h = Harness::new("python");
        let (formats, _) = h.scan(NO_STATE, "    @others");
        assert_eq!(spans("    @others", &formats), [("@others", Tag::LeoKeyword)]);
        let (formats, _) = h.scan(NO_STATE, "x @others");
        assert!(formats.is_empty());
        let (formats, _) = h.scan(NO_STATE, "@nonesuch");
        assert!(formats.is_empty());
    }

    #[test]
    fn test_section_references() {
        let mut h = Harness::new("python");
        h.section_names.insert("imports".to_string());
        let line = "<< imports >> << missing >>";
        let (formats, _) = h.scan(NO_STATE, line);
        assert_eq!(
            spans(line, &formats),
            [
                ("<<", Tag::NameBrackets),
                (" imports ", Tag::Link),
                (">>", Tag::NameBrackets),
                ("<<", Tag::NameBrackets),
                (" missing ", Tag::Name),
                (">>", Tag::NameBrackets),
            ]
        );
    }

    #[test]
    fn test_trailing_whitespace() {
        let mut h = Harness::new("plain");
        h.registry = ModeRegistry::new(crate::syntax::registry::RegistryOptions {
            color_trailing_whitespace: true,
            ..Default::default()
        });
        let line = "a b \t";
        let (formats, _) = h.scan(NO_STATE, line);
        assert_eq!(spans(line, &formats), [(" \t", Tag::TrailingWhitespace)]);
    }

    struct Known;

    impl LanguageCatalog for Known {
        fn is_known(&self, language: &str) -> bool {
            matches!(language, "python" | "c" | "rest")
        }
    }

    #[test]
    fn test_find_color_directives() {
        let found = find_color_directives("x\n@nocolor-node\n  @color\n@killcolor");
        assert!(found.nocolor_node);
        assert!(found.killcolor);
        assert!(!found.nocolor);
        assert!(!found.color, "indented directives do not count");
    }

    #[test]
    fn test_ancestor_nocolor_disables_node() {
        let tree = Tree(vec![("@nocolor\n", None), ("child", Some(0)), ("@color\n", Some(1))]);
        assert!(!use_syntax_coloring(&tree, 1));
        // A nearer unambiguous @color wins
        let tree = Tree(vec![("@nocolor\n", None), ("@color\nbody", Some(0)), ("leaf", Some(1))]);
        assert!(use_syntax_coloring(&tree, 2));
    }

    #[test]
    fn test_own_directives() {
        let tree = Tree(vec![("@nocolor-node\n", None)]);
        assert!(!use_syntax_coloring(&tree, 0));
        // The node's own @nocolor is applied line by line
        let tree = Tree(vec![("@nocolor\n", None)]);
        assert!(use_syntax_coloring(&tree, 0));
        let tree = Tree(vec![("@killcolor\n@color\n", None), ("x", Some(0))]);
        assert!(!use_syntax_coloring(&tree, 1));
    }

    #[test]
    fn test_scan_language_directives() {
        let tree = Tree(vec![
            ("@language c\n", None),
            ("@language klingon\n@language python\n", Some(0)),
            ("body", Some(0)),
            ("@language c\n@language python\n", Some(0)),
            ("leaf", Some(3)),
        ]);
        assert_eq!(scan_language_directives(&tree, 1, &Known, "plain"), "python");
        assert_eq!(scan_language_directives(&tree, 2, &Known, "plain"), "c");
        // Ambiguous parent, so the grandparent decides
        assert_eq!(scan_language_directives(&tree, 4, &Known, "plain"), "c");

        let tree = Tree(vec![("nothing", None)]);
        assert_eq!(scan_language_directives(&tree, 0, &Known, "plain"), "plain");
    }

    #[test]
    fn test_find_language_directives() {
        let body = "@language python\n@language c\n@language python\n @language rest\n";
        assert_eq!(find_language_directives(body, &Known), ["c", "python"]);
    }
}
