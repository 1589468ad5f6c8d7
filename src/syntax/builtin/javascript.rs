//! JavaScript rule table

use super::operators;
use crate::syntax::mode_file::{AttributesDef, ModeDefinition, RuleDef, RulesetDef};
use crate::syntax::tags::Tag;

/// Create the JavaScript definition
pub fn javascript_mode() -> ModeDefinition {
    let attributes = AttributesDef {
        digit_re: r"(0x[[:xdigit:]]+[lL]?|[[:digit:]]+(e[[:digit:]]*)?[lLdDfF]?)".to_string(),
        escape: "\\".to_string(),
        ignore_case: false,
        ..Default::default()
    };

    let main = RulesetDef::new()
        .attributes(attributes)
        .rule(RuleDef::span("/*", "*/", Tag::Comment1))
        .rule(RuleDef::span("\"", "\"", Tag::Literal1).no_line_break())
        .rule(RuleDef::span("'", "'", Tag::Literal1).no_line_break())
        .rule(RuleDef::span("`", "`", Tag::Literal2))
        .rule(RuleDef::seq("<!--", Tag::Comment1))
        .rule(RuleDef::eol_span("//", Tag::Comment2))
        .rule(RuleDef::mark_previous("(", Tag::Function).exclude_match())
        .keywords(
            Tag::Keyword1,
            &[
                "async", "await", "break", "case", "catch", "class", "const", "continue",
                "debugger", "default", "delete", "do", "else", "export", "extends", "finally",
                "for", "function", "if", "import", "in", "instanceof", "let", "new", "return",
                "static", "super", "switch", "this", "throw", "try", "typeof", "var", "void",
                "while", "with", "yield",
            ],
        )
        .keywords(
            Tag::Keyword3,
            &[
                "Array", "Boolean", "Date", "Function", "Math", "Number", "Object", "Promise",
                "RegExp", "String", "JSON", "console", "document", "window",
            ],
        )
        .keywords(Tag::Literal2, &["false", "null", "true", "undefined", "NaN", "Infinity"]);

    ModeDefinition::new("javascript")
        .property("lineComment", "//")
        .ruleset(
            "main",
            operators(
                main,
                &[
                    "=", "!", ">=", "<=", "+", "-", "/", "*", ">", "<", "%", "&", "|", "^", "~",
                    ".", ",", ";", ":", "?", "[", "]", "{", "}",
                ],
            ),
        )
}
