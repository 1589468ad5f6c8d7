//! C rule table
//!
//! Preprocessor lines are delegated to the `cpp` ruleset, and the operand of
//! `#include` to the `include` ruleset.

use super::operators;
use crate::syntax::mode_file::{AttributesDef, ModeDefinition, RuleDef, RulesetDef};
use crate::syntax::tags::Tag;

const DIGIT_RE: &str = r"(0x[[:xdigit:]]+[lL]?|[[:digit:]]+(e[[:digit:]]*)?[lLdDfF]?)";

fn attributes(default: &str) -> AttributesDef {
    AttributesDef {
        default: default.to_string(),
        digit_re: DIGIT_RE.to_string(),
        escape: "\\".to_string(),
        ignore_case: false,
        ..Default::default()
    }
}

/// Create the C definition
pub fn c_mode() -> ModeDefinition {
    let main = RulesetDef::new()
        .attributes(attributes("null"))
        .rule(RuleDef::span("/**", "*/", Tag::Comment3))
        .rule(RuleDef::span("/*!", "*/", Tag::Comment3))
        .rule(RuleDef::span("/*", "*/", Tag::Comment1))
        .rule(RuleDef::span("\"", "\"", Tag::Literal1).no_line_break())
        .rule(RuleDef::span("'", "'", Tag::Literal1).no_line_break())
        .rule(RuleDef::seq("##", Tag::Keyword2))
        .rule(RuleDef::eol_span("#", Tag::Keyword2).delegate("cpp"))
        .rule(RuleDef::eol_span("//", Tag::Comment2))
        .rule(RuleDef::mark_previous(":", Tag::Label).at_whitespace_end().exclude_match())
        .rule(RuleDef::mark_previous("(", Tag::Function).exclude_match())
        .keywords(
            Tag::Keyword1,
            &[
                "auto", "break", "case", "const", "continue", "default", "do", "else", "enum",
                "extern", "for", "goto", "if", "register", "return", "sizeof", "static",
                "struct", "switch", "typedef", "union", "volatile", "while",
            ],
        )
        .keywords(Tag::Keyword2, &["asm", "inline", "restrict", "far", "near"])
        .keywords(
            Tag::Keyword3,
            &[
                "char", "double", "float", "int", "long", "short", "signed", "unsigned",
                "void", "size_t", "bool",
            ],
        )
        .keywords(Tag::Literal2, &["NULL", "true", "false"]);

    let cpp = RulesetDef::new()
        .attributes(attributes("keyword2"))
        .rule(RuleDef::span("/*", "*/", Tag::Comment1))
        .rule(RuleDef::eol_span("include", Tag::Markup).delegate("include"))
        .keywords(
            Tag::Markup,
            &[
                "assert", "define", "elif", "else", "endif", "error", "ident", "if", "ifdef",
                "ifndef", "import", "include_next", "line", "pragma", "undef", "warning",
            ],
        );

    let include = RulesetDef::new().attributes(attributes("keyword2"));

    ModeDefinition::new("c")
        .property("lineComment", "//")
        .ruleset(
            "main",
            operators(
                main,
                &["=", "!", ">=", "<=", "+", "-", "/", "*", ">", "<", "%", "&", "|", "^", "~", "}", "{"],
            ),
        )
        .ruleset("cpp", cpp)
        .ruleset("include", include)
}
