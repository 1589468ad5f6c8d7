//! reStructuredText rule table, used for doc parts

use crate::syntax::mode_file::{AttributesDef, ModeDefinition, RuleDef, RulesetDef};
use crate::syntax::tags::Tag;

const UNDERLINE_CHARS: &str = "=-~^\"'`#*+";

/// Create the reStructuredText definition
pub fn rest_mode() -> ModeDefinition {
    let main = RulesetDef::new()
        .attributes(AttributesDef {
            highlight_digits: false,
            ..Default::default()
        })
        .rule(
            RuleDef::seq_regexp(r#"(={3,}|-{3,}|~{3,}|\^{3,}|"{3,}|'{3,}|`{3,}|#{3,}|\*{3,}|\+{3,})\s*$"#, UNDERLINE_CHARS, Tag::Label)
                .at_line_start(),
        )
        .rule(RuleDef::span("``", "``", Tag::Literal1).no_line_break())
        .rule(RuleDef::span("**", "**", Tag::Keyword1).no_line_break())
        .rule(RuleDef::span("*", "*", Tag::Keyword2).no_line_break().no_escape())
        .rule(RuleDef::span("`", "`", Tag::Label).no_line_break())
        .rule(RuleDef::seq_regexp(r"\.\.\s+[\w-]+::", ".", Tag::Keyword3).at_whitespace_end())
        .rule(RuleDef::eol_span("..", Tag::Comment1).at_whitespace_end())
        .rule(RuleDef::seq_regexp(r":[\w-]+:", ":", Tag::Keyword4));

    ModeDefinition::new("rest").ruleset("main", main)
}
