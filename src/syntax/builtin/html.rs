//! HTML rule table
//!
//! Script blocks are colored with the JavaScript rules.

use crate::syntax::mode_file::{AttributesDef, ModeDefinition, RuleDef, RulesetDef};
use crate::syntax::tags::Tag;

/// Create the HTML definition
pub fn html_mode() -> ModeDefinition {
    let main = RulesetDef::new()
        .attributes(AttributesDef {
            highlight_digits: false,
            ..Default::default()
        })
        .rule(RuleDef::span("<!--", "-->", Tag::Comment1))
        .rule(RuleDef::span("<script>", "</script>", Tag::Markup).delegate("javascript"))
        .rule(RuleDef::span("<!", ">", Tag::Keyword2))
        .rule(RuleDef::span("<", ">", Tag::Markup).delegate("tags"))
        .rule(RuleDef::span("&", ";", Tag::Literal2).no_word_break().no_line_break());

    let tags = RulesetDef::new()
        .attributes(AttributesDef {
            default: "markup".to_string(),
            highlight_digits: false,
            ..Default::default()
        })
        .rule(RuleDef::span("\"", "\"", Tag::Literal1))
        .rule(RuleDef::span("'", "'", Tag::Literal1))
        .rule(RuleDef::seq("=", Tag::Operator));

    ModeDefinition::new("html")
        .ruleset("main", main)
        .ruleset("tags", tags)
}
