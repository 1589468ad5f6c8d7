//! Plain text: no rules beyond the directive rules every mode gets

use crate::syntax::mode_file::{AttributesDef, ModeDefinition, RulesetDef};

/// Create the plain text definition
pub fn plain_mode() -> ModeDefinition {
    let main = RulesetDef::new().attributes(AttributesDef {
        highlight_digits: false,
        ..Default::default()
    });
    ModeDefinition::new("plain").ruleset("main", main)
}
