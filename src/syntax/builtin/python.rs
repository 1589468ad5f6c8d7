//! Python rule table

use super::operators;
use crate::syntax::mode_file::{AttributesDef, ModeDefinition, RuleDef, RulesetDef};
use crate::syntax::tags::Tag;

/// Create the Python definition
pub fn python_mode() -> ModeDefinition {
    let attributes = AttributesDef {
        escape: "\\".to_string(),
        ignore_case: false,
        ..Default::default()
    };

    let main = RulesetDef::new()
        .attributes(attributes)
        .rule(RuleDef::eol_span("#", Tag::Comment1))
        .rule(RuleDef::span("\"\"\"", "\"\"\"", Tag::Literal2))
        .rule(RuleDef::span("'''", "'''", Tag::Literal2))
        .rule(RuleDef::span("\"", "\"", Tag::Literal1))
        .rule(RuleDef::span("'", "'", Tag::Literal1))
        .keywords(
            Tag::Keyword1,
            &[
                "and", "as", "assert", "async", "await", "break", "class", "continue", "def",
                "del", "elif", "else", "except", "exec", "finally", "for", "from", "global",
                "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "print",
                "raise", "return", "try", "while", "with", "yield",
            ],
        )
        .keywords(
            Tag::Keyword2,
            &[
                "abs", "all", "any", "bool", "bytes", "callable", "chr", "compile", "complex",
                "delattr", "dict", "dir", "divmod", "enumerate", "eval", "filter", "float",
                "format", "frozenset", "getattr", "globals", "hasattr", "hash", "hex", "id",
                "input", "int", "isinstance", "issubclass", "iter", "len", "list", "locals",
                "map", "max", "min", "next", "object", "oct", "open", "ord", "pow", "property",
                "range", "repr", "reversed", "round", "set", "setattr", "slice", "sorted",
                "str", "sum", "super", "tuple", "type", "vars", "zip",
            ],
        )
        .keywords(
            Tag::Keyword3,
            &[
                "False", "None", "True", "NotImplemented", "Ellipsis", "self", "cls",
                "Exception", "ArithmeticError", "AssertionError", "AttributeError",
                "EOFError", "ImportError", "IndexError", "KeyError", "KeyboardInterrupt",
                "LookupError", "MemoryError", "NameError", "NotImplementedError", "OSError",
                "OverflowError", "RuntimeError", "StopIteration", "SyntaxError",
                "SystemExit", "TypeError", "ValueError", "ZeroDivisionError", "__init__",
                "__name__", "__main__", "__file__", "__doc__", "__dict__", "__class__",
            ],
        );

    ModeDefinition::new("python")
        .property("lineComment", "#")
        .ruleset(
            "main",
            operators(main, &["=", "!", ">=", "<=", "+", "-", "/", "*", ">", "<", "%", "&", "|", "^", "~"]),
        )
}
