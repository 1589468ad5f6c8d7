//! Built-in rule tables
//!
//! These are used when the modes directory has no file for a language.

mod c;
mod html;
mod javascript;
mod plain;
mod python;
mod rest;

use std::path::Path;

use super::mode_file::{ModeDefinition, RuleDef, RulesetDef};
use super::tags::Tag;

/// Languages with a built-in rule table
pub const LANGUAGES: &[&str] = &["c", "html", "javascript", "plain", "python", "rest"];

/// Built-in definition for a normalized language name
pub fn definition(language: &str) -> Option<ModeDefinition> {
    let definition = match language {
        "c" => c::c_mode(),
        "html" => html::html_mode(),
        "javascript" => javascript::javascript_mode(),
        "plain" => plain::plain_mode(),
        "python" => python::python_mode(),
        "rest" => rest::rest_mode(),
        _ => return None,
    };
    Some(definition)
}

/// True if `language` has a built-in rule table
pub fn is_builtin(language: &str) -> bool {
    LANGUAGES.contains(&language)
}

/// Language implied by a file name's extension
pub fn language_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let language = match ext.as_str() {
        "c" | "h" => "c",
        "htm" | "html" => "html",
        "js" | "mjs" => "javascript",
        "py" | "pyw" => "python",
        "rest" | "rst" => "rest",
        "txt" => "plain",
        _ => return None,
    };
    Some(language)
}

/// Append one operator rule per sequence
fn operators(ruleset: RulesetDef, ops: &[&str]) -> RulesetDef {
    ops.iter()
        .fold(ruleset, |ruleset, op| ruleset.rule(RuleDef::seq(op, Tag::Operator)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtins_build() {
        for language in LANGUAGES {
            let def = definition(language).unwrap();
            assert_eq!(&def.language, language);
            for key in def.rulesets.keys() {
                let mode = def.build_mode(key).unwrap();
                assert_eq!(mode.language, *language);
            }
        }
    }

    #[test]
    fn test_builtin_regexps_compile() {
        use crate::syntax::rules::Rule;
        for language in LANGUAGES {
            let def = definition(language).unwrap();
            for key in def.rulesets.keys() {
                let mode = def.build_mode(key).unwrap();
                let attrs = &mode.attributes;
                if let Some(re) = &attrs.digit_re {
                    assert!(re.get(attrs.ignore_case).is_some(), "{}", re.pattern());
                }
                for c in ['=', '.', ':', '<', '#', '*'] {
                    for rule in mode.rules_for(c) {
                        if let Rule::SeqRegexp { regexp, .. } = rule.as_ref() {
                            assert!(regexp.get(attrs.ignore_case).is_some(), "{}", regexp.pattern());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(definition("klingon").is_none());
        assert!(is_builtin("python"));
        assert!(!is_builtin("rust"));
    }

    #[test]
    fn test_language_for_path() {
        assert_eq!(language_for_path(Path::new("src/main.C")), Some("c"));
        assert_eq!(language_for_path(Path::new("docs/index.rst")), Some("rest"));
        assert_eq!(language_for_path(Path::new("leo.py")), Some("python"));
        assert_eq!(language_for_path(Path::new("Makefile")), None);
        assert_eq!(language_for_path(Path::new("lib.rs")), None);
    }

    #[test]
    fn test_python_keywords_are_case_sensitive() {
        let mode = definition("python").unwrap().build_mode("main").unwrap();
        assert_eq!(mode.keyword_tag("def"), Some(Tag::Keyword1));
        assert_eq!(mode.keyword_tag("DEF"), None);
        assert_eq!(mode.attributes.escape, Some('\\'));
    }
}
