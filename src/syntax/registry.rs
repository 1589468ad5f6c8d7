//! Mode registry
//!
//! Builds each ruleset at most once and hands out shared [`Mode`]s. Rule
//! tables come from `<modes-dir>/<language>.toml` when such a file exists,
//! otherwise from the built-in tables. Every mode also gets the directive
//! rules, which are the same `Rc` instances in every mode.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, error, warn};

use super::builtin;
use super::mode::Mode;
use super::mode_file::{ruleset_name, ModeDefinition};
use super::rules::{Directive, Rule};
use crate::error::Result;

/// Something that can tell whether a language has rules
pub trait LanguageCatalog {
    fn is_known(&self, language: &str) -> bool;
}

/// Settings that affect how modes are built
#[derive(Debug, Clone, Default)]
pub struct RegistryOptions {
    /// Directory searched for `<language>.toml` rule tables
    pub modes_dir: Option<PathBuf>,
    /// Add the trailing whitespace rule to every mode
    pub color_trailing_whitespace: bool,
    /// Extra language aliases, applied after lowercasing
    pub aliases: HashMap<String, String>,
}

/// Directive rules shared by every mode
#[derive(Debug)]
struct DirectiveRules {
    /// Prepended, so they run before the mode's own rules
    front: Vec<(char, Rc<Rule>)>,
    /// Appended after the mode's own rules
    back: Vec<(char, Rc<Rule>)>,
}

impl DirectiveRules {
    fn new(trailing_whitespace: bool) -> Self {
        let rule = |d| Rc::new(Rule::Directive(d));
        let mut front = Vec::new();

        // '@' rules run in this order
        for d in [
            Directive::DocPart,
            Directive::AtNoColorNode,
            Directive::AtNoColor,
            Directive::AtLanguage,
            Directive::AtKillColor,
            Directive::AtColor,
            Directive::LeoKeywords,
        ] {
            front.push(('@', rule(d)));
        }
        front.push(('<', rule(Directive::SectionRef)));
        let url = rule(Directive::Url);
        for c in ['f', 'g', 'h', 'm', 'n', 'p', 't', 'w'] {
            front.push((c, Rc::clone(&url)));
        }
        front.push(('u', rule(Directive::Unl)));
        if trailing_whitespace {
            let ws = rule(Directive::TrailingWhitespace);
            front.push((' ', Rc::clone(&ws)));
            front.push(('\t', ws));
        }

        let back = vec![(' ', rule(Directive::Blanks)), ('\t', rule(Directive::Tabs))];
        Self { front, back }
    }

    fn install(&self, mode: &mut Mode) {
        // Prepend in reverse so the front rules keep their listed order
        for (c, rule) in self.front.iter().rev() {
            mode.prepend_rule(*c, Rc::clone(rule));
        }
        for (c, rule) in &self.back {
            mode.push_rule(*c, Rc::clone(rule));
        }
    }
}

/// Cache of modes keyed by munged ruleset name
#[derive(Debug)]
pub struct ModeRegistry {
    options: RegistryOptions,
    directive_rules: DirectiveRules,
    definitions: HashMap<String, Rc<ModeDefinition>>,
    modes: HashMap<String, Rc<Mode>>,
    /// Languages already reported as unknown
    reported: HashSet<String>,
    /// Rulesets being built, to break import cycles
    in_progress: HashSet<String>,
}

impl Default for ModeRegistry {
    fn default() -> Self {
        Self::new(RegistryOptions::default())
    }
}

impl ModeRegistry {
    /// Create an empty registry
    pub fn new(options: RegistryOptions) -> Self {
        let directive_rules = DirectiveRules::new(options.color_trailing_whitespace);
        Self {
            options,
            directive_rules,
            definitions: HashMap::new(),
            modes: HashMap::new(),
            reported: HashSet::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Normalize a language name: lowercase, then apply aliases
    ///
    /// `latex` maps to `tex`, which has no built-in table; it colors only
    /// when a `tex` definition is registered or found in the modes directory.
    pub fn canonical_language(&self, name: &str) -> String {
        let name = name.trim().to_lowercase();
        let name = if name == "latex" { "tex".to_string() } else { name };
        self.options.aliases.get(&name).cloned().unwrap_or(name)
    }

    /// Language and munged ruleset name for a language or delegate name
    ///
    /// `"html"` gives `("html", "html_main")` and `"html::tags"` gives
    /// `("html", "html_tags")`.
    pub fn ruleset_for(&self, name: &str) -> (String, String) {
        let name = name.trim().to_lowercase();
        match name.split_once("::") {
            Some((language, ruleset)) => {
                let language = self.canonical_language(language);
                let ruleset = ruleset_name(&language, ruleset);
                (language, ruleset)
            }
            None => {
                let language = self.canonical_language(&name);
                let ruleset = ruleset_name(&language, "main");
                (language, ruleset)
            }
        }
    }

    /// The mode for a language or delegate name
    ///
    /// Unknown languages get a placeholder mode with no rules. Check
    /// [`Mode::is_unknown`] before switching to the result.
    pub fn init_mode(&mut self, name: &str) -> Rc<Mode> {
        let (language, ruleset) = self.ruleset_for(name);
        if let Some(mode) = self.modes.get(&ruleset) {
            return Rc::clone(mode);
        }
        let mode = self.build(&language, &ruleset);
        self.modes.insert(ruleset, Rc::clone(&mode));
        mode
    }

    /// Number of cached modes, placeholders and aliases included
    pub fn mode_count(&self) -> usize {
        self.modes.len()
    }

    /// Add or replace the definition of a language
    ///
    /// Modes already built for the language are dropped from the cache.
    /// Lines already scanned keep whatever mode they were scanned with.
    pub fn register_definition(&mut self, mut definition: ModeDefinition) {
        let language = self.canonical_language(&definition.language);
        definition.language = language.clone();
        self.modes
            .retain(|ruleset, mode| mode.language != language && !ruleset.starts_with(&format!("{}_", language)));
        self.reported.remove(&language);
        self.definitions.insert(language, Rc::new(definition));
    }

    /// Read the definition of a language from the modes directory or the
    /// built-in tables
    ///
    /// Returns `Ok(None)` when neither has the language.
    pub fn load_definition(&self, language: &str) -> Result<Option<ModeDefinition>> {
        if let Some(path) = self.mode_file(language) {
            let mut definition = ModeDefinition::load(&path)?;
            if definition.language.is_empty() {
                definition.language = language.to_string();
            } else if definition.language != language {
                warn!(
                    "{} declares language {:?}; using {:?}",
                    path.display(),
                    definition.language,
                    language
                );
                definition.language = language.to_string();
            }
            debug!("loaded {}", path.display());
            return Ok(Some(definition));
        }
        Ok(builtin::definition(language))
    }

    fn mode_file(&self, language: &str) -> Option<PathBuf> {
        let dir: &Path = self.options.modes_dir.as_deref()?;
        let path = dir.join(format!("{}.toml", language));
        path.is_file().then_some(path)
    }

    fn definition(&mut self, language: &str) -> Option<Rc<ModeDefinition>> {
        if let Some(definition) = self.definitions.get(language) {
            return Some(Rc::clone(definition));
        }
        match self.load_definition(language) {
            Ok(Some(definition)) => {
                let definition = Rc::new(definition);
                self.definitions.insert(language.to_string(), Rc::clone(&definition));
                Some(definition)
            }
            Ok(None) => None,
            Err(err) => {
                error!("{}", err);
                None
            }
        }
    }

    fn placeholder(&mut self, language: &str, ruleset: &str) -> Rc<Mode> {
        if self.reported.insert(language.to_string()) {
            warn!("no rules for language {:?}", language);
        }
        Rc::new(Mode::unknown(ruleset))
    }

    fn build(&mut self, language: &str, ruleset: &str) -> Rc<Mode> {
        let Some(definition) = self.definition(language) else {
            return self.placeholder(language, ruleset);
        };
        let Some(key) = definition.ruleset_key(ruleset).map(str::to_string) else {
            debug!("{} has no ruleset {}", language, ruleset);
            return self.placeholder(ruleset, ruleset);
        };
        let mut mode = match definition.build_mode(&key) {
            Ok(mode) => mode,
            Err(err) => {
                error!("cannot build {}: {}", ruleset, err);
                return self.placeholder(language, ruleset);
            }
        };
        self.directive_rules.install(&mut mode);

        self.in_progress.insert(ruleset.to_string());
        for import in definition.imports_for(&key) {
            let (_, imported) = self.ruleset_for(&import);
            if self.in_progress.contains(&imported) {
                debug!("{} imports {} recursively; skipped", ruleset, imported);
                continue;
            }
            let other = self.init_mode(&import);
            if !other.is_unknown() {
                mode.import_rules(&other);
            }
        }
        self.in_progress.remove(ruleset);

        let mode = Rc::new(mode);
        if key == "main" {
            if let Some(delegate) = definition.properties.get("initialModeDelegate") {
                let (_, target) = self.ruleset_for(delegate);
                if target != ruleset && !self.in_progress.contains(&target) {
                    // Cache the real mode under its own name first so a
                    // delegate that refers back to it terminates
                    self.modes.insert(ruleset.to_string(), Rc::clone(&mode));
                    self.in_progress.insert(ruleset.to_string());
                    let target_mode = self.init_mode(delegate);
                    self.in_progress.remove(ruleset);
                    if !target_mode.is_unknown() {
                        return target_mode;
                    }
                }
            }
        }
        mode
    }
}

/// The name [`ModeRegistry::init_mode`] maps back to `(language, ruleset)`
///
/// Used to rebuild the mode a line was left in from its state entry.
pub fn qualified_name(language: &str, ruleset: &str) -> String {
    let prefix = ruleset_name(language, "");
    match ruleset.strip_prefix(&prefix) {
        Some(local) if !local.is_empty() && local != "main" => format!("{}::{}", language, local),
        _ => language.to_string(),
    }
}

impl LanguageCatalog for ModeRegistry {
    fn is_known(&self, language: &str) -> bool {
        let language = self.canonical_language(language);
        if language.is_empty() {
            return false;
        }
        self.definitions.contains_key(&language)
            || builtin::is_builtin(&language)
            || self.mode_file(&language).is_some()
    }
}
