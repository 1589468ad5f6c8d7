//! Configuration file support
//!
//! Loads settings from ~/.leocolor.conf (or %USERPROFILE%\.leocolor.conf on Windows)
//!
//! Format: simple key=value pairs, one per line
//! Lines starting with # are comments
//!
//! Example:
//! ```text
//! # leocolor configuration
//! default-language = python
//! color-doc-parts-as-rest = yes
//! modes-dir = /usr/share/leocolor/modes
//! alias.py3 = python
//! color.keyword1 = bright-blue
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::Result;
use crate::syntax::{Color, RegistryOptions, ScanOptions, Tag, Theme};

/// Configuration settings
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Language used when nothing else names one
    pub default_language: String,
    /// Color trailing blanks and tabs
    pub color_trailing_whitespace: bool,
    /// Scan doc parts with the rest rules
    pub color_doc_parts_as_rest: bool,
    /// Underline section references that do not resolve
    pub underline_undefined_section_names: bool,
    /// Directory of `<language>.toml` rule tables
    pub modes_dir: Option<PathBuf>,
    /// Deepest delegate nesting on one line
    pub max_delegate_depth: usize,
    /// Language aliases
    pub aliases: HashMap<String, String>,
    /// Per-tag color overrides
    pub colors: HashMap<Tag, Color>,
    /// Whether to show line numbers
    pub show_line_numbers: bool,
    /// Tab width for display
    pub tab_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_language: "python".to_string(),
            color_trailing_whitespace: false,
            color_doc_parts_as_rest: false,
            underline_undefined_section_names: false,
            modes_dir: None,
            max_delegate_depth: 16,
            aliases: HashMap::new(),
            colors: HashMap::new(),
            show_line_numbers: false,
            tab_width: 8,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            std::env::var("USERPROFILE")
                .ok()
                .map(|home| PathBuf::from(home).join(".leocolor.conf"))
        }

        #[cfg(not(windows))]
        {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".leocolor.conf"))
        }
    }

    /// Load configuration from the default file
    ///
    /// A missing or unreadable file gives the defaults.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.is_file() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!("{}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::from_contents(&contents))
    }

    /// Configuration from file contents
    pub fn from_contents(contents: &str) -> Self {
        let mut config = Config::default();
        config.apply(&Self::parse(contents));
        config
    }

    /// Parse config file contents into key-value pairs
    fn parse(contents: &str) -> HashMap<String, String> {
        let mut settings = HashMap::new();

        for line in contents.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // Parse key = value
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_lowercase();
                let value = value.trim().to_string();
                settings.insert(key, value);
            }
        }

        settings
    }

    /// Apply settings from parsed config
    fn apply(&mut self, settings: &HashMap<String, String>) {
        for (key, value) in settings {
            match key.as_str() {
                "default-language" => {
                    if !value.is_empty() {
                        self.default_language = value.to_lowercase();
                    }
                }
                "color-trailing-whitespace" => self.color_trailing_whitespace = parse_bool(value),
                "color-doc-parts-as-rest" => self.color_doc_parts_as_rest = parse_bool(value),
                "underline-undefined-section-names" => {
                    self.underline_undefined_section_names = parse_bool(value);
                }
                "modes-dir" => {
                    if !value.is_empty() {
                        self.modes_dir = Some(PathBuf::from(value));
                    }
                }
                "max-delegate-depth" => match value.parse::<usize>() {
                    Ok(n) => self.max_delegate_depth = n.clamp(1, 64),
                    Err(_) => warn!("max-delegate-depth: {:?} is not a number", value),
                },
                "line-numbers" => self.show_line_numbers = parse_bool(value),
                "tab-width" => {
                    if let Ok(n) = value.parse::<usize>() {
                        self.tab_width = n.clamp(1, 16); // Between 1 and 16
                    }
                }
                _ => self.apply_prefixed(key, value),
            }
        }
    }

    /// `alias.<name>` and `color.<tag>` keys
    fn apply_prefixed(&mut self, key: &str, value: &str) {
        if let Some(name) = key.strip_prefix("alias.") {
            self.aliases.insert(name.to_string(), value.to_lowercase());
        } else if let Some(tag_name) = key.strip_prefix("color.") {
            match (Tag::from_name(tag_name), Color::from_name(value)) {
                (Some(tag), Some(color)) => {
                    self.colors.insert(tag, color);
                }
                (None, _) => warn!("{}: unknown tag {:?}", key, tag_name),
                (_, None) => warn!("{}: unknown color {:?}", key, value),
            }
        } else {
            warn!("unknown setting {:?}", key);
        }
    }

    /// Options for building modes
    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            modes_dir: self.modes_dir.clone(),
            color_trailing_whitespace: self.color_trailing_whitespace,
            aliases: self.aliases.clone(),
        }
    }

    /// Options for scanning lines
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            doc_parts_as_rest: self.color_doc_parts_as_rest,
            max_delegate_depth: self.max_delegate_depth,
        }
    }

    /// The default theme with this configuration's overrides
    pub fn theme(&self) -> Theme {
        let mut theme = Theme::new();
        if self.underline_undefined_section_names {
            theme.set_style(Tag::Name, theme.style(Tag::Name).with_underline());
        }
        for (&tag, &color) in &self.colors {
            theme.set_color(tag, color);
        }
        theme
    }
}

/// Parse a boolean value from string
fn parse_bool(s: &str) -> bool {
    let s = s.to_lowercase();
    matches!(s.as_str(), "true" | "yes" | "on" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let contents = r#"
# Comment
default-language = C
color-doc-parts-as-rest = yes
max-delegate-depth = 4
alias.py3 = Python
        "#;

        let settings = Config::parse(contents);
        assert_eq!(settings.get("default-language"), Some(&"C".to_string()));
        assert_eq!(settings.get("max-delegate-depth"), Some(&"4".to_string()));
        assert_eq!(settings.get("alias.py3"), Some(&"Python".to_string()));
        assert_eq!(settings.len(), 4);
    }

    #[test]
    fn test_apply_settings() {
        let config = Config::from_contents(
            "default-language = C\n\
             color-trailing-whitespace = on\n\
             color-doc-parts-as-rest = true\n\
             modes-dir = /tmp/modes\n\
             max-delegate-depth = 500\n\
             alias.py3 = Python\n\
             color.keyword1 = bright-blue\n\
             color.nonesuch = red\n\
             tab-width = 2\n",
        );

        assert_eq!(config.default_language, "c");
        assert!(config.color_trailing_whitespace);
        assert!(config.color_doc_parts_as_rest);
        assert_eq!(config.modes_dir, Some(PathBuf::from("/tmp/modes")));
        assert_eq!(config.max_delegate_depth, 64);
        assert_eq!(config.aliases.get("py3"), Some(&"python".to_string()));
        assert_eq!(config.colors.get(&Tag::Keyword1), Some(&Color::BrightBlue));
        assert_eq!(config.colors.len(), 1);
        assert_eq!(config.tab_width, 2);
    }

    #[test]
    fn test_conversions() {
        let mut config = Config::default();
        config.color_doc_parts_as_rest = true;
        config.max_delegate_depth = 3;
        config.underline_undefined_section_names = true;
        config.colors.insert(Tag::Comment1, Color::Green);

        assert_eq!(
            config.scan_options(),
            ScanOptions {
                doc_parts_as_rest: true,
                max_delegate_depth: 3,
            }
        );
        let theme = config.theme();
        assert!(theme.style(Tag::Name).underline);
        assert_eq!(theme.style(Tag::Comment1).fg, Color::Green);
        assert!(!config.registry_options().color_trailing_whitespace);
    }

    #[test]
    fn test_defaults_for_bad_values() {
        let config = Config::from_contents("max-delegate-depth = many\ndefault-language =\nline-numbers = maybe");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("True"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("yes"));
        assert!(parse_bool("on"));
        assert!(parse_bool("1"));

        assert!(!parse_bool("false"));
        assert!(!parse_bool("no"));
        assert!(!parse_bool("off"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("anything"));
    }
}
