//! Style types for rendering tags
//!
//! The colorizer itself only produces tags. This module maps tags to
//! terminal styles for hosts that want a ready-made palette.

use std::collections::HashMap;

use super::tags::Tag;

/// Terminal colors (ANSI 16-color palette for compatibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

impl Color {
    /// Parse a color name such as `red`, `bright-blue` or `Bright Blue`
    ///
    /// Separators and case are ignored, so `brightblue`, `bright_blue` and
    /// `Bright-Blue` are all the same color. `gray`/`grey` map to bright black.
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        let color = match key.as_str() {
            "default" | "none" => Color::Default,
            "black" => Color::Black,
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "blue" => Color::Blue,
            "magenta" | "purple" => Color::Magenta,
            "cyan" => Color::Cyan,
            "white" => Color::White,
            "brightblack" | "gray" | "grey" => Color::BrightBlack,
            "brightred" => Color::BrightRed,
            "brightgreen" => Color::BrightGreen,
            "brightyellow" => Color::BrightYellow,
            "brightblue" => Color::BrightBlue,
            "brightmagenta" => Color::BrightMagenta,
            "brightcyan" => Color::BrightCyan,
            "brightwhite" => Color::BrightWhite,
            _ => return None,
        };
        Some(color)
    }
}

/// Text style attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    /// Foreground color
    pub fg: Color,
    /// Background color
    pub bg: Color,
    /// Bold text
    pub bold: bool,
    /// Italic text
    pub italic: bool,
    /// Underlined text
    pub underline: bool,
}

impl Style {
    /// Create a style with just foreground color
    pub fn fg(color: Color) -> Self {
        Self {
            fg: color,
            ..Default::default()
        }
    }

    /// Create a style with just background color
    pub fn bg(color: Color) -> Self {
        Self {
            bg: color,
            ..Default::default()
        }
    }

    /// Builder: set foreground color
    pub fn with_fg(mut self, color: Color) -> Self {
        self.fg = color;
        self
    }

    /// Builder: set bold
    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Builder: set italic
    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Builder: set underline
    pub fn with_underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Check if this is the default (no styling)
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Tag to style mapping with per-tag overrides
#[derive(Debug, Clone, Default)]
pub struct Theme {
    overrides: HashMap<Tag, Style>,
}

impl Theme {
    /// Create a theme that uses only the default styles
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the foreground color of a tag
    pub fn set_color(&mut self, tag: Tag, color: Color) {
        let style = self.style(tag).with_fg(color);
        self.overrides.insert(tag, style);
    }

    /// Override the complete style of a tag
    pub fn set_style(&mut self, tag: Tag, style: Style) {
        self.overrides.insert(tag, style);
    }

    /// Style for a tag
    pub fn style(&self, tag: Tag) -> Style {
        self.overrides
            .get(&tag)
            .copied()
            .unwrap_or_else(|| tag.default_style())
    }
}
