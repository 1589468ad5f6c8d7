//! Styled output using crossterm
//!
//! Writes ANSI escape sequences to any `Write`, so the renderer can target
//! stdout or a byte buffer alike.

use std::io::{self, Write};

use crossterm::{
    queue,
    style::{self, Attribute, Print, SetAttribute, SetBackgroundColor, SetForegroundColor},
    tty::IsTty,
};

use crate::error::Result;
use crate::syntax::{Color, Style};

/// Styled text writer
pub struct Terminal<W: Write> {
    out: W,
    /// Whether escape sequences are written at all
    styled: bool,
}

impl Terminal<io::Stdout> {
    /// Write to stdout, with styles only if stdout is a terminal
    pub fn stdout() -> Self {
        let out = io::stdout();
        let styled = out.is_tty();
        Self { out, styled }
    }
}

impl<W: Write> Terminal<W> {
    pub fn new(out: W, styled: bool) -> Self {
        Self { out, styled }
    }

    /// Force styles on or off
    pub fn set_styled(&mut self, styled: bool) {
        self.styled = styled;
    }

    /// Write a string at the current position
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        queue!(self.out, Print(s))?;
        Ok(())
    }

    /// End the current line
    pub fn newline(&mut self) -> Result<()> {
        queue!(self.out, Print('\n'))?;
        Ok(())
    }

    /// Switch to a style; the previous style is reset first
    pub fn apply_style(&mut self, s: &Style) -> Result<()> {
        if !self.styled {
            return Ok(());
        }
        self.reset_attributes()?;
        if let Some(fg) = term_color(s.fg) {
            queue!(self.out, SetForegroundColor(fg))?;
        }
        if let Some(bg) = term_color(s.bg) {
            queue!(self.out, SetBackgroundColor(bg))?;
        }
        if s.bold {
            queue!(self.out, SetAttribute(Attribute::Bold))?;
        }
        if s.italic {
            queue!(self.out, SetAttribute(Attribute::Italic))?;
        }
        if s.underline {
            queue!(self.out, SetAttribute(Attribute::Underlined))?;
        }
        Ok(())
    }

    /// Set dim/faint mode (for line numbers, etc.)
    pub fn set_dim(&mut self, enabled: bool) -> Result<()> {
        if !self.styled {
            return Ok(());
        }
        if enabled {
            queue!(self.out, SetAttribute(Attribute::Dim))?;
        } else {
            queue!(self.out, SetAttribute(Attribute::NormalIntensity))?;
        }
        Ok(())
    }

    /// Reset all attributes
    pub fn reset_attributes(&mut self) -> Result<()> {
        if self.styled {
            queue!(self.out, SetAttribute(Attribute::Reset))?;
        }
        Ok(())
    }

    /// Flush output buffer
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    /// The underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Crossterm color for a palette color, `None` for the terminal default
fn term_color(color: Color) -> Option<style::Color> {
    let c = match color {
        Color::Default => return None,
        Color::Black => style::Color::Black,
        Color::Red => style::Color::DarkRed,
        Color::Green => style::Color::DarkGreen,
        Color::Yellow => style::Color::DarkYellow,
        Color::Blue => style::Color::DarkBlue,
        Color::Magenta => style::Color::DarkMagenta,
        Color::Cyan => style::Color::DarkCyan,
        Color::White => style::Color::Grey,
        Color::BrightBlack => style::Color::DarkGrey,
        Color::BrightRed => style::Color::Red,
        Color::BrightGreen => style::Color::Green,
        Color::BrightYellow => style::Color::Yellow,
        Color::BrightBlue => style::Color::Blue,
        Color::BrightMagenta => style::Color::Magenta,
        Color::BrightCyan => style::Color::Cyan,
        Color::BrightWhite => style::Color::White,
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_output_has_no_escapes() {
        let mut term = Terminal::new(Vec::new(), false);
        term.apply_style(&Style::fg(Color::Red).with_bold()).unwrap();
        term.write_str("x").unwrap();
        term.reset_attributes().unwrap();
        term.newline().unwrap();
        assert_eq!(term.into_inner(), b"x\n");
    }

    #[test]
    fn test_styled_output() {
        let mut term = Terminal::new(Vec::new(), true);
        term.apply_style(&Style::fg(Color::BrightRed)).unwrap();
        term.write_str("x").unwrap();
        let out = String::from_utf8(term.into_inner()).unwrap();
        assert!(out.contains('\u{1b}'));
        assert!(out.ends_with('x'));
    }

    #[test]
    fn test_default_color_is_not_sent() {
        assert_eq!(term_color(Color::Default), None);
        assert_eq!(term_color(Color::BrightBlack), Some(style::Color::DarkGrey));
    }
}
