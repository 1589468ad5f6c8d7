//! Classification tags
//!
//! A tag is what the colorizer attaches to a span of text. The host decides
//! how each tag is rendered; [`Tag::default_style`] is only a fallback used by
//! the terminal renderer.

use super::style::{Color, Style};

/// Classification tags understood by the colorizer
///
/// The first group mirrors the jEdit token types used by mode rule tables.
/// The second group is produced only by the built-in directive rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    Comment1,
    Comment2,
    Comment3,
    Comment4,
    Digit,
    Function,
    Invalid,
    Keyword1,
    Keyword2,
    Keyword3,
    Keyword4,
    Keyword5,
    Label,
    Literal1,
    Literal2,
    Literal3,
    Literal4,
    Markup,
    Operator,
    /// No classification. Never forwarded to the host.
    Null,

    /// Run of blanks (show-invisibles)
    Blank,
    /// Body of a doc part
    DocPart,
    /// A Leo directive such as `@others` or `@language`
    LeoKeyword,
    /// A section reference that resolves to a node
    Link,
    /// A section reference that does not resolve
    Name,
    /// The `<<` and `>>` around a section reference
    NameBrackets,
    /// Run of tabs (show-invisibles)
    Tab,
    TrailingWhitespace,
    Url,
}

impl Tag {
    /// Every tag, in declaration order
    pub const ALL: [Tag; 29] = [
        Tag::Comment1,
        Tag::Comment2,
        Tag::Comment3,
        Tag::Comment4,
        Tag::Digit,
        Tag::Function,
        Tag::Invalid,
        Tag::Keyword1,
        Tag::Keyword2,
        Tag::Keyword3,
        Tag::Keyword4,
        Tag::Keyword5,
        Tag::Label,
        Tag::Literal1,
        Tag::Literal2,
        Tag::Literal3,
        Tag::Literal4,
        Tag::Markup,
        Tag::Operator,
        Tag::Null,
        Tag::Blank,
        Tag::DocPart,
        Tag::LeoKeyword,
        Tag::Link,
        Tag::Name,
        Tag::NameBrackets,
        Tag::Tab,
        Tag::TrailingWhitespace,
        Tag::Url,
    ];

    /// Name used in mode files, state names and configuration keys
    pub fn name(&self) -> &'static str {
        match self {
            Tag::Comment1 => "comment1",
            Tag::Comment2 => "comment2",
            Tag::Comment3 => "comment3",
            Tag::Comment4 => "comment4",
            Tag::Digit => "digit",
            Tag::Function => "function",
            Tag::Invalid => "invalid",
            Tag::Keyword1 => "keyword1",
            Tag::Keyword2 => "keyword2",
            Tag::Keyword3 => "keyword3",
            Tag::Keyword4 => "keyword4",
            Tag::Keyword5 => "keyword5",
            Tag::Label => "label",
            Tag::Literal1 => "literal1",
            Tag::Literal2 => "literal2",
            Tag::Literal3 => "literal3",
            Tag::Literal4 => "literal4",
            Tag::Markup => "markup",
            Tag::Operator => "operator",
            Tag::Null => "null",
            Tag::Blank => "blank",
            Tag::DocPart => "docpart",
            Tag::LeoKeyword => "leokeyword",
            Tag::Link => "link",
            Tag::Name => "name",
            Tag::NameBrackets => "namebrackets",
            Tag::Tab => "tab",
            Tag::TrailingWhitespace => "trailing_whitespace",
            Tag::Url => "url",
        }
    }

    /// Parse a tag name, ignoring case and surrounding blanks
    ///
    /// `keyword` and `literal` without a digit are accepted as aliases for
    /// the first member of their family, as some rule tables use them.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "keyword" => return Some(Tag::Keyword1),
            "literal" => return Some(Tag::Literal1),
            "comment" => return Some(Tag::Comment1),
            "" | "default" => return Some(Tag::Null),
            _ => {}
        }
        Tag::ALL.iter().copied().find(|tag| tag.name() == name)
    }

    /// True for tags that should never reach the host
    pub fn is_null(&self) -> bool {
        *self == Tag::Null
    }

    /// Fallback style for terminal rendering
    pub fn default_style(&self) -> Style {
        match self {
            Tag::Comment1 | Tag::Comment2 => Style::fg(Color::BrightBlack).with_italic(),
            Tag::Comment3 | Tag::Comment4 => Style::fg(Color::Red),
            Tag::Digit => Style::fg(Color::Cyan),
            Tag::Function => Style::fg(Color::Blue),
            Tag::Invalid => Style::fg(Color::BrightRed).with_underline(),
            Tag::Keyword1 => Style::fg(Color::Blue).with_bold(),
            Tag::Keyword2 => Style::fg(Color::Magenta),
            Tag::Keyword3 => Style::fg(Color::BrightMagenta),
            Tag::Keyword4 | Tag::Keyword5 => Style::fg(Color::Yellow),
            Tag::Label => Style::fg(Color::Yellow).with_underline(),
            Tag::Literal1 | Tag::Literal2 => Style::fg(Color::Green),
            Tag::Literal3 | Tag::Literal4 => Style::fg(Color::BrightGreen),
            Tag::Markup => Style::fg(Color::BrightBlue),
            Tag::Operator => Style::fg(Color::BrightWhite),
            Tag::Null => Style::default(),
            Tag::Blank | Tag::Tab => Style::default().with_underline(),
            Tag::DocPart => Style::fg(Color::Red),
            Tag::LeoKeyword => Style::fg(Color::Blue).with_bold(),
            Tag::Link => Style::fg(Color::Red).with_underline(),
            Tag::Name => Style::fg(Color::Red),
            Tag::NameBrackets => Style::fg(Color::Blue),
            Tag::TrailingWhitespace => Style::bg(Color::Red),
            Tag::Url => Style::fg(Color::Cyan).with_underline(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_styles() {
        assert!(!Tag::Comment1.default_style().is_default());
        assert!(!Tag::Keyword1.default_style().is_default());
        assert!(!Tag::LeoKeyword.default_style().is_default());
        assert!(Tag::Null.default_style().is_default());
    }

    #[test]
    fn test_from_name_roundtrip() {
        for tag in Tag::ALL {
            assert_eq!(Tag::from_name(tag.name()), Some(tag));
        }
    }

    #[test]
    fn test_from_name_aliases() {
        assert_eq!(Tag::from_name("KEYWORD1"), Some(Tag::Keyword1));
        assert_eq!(Tag::from_name(" literal "), Some(Tag::Literal1));
        assert_eq!(Tag::from_name("default"), Some(Tag::Null));
        assert_eq!(Tag::from_name("InvalidTag"), None);
    }
}
