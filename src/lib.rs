//! leocolor - incremental, line-oriented syntax colorizer
//!
//! Lines are colored one at a time with jEdit-style mode rule tables plus
//! the Leo directives (`@color`, `@nocolor`, `@killcolor`, `@language`, doc
//! parts, section references). The host stores one integer state per line;
//! everything needed to continue a multi-line construct is encoded in it.

pub mod buffer;
pub mod config;
pub mod display;
pub mod error;
pub mod syntax;
pub mod terminal;

pub use buffer::HighlightBuffer;
pub use config::Config;
pub use error::{ColorizerError, Result};
pub use syntax::{Colorizer, Format, Host, Outline, Tag};
