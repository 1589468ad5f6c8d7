//! Error types for leocolor

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for colorizer operations
pub type Result<T> = std::result::Result<T, ColorizerError>;

/// Colorizer error types
///
/// Only construction-time problems surface as errors. Anything that goes
/// wrong while scanning a single line is logged and recovered from.
#[derive(Error, Debug)]
pub enum ColorizerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed mode file {path}: {source}")]
    ModeFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unknown tag: {0}")]
    UnknownTag(String),

    #[error("Invalid mode definition: {0}")]
    InvalidMode(String),

    #[error("{0}")]
    Message(String),
}
