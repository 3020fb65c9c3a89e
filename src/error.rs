// ABOUTME: Typed errors for configuration resolution and command validation
// ABOUTME: Usage errors carry the exact user-facing message printed by the CLI

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving configuration or validating command input.
///
/// `Usage` errors are user-facing: the binary prints their message verbatim
/// through clap's error reporter and exits with status 2. The structural
/// variants indicate a broken `config.ini` and are propagated as-is.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error("No section: '{section}' in {}", path.display())]
    NoSection { section: String, path: PathBuf },

    #[error("No option '{option}' in section: '{section}'")]
    NoOption { option: String, section: String },

    #[error("Failed to parse {}: {source}", path.display())]
    Ini {
        path: PathBuf,
        #[source]
        source: ini::ParseError,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn usage(message: impl Into<String>) -> Self {
        Error::Usage(message.into())
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
