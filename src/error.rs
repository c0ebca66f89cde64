//! Error types for branch-test-reporter.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for a reporting run.
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file could not be read.
    #[error("cannot read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON or lacks required keys.
    #[error("invalid config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Configuration values are unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// The log destination could not be set up.
    #[error("failed to set up logging: {0}")]
    Logging(String),

    /// A subprocess could not be started at all.
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        source: std::io::Error,
    },

    /// The repository URL has no owner/name segments.
    #[error("cannot derive owner and name from repository URL: {0}")]
    InvalidRepositoryUrl(String),

    /// HTTP transport failure talking to the issue API.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// GitHub API operation failed.
    #[error("GitHub operation failed: {0}")]
    GitHub(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if the error must terminate the process rather than be
    /// logged and swallowed by the run loop.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Launch { .. }
                | Error::ConfigRead { .. }
                | Error::ConfigParse { .. }
                | Error::Config(_)
                | Error::Logging(_)
        )
    }

    /// Renders the error followed by its chain of sources, one per line.
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            rendered.push_str("\n  caused by: ");
            rendered.push_str(&cause.to_string());
            source = cause.source();
        }
        rendered
    }
}

/// Result type alias for reporting operations.
pub type Result<T> = std::result::Result<T, Error>;
