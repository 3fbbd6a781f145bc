//! Error types for adr-tools.
//!
//! Library crates use [`AdrToolsError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all adr-tools operations.
#[derive(Debug, thiserror::Error)]
pub enum AdrToolsError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport failure while talking to the repository host.
    #[error("network error: {0}")]
    Network(String),

    /// The repository host answered a request with a non-success status.
    #[error("{operation} failed: HTTP {status}: {message}")]
    Host {
        operation: String,
        status: u16,
        message: String,
    },

    /// Embedded template could not be parsed or rendered.
    #[error("template error: {message}")]
    Template { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Unexpected payload shape or invalid input data.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AdrToolsError>;

impl AdrToolsError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a host error for a failed remote operation.
    pub fn host(operation: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Host {
            operation: operation.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a template error from any displayable message.
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
