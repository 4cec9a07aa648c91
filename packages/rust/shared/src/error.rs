//! Error types for docsplice.
//!
//! Library crates use [`DocspliceError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docsplice operations.
#[derive(Debug, thiserror::Error)]
pub enum DocspliceError {
    /// Project config loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A boundary pattern failed to compile.
    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Document store failure that is not tied to a filesystem path.
    #[error("storage error: {0}")]
    Storage(String),

    /// Data validation error (bad target path, malformed document, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A merge could not place a section and the run is configured to fail.
    #[error("degraded merge for section '{section}' into {target}: {reason}")]
    DegradedMerge {
        section: String,
        target: String,
        reason: String,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocspliceError>;

impl DocspliceError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a storage error from any displayable message.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from the document store (read/write fault).
    pub fn is_storage_fault(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Storage(_))
    }
}
