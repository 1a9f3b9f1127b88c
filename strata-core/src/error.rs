//! Error types for Strata

use thiserror::Error;

/// Result type alias
pub type StrataResult<T> = Result<T, StrataError>;

/// Main error type
///
/// Query misses are never errors; this covers I/O at the edges (loaders
/// being built, config files, CLI output).
#[derive(Error, Debug)]
pub enum StrataError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Read-only: {0}")]
    ReadOnly(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("{0}")]
    Other(String),
}

impl StrataError {
    pub fn is_not_found(&self) -> bool {
        match self {
            StrataError::NotFound(_) => true,
            StrataError::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
