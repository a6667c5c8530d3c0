//! Error types for the state tree.

use std::fmt::Display;
use thiserror::Error;

/// Main error type for store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Invalid path '{0}' on state tree")]
    InvalidPath(String),

    #[error("Attempting to overwrite value on path '{0}' on state tree")]
    Overwrite(String),

    #[error("Cannot replace root with a non-mapping value: {0}")]
    InvalidRoot(String),

    #[error("Listener error: {0}")]
    Listener(String),
}

impl StateError {
    /// Wrap an error raised inside a listener.
    pub fn listener(e: impl Display) -> Self {
        StateError::Listener(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StateError>;
