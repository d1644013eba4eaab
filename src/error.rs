//! Error types for the state store.

use thiserror::Error;

/// Boxed error reported by a modifier.
pub type ModifierError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Modifier already registered for action: {0}")]
    DuplicateAction(String),

    #[error("Invalid modifier for action '{action}': {reason}")]
    InvalidModifier { action: String, reason: String },

    #[error("Action not found: {0}")]
    ActionNotFound(String),

    #[error("Action '{action}' payload mismatch: modifier expects {expected}, dispatch carries {got}")]
    PayloadArityMismatch {
        action: String,
        expected: usize,
        got: usize,
    },

    #[error("Action '{action}' payload could not be decoded: {message}")]
    PayloadTypeMismatch { action: String, message: String },

    #[error("Modifier for action '{action}' failed: {source}")]
    ModifierFailed {
        action: String,
        #[source]
        source: ModifierError,
    },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Type mismatch at '{path}': expected {expected}, got {got}")]
    TypeMismatch {
        path: String,
        expected: String,
        got: String,
    },

    #[error("No listener registered for path: {0}")]
    NotRegistered(String),

    #[error("Clone failed: {0}")]
    CloneFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for StoreError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        StoreError::CloneFailed(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for StoreError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        StoreError::CloneFailed(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
