//! Error types for the patterns module.

use thiserror::Error;

/// Result type alias for pattern operations.
pub type PatternResult<T> = Result<T, PatternError>;

/// Errors that can occur while building the registry or reading manifests.
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("Invalid pattern for category {category}: {message}")]
    InvalidPattern { category: String, message: String },

    #[error("Category already registered: {0}")]
    DuplicateCategory(String),

    #[error("Invalid manifest {path}: {message}")]
    InvalidManifest { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
