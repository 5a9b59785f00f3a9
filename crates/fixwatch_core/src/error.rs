//! Error types for the core module.

use thiserror::Error;

use fixwatch_patterns::PatternError;
use fixwatch_runner::RunnerError;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during core operations.
///
/// Only [`CoreError::Spawn`] ever leaves a running session; everything else
/// is caught at the component that raised it and reported as a log entry.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to start {command}: {message}")]
    Spawn { command: String, message: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(String),

    #[error("Invalid configuration in {path}: {message}")]
    InvalidConfig { path: String, message: String },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("No target file for {0}")]
    NoTargetFile(String),

    #[error("No import source found for {0}")]
    Unresolved(String),

    #[error("Fix declined: {0}")]
    Declined(String),

    #[error("Command exited with code {code}: {command}")]
    CommandFailed { command: String, code: i32 },

    #[error("Watcher error: {0}")]
    Watch(String),

    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
