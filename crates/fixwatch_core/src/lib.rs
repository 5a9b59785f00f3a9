//! # fixwatch core
//!
//! Runs a development command, watches what it prints, and applies
//! mechanical fixes for the errors it recognizes.
//!
//! ## Flow
//!
//! ```text
//! child stdout/stderr ──► Pipeline::process_line ──► LogClassifier
//!                                                  └► FixPlanner ──► FixExecutor
//! file watcher ──► type check ──► Pipeline::process_text ──┘
//! ```
//!
//! The [`Supervisor`] owns the child process and the optional
//! [`FileWatcher`]. Every applied fix is recorded in a [`FixLedger`] so the
//! same fix is never attempted twice in one session.

pub mod config;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod log;
pub mod pipeline;
pub mod resolver;
pub mod supervisor;
pub mod watcher;

pub use config::{
    AliasRoot, MonitorConfig, PackageExports, CONFIG_FILE, DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_LOG_FILE,
};
pub use error::{CoreError, CoreResult};
pub use executor::{FixExecutor, FixOutcome};
pub use ledger::FixLedger;
pub use log::{format_entry, LogLevel, MonitorLog};
pub use pipeline::{Pipeline, PipelineStats, ProcessedMatch};
pub use resolver::ImportResolver;
pub use supervisor::{OutputStream, SessionSummary, Supervisor, SupervisorState};
pub use watcher::{check_file, Debouncer, FileWatcher, WatchFilter, DEBOUNCE};
