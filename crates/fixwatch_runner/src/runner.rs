//! Command runner trait and types.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::command::CommandSpec;
use crate::error::RunnerResult;

/// What to do with the child's output streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Stream straight to this process's console; nothing is captured.
    Inherit,
    /// Capture stdout and stderr into the result.
    Capture,
}

/// Result of running a command to completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Exit code, `-1` when the process was terminated by a signal
    pub exit_code: i32,
    /// Captured stdout (empty in [`OutputMode::Inherit`])
    pub stdout: String,
    /// Captured stderr (empty in [`OutputMode::Inherit`])
    pub stderr: String,
    /// Execution start time
    pub started_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl CommandOutput {
    /// Check if execution was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined output (stdout + stderr).
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Runs external commands on behalf of the fix pipeline.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `spec` in `dir` to completion.
    ///
    /// A nonzero exit is not an error; callers inspect
    /// [`CommandOutput::exit_code`]. Errors mean the command could not be
    /// run at all.
    async fn run(
        &self,
        spec: &CommandSpec,
        dir: &Path,
        mode: OutputMode,
    ) -> RunnerResult<CommandOutput>;
}
