//! Process-based command runner.
//!
//! Commands run through the platform shell (`sh -c` / `cmd /C`) so that
//! package-manager shims such as `npm.cmd` and `npx` resolve the same way
//! they do in a terminal.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::command::CommandSpec;
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{CommandOutput, CommandRunner, OutputMode};

/// Build a shell invocation of `spec` rooted at `dir`.
///
/// Stdio is left at its defaults; callers pick piped or inherited streams.
pub fn shell_command(spec: &CommandSpec, dir: &Path) -> Command {
    let (shell, shell_arg) = if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    };

    let mut command = Command::new(shell);
    command.arg(shell_arg).arg(spec.shell_line()).current_dir(dir);
    command
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the command if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn execute(
        &self,
        spec: &CommandSpec,
        dir: &Path,
        mode: OutputMode,
    ) -> RunnerResult<(i32, String, String)> {
        let mut command = shell_command(spec, dir);
        command.stdin(Stdio::null()).kill_on_drop(true);

        let spawn_failed = |e: std::io::Error| RunnerError::SpawnFailed {
            command: spec.to_string(),
            message: e.to_string(),
        };

        match mode {
            OutputMode::Inherit => {
                let status = command
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .await
                    .map_err(spawn_failed)?;
                Ok((status.code().unwrap_or(-1), String::new(), String::new()))
            }
            OutputMode::Capture => {
                let output = command
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .output()
                    .await
                    .map_err(spawn_failed)?;
                Ok((
                    output.status.code().unwrap_or(-1),
                    String::from_utf8_lossy(&output.stdout).into_owned(),
                    String::from_utf8_lossy(&output.stderr).into_owned(),
                ))
            }
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        dir: &Path,
        mode: OutputMode,
    ) -> RunnerResult<CommandOutput> {
        debug!("Executing: {} (in {})", spec, dir.display());

        let started_at = Utc::now();
        let (exit_code, stdout, stderr) = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.execute(spec, dir, mode))
                .await
                .map_err(|_| {
                    warn!("{} timed out after {}s", spec, limit.as_secs());
                    RunnerError::Timeout(limit.as_secs())
                })??,
            None => self.execute(spec, dir, mode).await?,
        };
        let duration_ms = (Utc::now() - started_at).num_milliseconds().max(0) as u64;

        if exit_code == 0 {
            info!("{} completed in {}ms", spec, duration_ms);
        } else {
            debug!("{} exited with code {} after {}ms", spec, exit_code, duration_ms);
        }

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
            started_at,
            duration_ms,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_capture_stdout_and_stderr() {
        let temp = tempdir().unwrap();
        let spec = CommandSpec::new("echo").arg("hello");

        let output = ProcessRunner::new()
            .run(&spec, temp.path(), OutputMode::Capture)
            .await
            .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_not_an_error() {
        let temp = tempdir().unwrap();
        let spec = CommandSpec::new("exit").arg("3");

        let output = ProcessRunner::new()
            .run(&spec, temp.path(), OutputMode::Inherit)
            .await
            .unwrap();

        assert_eq!(output.exit_code, 3);
        assert!(output.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_runs_in_directory() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "x").unwrap();

        let output = ProcessRunner::new()
            .run(&CommandSpec::new("ls"), temp.path(), OutputMode::Capture)
            .await
            .unwrap();

        assert!(output.stdout.contains("marker.txt"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let temp = tempdir().unwrap();
        let spec = CommandSpec::new("sleep").arg("5");

        let result = ProcessRunner::new()
            .with_timeout(Duration::from_millis(100))
            .run(&spec, temp.path(), OutputMode::Capture)
            .await;

        assert!(matches!(result, Err(RunnerError::Timeout(_))));
    }
}
