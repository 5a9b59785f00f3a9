//! Mock command runner for testing.
//!
//! Provides a configurable mock implementation of the CommandRunner trait
//! for use in unit tests without spawning package managers or compilers.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::command::CommandSpec;
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{CommandOutput, CommandRunner, OutputMode};

/// Predefined mock response for a command execution.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 0,
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration_ms: 0,
        }
    }

    /// Make the call take `ms` milliseconds before it returns.
    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub spec: CommandSpec,
    pub dir: PathBuf,
    pub mode: OutputMode,
}

impl CapturedCall {
    /// The call rendered as a command line.
    pub fn command_line(&self) -> String {
        self.spec.shell_line()
    }
}

/// Mock command runner for testing.
///
/// This runner captures all calls and returns predefined responses,
/// allowing tests to verify which installs and type checks the pipeline
/// asked for.
#[derive(Clone)]
pub struct MockRunner {
    /// Predefined responses, returned in order and then cycled.
    responses: Arc<RwLock<Vec<MockResponse>>>,
    /// Index of next response to return.
    response_index: Arc<AtomicUsize>,
    /// Captured calls for verification.
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    /// Simulated failure to return (as a string message for ExecutionFailed).
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    /// Create a new mock runner.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            simulate_failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Add a mock response for the next run call.
    pub fn add_response(self, response: MockResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    /// Set multiple responses.
    pub fn with_responses(self, responses: Vec<MockResponse>) -> Self {
        *self.responses.write() = responses;
        self
    }

    /// Set a failure to simulate.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Calls whose program matches `program`.
    pub fn calls_to(&self, program: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.spec.program == program)
            .cloned()
            .collect()
    }

    /// Check if a call with this exact command line was made.
    pub fn was_called_with(&self, command_line: &str) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.command_line() == command_line)
    }

    /// Record a call.
    fn record_call(&self, call: CapturedCall) {
        self.captured_calls.write().push(call);
    }

    /// Get the next response.
    fn next_response(&self) -> MockResponse {
        let responses = self.responses.read();
        if responses.is_empty() {
            return MockResponse::success("");
        }
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses
            .get(index % responses.len())
            .cloned()
            .unwrap_or_else(|| MockResponse::success(""))
    }

    /// Check for simulated failure.
    fn check_failure(&self) -> RunnerResult<()> {
        if let Some(msg) = self.simulate_failure.read().clone() {
            return Err(RunnerError::ExecutionFailed(msg));
        }
        Ok(())
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        dir: &Path,
        mode: OutputMode,
    ) -> RunnerResult<CommandOutput> {
        self.record_call(CapturedCall {
            spec: spec.clone(),
            dir: dir.to_path_buf(),
            mode,
        });

        self.check_failure()?;

        let response = self.next_response();
        if response.duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(response.duration_ms)).await;
        }
        let (stdout, stderr) = match mode {
            OutputMode::Capture => (response.stdout, response.stderr),
            OutputMode::Inherit => (String::new(), String::new()),
        };

        Ok(CommandOutput {
            exit_code: response.exit_code,
            stdout,
            stderr,
            started_at: Utc::now(),
            duration_ms: response.duration_ms,
        })
    }
}
