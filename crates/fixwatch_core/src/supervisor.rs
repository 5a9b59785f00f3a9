//! Process supervisor: owns the monitored child and the file watcher.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use fixwatch_runner::{shell_command, CommandRunner, CommandSpec};

use crate::config::MonitorConfig;
use crate::error::{CoreError, CoreResult};
use crate::log::MonitorLog;
use crate::pipeline::{Pipeline, PipelineStats};
use crate::watcher::FileWatcher;

/// How long output readers may keep draining after an interrupt.
const READER_GRACE: Duration = Duration::from_secs(2);

/// Lifecycle of a monitoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "exitCode", rename_all = "lowercase")]
pub enum SupervisorState {
    Idle,
    Spawning,
    Monitoring,
    /// The child terminated on its own; `None` if killed by a signal.
    Exited(Option<i32>),
    Interrupted,
}

impl SupervisorState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Spawning | Self::Monitoring)
    }
}

/// Which child stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// End-of-session report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub state: SupervisorState,
    pub stats: PipelineStats,
}

struct Session {
    child: Child,
    readers: Vec<JoinHandle<()>>,
    watcher: Option<FileWatcher>,
}

/// Runs one child process and feeds its output to the fix pipeline.
pub struct Supervisor {
    root: PathBuf,
    command: CommandSpec,
    config: MonitorConfig,
    pipeline: Arc<Pipeline>,
    runner: Arc<dyn CommandRunner>,
    log: Arc<MonitorLog>,
    echo: bool,
    state: Mutex<SupervisorState>,
    session: Mutex<Option<Session>>,
}

impl Supervisor {
    pub fn new(
        root: impl Into<PathBuf>,
        command: CommandSpec,
        config: MonitorConfig,
        runner: Arc<dyn CommandRunner>,
        log: Arc<MonitorLog>,
    ) -> Self {
        let root = root.into();
        let pipeline = Arc::new(Pipeline::from_config(&root, &config, runner.clone(), log.clone()));
        Self {
            root,
            command,
            config,
            pipeline,
            runner,
            log,
            echo: true,
            state: Mutex::new(SupervisorState::Idle),
            session: Mutex::new(None),
        }
    }

    /// Echo child output to the console before classifying it.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn state(&self) -> SupervisorState {
        *self.state.lock()
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Spawn the child and wire its output.
    ///
    /// Returns `Ok(false)` without doing anything if a child is already
    /// being monitored.
    pub fn start(&self) -> CoreResult<bool> {
        {
            let mut state = self.state.lock();
            if state.is_running() {
                self.log.warn("Monitor is already running");
                return Ok(false);
            }
            *state = SupervisorState::Spawning;
        }

        self.log.info(format!("Starting error monitor for: {}", self.command));

        let mut command = shell_command(&self.command, &self.root);
        command
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                *self.state.lock() = SupervisorState::Idle;
                let message = e.to_string();
                self.log.error(format!("Failed to start {}: {}", self.command, message));
                return Err(CoreError::Spawn {
                    command: self.command.to_string(),
                    message,
                });
            }
        };
        debug!("Spawned child process {:?}", child.id());

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(stdout, OutputStream::Stdout, self.pipeline.clone(), self.echo));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(stderr, OutputStream::Stderr, self.pipeline.clone(), self.echo));
        }

        let watcher = if self.config.watch && self.config.enabled {
            match FileWatcher::start(&self.root, &self.config, self.pipeline.clone(), self.runner.clone()) {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    self.log.warn(format!("File watcher not available: {}", e));
                    None
                }
            }
        } else {
            None
        };

        *self.session.lock() = Some(Session {
            child,
            readers,
            watcher,
        });
        *self.state.lock() = SupervisorState::Monitoring;
        Ok(true)
    }

    /// Wait until the child exits or `shutdown` resolves.
    pub async fn wait<F>(&self, shutdown: F) -> SessionSummary
    where
        F: Future<Output = ()>,
    {
        let Some(mut session) = self.session.lock().take() else {
            return self.summary();
        };

        let exited = tokio::select! {
            status = session.child.wait() => Some(status),
            _ = shutdown => None,
        };

        let state = match exited {
            Some(Ok(status)) => {
                finish(session.readers).await;
                let code = status.code();
                match code {
                    Some(code) => self.log.info(format!("Monitored process exited with code {}", code)),
                    None => self.log.info("Monitored process was terminated by a signal"),
                }
                SupervisorState::Exited(code)
            }
            Some(Err(e)) => {
                self.log.error(format!("Lost track of monitored process: {}", e));
                finish(session.readers).await;
                SupervisorState::Exited(None)
            }
            None => {
                self.pipeline.halt();
                self.log.info("Shutting down error monitor");
                drain(session.readers).await;
                if let Some(watcher) = session.watcher.take() {
                    watcher.stop();
                }
                SupervisorState::Interrupted
            }
        };

        if let Some(watcher) = session.watcher.take() {
            watcher.finish().await;
        }
        *self.state.lock() = state;

        let summary = self.summary();
        self.log.info(format!("Session summary: {}", summary.stats));
        summary
    }

    /// Start and wait in one call. Only a spawn failure is an error.
    pub async fn run<F>(&self, shutdown: F) -> CoreResult<SessionSummary>
    where
        F: Future<Output = ()>,
    {
        if !self.start()? {
            return Ok(self.summary());
        }
        Ok(self.wait(shutdown).await)
    }

    fn summary(&self) -> SessionSummary {
        SessionSummary {
            state: self.state(),
            stats: self.pipeline.stats(),
        }
    }
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("root", &self.root)
            .field("command", &self.command)
            .field("state", &self.state())
            .finish()
    }
}

/// Read `stream` line by line, echo each line and run it through the
/// pipeline. Invalid UTF-8 is replaced rather than ending the stream.
fn spawn_reader<R>(stream: R, kind: OutputStream, pipeline: Arc<Pipeline>, echo: bool) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buf);
                    let line = text.trim_end_matches(['\r', '\n']);
                    if echo {
                        match kind {
                            OutputStream::Stdout => println!("{}", line),
                            OutputStream::Stderr => eprintln!("{}", line),
                        }
                    }
                    pipeline.process_line(line).await;
                }
                Err(e) => {
                    warn!("Failed to read child {}: {}", kind, e);
                    break;
                }
            }
        }
        debug!("Child {} closed", kind);
    })
}

/// Wait for readers to reach end of stream and for every fix they started.
async fn finish(readers: Vec<JoinHandle<()>>) {
    for reader in readers {
        if let Err(e) = reader.await {
            warn!("Output reader ended abnormally: {}", e);
        }
    }
}

/// Let readers finish their current line, aborting any that outlive the grace period.
async fn drain(readers: Vec<JoinHandle<()>>) {
    for mut reader in readers {
        if tokio::time::timeout(READER_GRACE, &mut reader).await.is_err() {
            reader.abort();
        }
    }
}
