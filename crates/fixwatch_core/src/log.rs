//! Session log: console plus an append-only log file.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Severity of a session log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Success,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Success => "SUCCESS",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format one entry as `[timestamp] [LEVEL] message`.
pub fn format_entry(at: DateTime<Utc>, level: LogLevel, message: &str) -> String {
    format!(
        "[{}] [{}] {}",
        at.to_rfc3339_opts(SecondsFormat::Millis, true),
        level,
        message
    )
}

/// The monitor's session log.
///
/// The file is opened once and appended to for the whole session. If it
/// cannot be opened or written, the log keeps going on the console only.
pub struct MonitorLog {
    path: Option<PathBuf>,
    file: Mutex<Option<File>>,
    console: bool,
}

impl MonitorLog {
    /// Open (or create) the log file at `path` in append mode.
    pub fn open(path: &Path) -> Self {
        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(file),
            Err(e) => {
                warn!("Cannot open log file {:?}: {}, logging to console only", path, e);
                None
            }
        };
        Self {
            path: Some(path.to_path_buf()),
            file: Mutex::new(file),
            console: true,
        }
    }

    /// A log that only writes to the console.
    pub fn console_only() -> Self {
        Self {
            path: None,
            file: Mutex::new(None),
            console: true,
        }
    }

    /// Enable or disable console output.
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        let entry = format_entry(Utc::now(), level, message.as_ref());

        if self.console {
            match level {
                LogLevel::Warn | LogLevel::Error => eprintln!("{}", entry),
                LogLevel::Info | LogLevel::Success => println!("{}", entry),
            }
        }

        let mut file = self.file.lock();
        if let Some(handle) = file.as_mut() {
            if let Err(e) = writeln!(handle, "{}", entry) {
                warn!("Failed to append to log file: {}, logging to console only", e);
                *file = None;
            }
        }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    pub fn success(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Success, message);
    }
}

impl fmt::Debug for MonitorLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorLog")
            .field("path", &self.path)
            .field("console", &self.console)
            .finish()
    }
}
