//! File watcher: re-runs the type checker on changed source files.
//!
//! Watching is best effort. When the crate is built without the `watch`
//! feature, or the platform watcher cannot be created, [`FileWatcher::start`]
//! returns an error and the supervisor carries on without it.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "watch")]
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;
use walkdir::WalkDir;

use fixwatch_runner::{CommandRunner, CommandSpec, OutputMode};

use crate::config::MonitorConfig;
use crate::error::{CoreError, CoreResult};
use crate::pipeline::{Pipeline, ProcessedMatch};

/// Changes to the same file within this window trigger one type check.
pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// Decides which changed paths the watcher reacts to.
#[derive(Debug, Clone)]
pub struct WatchFilter {
    root: PathBuf,
    patterns: Vec<glob::Pattern>,
    ignore_dirs: Vec<String>,
}

impl WatchFilter {
    pub fn new(root: impl Into<PathBuf>, patterns: &[String], ignore_dirs: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!("Ignoring invalid watch pattern {:?}: {}", p, e);
                    None
                }
            })
            .collect();
        Self {
            root: root.into(),
            patterns,
            ignore_dirs: ignore_dirs.to_vec(),
        }
    }

    pub fn from_config(root: impl Into<PathBuf>, config: &MonitorConfig) -> Self {
        Self::new(root, &config.watch_patterns, &config.ignore_dirs)
    }

    fn is_ignored(&self, name: &OsStr) -> bool {
        let name = name.to_string_lossy();
        self.ignore_dirs.iter().any(|dir| *dir == name)
    }

    /// The path relative to the root, if the watcher should react to it.
    pub fn relative(&self, path: &Path) -> Option<PathBuf> {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        if relative.components().any(|c| self.is_ignored(c.as_os_str())) {
            return None;
        }
        self.patterns
            .iter()
            .any(|p| p.matches_path(relative))
            .then(|| relative.to_path_buf())
    }

    /// Top-level directories to watch recursively, skipping ignored ones.
    ///
    /// The root itself is watched non-recursively so ignored trees such as
    /// `node_modules` never get a watch of their own.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir() && !self.is_ignored(e.file_name()))
            .map(|e| e.into_path())
            .collect()
    }

    /// Whether `path` is a directory created directly under the root that
    /// needs a recursive watch of its own.
    pub fn is_new_watch_root(&self, path: &Path) -> bool {
        path.parent() == Some(self.root.as_path())
            && path.is_dir()
            && path.file_name().is_some_and(|name| !self.is_ignored(name))
    }
}

/// Collapses bursts of change events for the same path.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last: HashMap::new(),
        }
    }

    /// Whether an event for `path` at `now` should fire.
    pub fn ready(&mut self, path: &Path, now: Instant) -> bool {
        match self.last.get(path) {
            Some(previous) if now.saturating_duration_since(*previous) < self.window => false,
            _ => {
                self.last.insert(path.to_path_buf(), now);
                true
            }
        }
    }
}

/// Type-check one changed file and feed the output through the pipeline.
pub async fn check_file(
    pipeline: &Pipeline,
    runner: &dyn CommandRunner,
    type_check: &CommandSpec,
    root: &Path,
    file: &Path,
) -> Vec<ProcessedMatch> {
    pipeline.log().info(format!("File changed: {}", file.display()));

    let command = type_check.clone().arg(file.to_string_lossy());
    match runner.run(&command, root, OutputMode::Capture).await {
        Ok(output) => pipeline.process_text(&output.combined_output()).await,
        Err(e) => {
            pipeline
                .log()
                .warn(format!("Type check of {} failed to run: {}", file.display(), e));
            Vec::new()
        }
    }
}

/// A running file watcher. Dropping it (or calling [`stop`](Self::stop))
/// ends the watch.
pub struct FileWatcher {
    task: Option<JoinHandle<()>>,
    #[cfg(feature = "watch")]
    watcher: Option<Arc<Mutex<notify::RecommendedWatcher>>>,
}

impl FileWatcher {
    /// Start watching `root` and its non-ignored top-level directories.
    #[cfg(feature = "watch")]
    pub fn start(
        root: &Path,
        config: &MonitorConfig,
        pipeline: Arc<Pipeline>,
        runner: Arc<dyn CommandRunner>,
    ) -> CoreResult<Self> {
        use notify::event::ModifyKind;
        use notify::{EventKind, RecursiveMode, Watcher};

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<PathBuf>();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                let relevant = matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Name(_) | ModifyKind::Any)
                );
                if relevant {
                    for path in event.paths {
                        let _ = tx.send(path);
                    }
                }
            }
            Err(e) => warn!("File watcher error: {}", e),
        })
        .map_err(|e| CoreError::Watch(e.to_string()))?;

        let filter = WatchFilter::from_config(root, config);
        watcher
            .watch(root, RecursiveMode::NonRecursive)
            .map_err(|e| CoreError::Watch(e.to_string()))?;
        for dir in filter.watch_roots() {
            watcher
                .watch(&dir, RecursiveMode::Recursive)
                .map_err(|e| CoreError::Watch(format!("{}: {}", dir.display(), e)))?;
        }
        tracing::debug!("Watching {} non-recursively plus its source directories", root.display());

        let watcher = Arc::new(Mutex::new(watcher));
        let handle = Arc::downgrade(&watcher);
        let type_check = config.type_check.clone();
        let root = root.to_path_buf();
        let task = tokio::spawn(async move {
            let mut debouncer = Debouncer::new(DEBOUNCE);
            while let Some(path) = rx.recv().await {
                if filter.is_new_watch_root(&path) {
                    if let Some(watcher) = handle.upgrade() {
                        if let Err(e) = watcher.lock().watch(&path, RecursiveMode::Recursive) {
                            warn!("Cannot watch {}: {}", path.display(), e);
                        }
                    }
                    continue;
                }
                let Some(relative) = filter.relative(&path) else {
                    continue;
                };
                if !debouncer.ready(&relative, Instant::now()) {
                    continue;
                }
                check_file(&pipeline, runner.as_ref(), &type_check, &root, &relative).await;
            }
        });

        Ok(Self {
            task: Some(task),
            watcher: Some(watcher),
        })
    }

    /// Always fails: this build has no file watcher.
    #[cfg(not(feature = "watch"))]
    pub fn start(
        _root: &Path,
        _config: &MonitorConfig,
        _pipeline: Arc<Pipeline>,
        _runner: Arc<dyn CommandRunner>,
    ) -> CoreResult<Self> {
        Err(CoreError::Watch(
            "built without the `watch` feature".to_string(),
        ))
    }

    /// End the watch now, abandoning a type check in progress.
    pub fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// End the watch after the changes already reported have been checked
    /// and any fixes they started have completed.
    pub async fn finish(mut self) {
        #[cfg(feature = "watch")]
        drop(self.watcher.take());
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("File watcher task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
