//! Classify -> plan -> execute, one line at a time.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use fixwatch_patterns::{DependencySet, FixPlan, FixPlanner, LogClassifier, PatternRegistry, PlanContext};
use fixwatch_runner::CommandRunner;

use crate::config::MonitorConfig;
use crate::executor::{FixExecutor, FixOutcome};
use crate::ledger::FixLedger;
use crate::log::MonitorLog;
use crate::resolver::ImportResolver;

/// What happened to one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedMatch {
    pub category: String,
    pub plan: Option<FixPlan>,
    /// `None` when the executor was not invoked.
    pub outcome: Option<FixOutcome>,
}

/// Session counters.
#[derive(Debug, Default)]
struct Counters {
    lines: AtomicUsize,
    detected: AtomicUsize,
    planned: AtomicUsize,
    applied: AtomicUsize,
    already_satisfied: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
    advisory: AtomicUsize,
}

/// A point-in-time copy of the session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub lines: usize,
    pub detected: usize,
    pub planned: usize,
    pub applied: usize,
    pub already_satisfied: usize,
    pub failed: usize,
    pub skipped: usize,
    pub advisory: usize,
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lines, {} errors detected, {} fixes planned: {} applied, {} already satisfied, {} failed, {} skipped, {} advisory",
            self.lines,
            self.detected,
            self.planned,
            self.applied,
            self.already_satisfied,
            self.failed,
            self.skipped,
            self.advisory
        )
    }
}

/// The fix pipeline shared by the output readers and the file watcher.
pub struct Pipeline {
    root: PathBuf,
    enabled: bool,
    auto_fix: bool,
    local_prefixes: Vec<String>,
    classifier: LogClassifier,
    planner: FixPlanner,
    executor: FixExecutor,
    log: Arc<MonitorLog>,
    halted: AtomicBool,
    counters: Counters,
}

impl Pipeline {
    pub fn new(
        root: impl Into<PathBuf>,
        config: &MonitorConfig,
        registry: Arc<PatternRegistry>,
        executor: FixExecutor,
        log: Arc<MonitorLog>,
    ) -> Self {
        Self {
            root: root.into(),
            enabled: config.enabled,
            auto_fix: config.auto_fix,
            local_prefixes: config.local_prefixes(),
            classifier: LogClassifier::new(registry.clone()),
            planner: FixPlanner::new(registry),
            executor,
            log,
            halted: AtomicBool::new(false),
            counters: Counters::default(),
        }
    }

    /// Wire a pipeline from configuration with the standard categories.
    pub fn from_config(
        root: &Path,
        config: &MonitorConfig,
        runner: Arc<dyn CommandRunner>,
        log: Arc<MonitorLog>,
    ) -> Self {
        let registry = match PatternRegistry::standard() {
            Ok(registry) => registry,
            Err(e) => {
                log.error(format!("Built-in error patterns failed to load: {}", e));
                PatternRegistry::new()
            }
        };
        let executor = FixExecutor::new(
            root,
            ImportResolver::from_config(root, config),
            runner,
            config.package_manager_for(root),
        )
        .with_ledger(Arc::new(FixLedger::new()));
        Self::new(root, config, Arc::new(registry), executor, log)
    }

    pub fn log(&self) -> &Arc<MonitorLog> {
        &self.log
    }

    pub fn executor(&self) -> &FixExecutor {
        &self.executor
    }

    /// Stop executing fixes; lines are still classified and logged.
    pub fn halt(&self) {
        self.halted.store(true, Ordering::SeqCst);
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> PipelineStats {
        let c = &self.counters;
        PipelineStats {
            lines: c.lines.load(Ordering::Relaxed),
            detected: c.detected.load(Ordering::Relaxed),
            planned: c.planned.load(Ordering::Relaxed),
            applied: c.applied.load(Ordering::Relaxed),
            already_satisfied: c.already_satisfied.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            skipped: c.skipped.load(Ordering::Relaxed),
            advisory: c.advisory.load(Ordering::Relaxed),
        }
    }

    /// Run one line of tool output through the pipeline.
    pub async fn process_line(&self, line: &str) -> Vec<ProcessedMatch> {
        if !self.enabled {
            return Vec::new();
        }
        self.counters.lines.fetch_add(1, Ordering::Relaxed);

        let matches = self.classifier.classify(line);
        if matches.is_empty() {
            return Vec::new();
        }

        let dependencies = match DependencySet::load(&self.root) {
            Ok(deps) => deps,
            Err(e) => {
                self.log.warn(format!("Cannot read dependency manifest: {}", e));
                None
            }
        };
        let ctx = PlanContext::new(dependencies.as_ref(), &self.local_prefixes);

        let mut processed = Vec::with_capacity(matches.len());
        for m in &matches {
            self.counters.detected.fetch_add(1, Ordering::Relaxed);
            self.log.error(format!("Detected {} error: {}", m.category, m.text));

            let plan = self.planner.plan(m, &ctx);
            let outcome = match &plan {
                Some(plan) => self.handle_plan(&m.category, plan, dependencies.as_ref()).await,
                None => {
                    debug!("No fix plan for {} match", m.category);
                    None
                }
            };

            processed.push(ProcessedMatch {
                category: m.category.clone(),
                plan,
                outcome,
            });
        }
        processed
    }

    /// Run a block of text (e.g. captured type-checker output) line by line.
    pub async fn process_text(&self, text: &str) -> Vec<ProcessedMatch> {
        let mut processed = Vec::new();
        for line in text.lines() {
            processed.extend(self.process_line(line).await);
        }
        processed
    }

    async fn handle_plan(
        &self,
        category: &str,
        plan: &FixPlan,
        dependencies: Option<&DependencySet>,
    ) -> Option<FixOutcome> {
        self.counters.planned.fetch_add(1, Ordering::Relaxed);

        if plan.is_advisory() {
            self.counters.advisory.fetch_add(1, Ordering::Relaxed);
            self.log.info(format!("Advisory only, not applied: {}", plan));
            return Some(FixOutcome::NotApplied);
        }
        if !self.auto_fix {
            self.log.info(format!("Planned fix (autoFix disabled): {}", plan));
            return None;
        }
        if self.is_halted() {
            self.log.info(format!("Shutting down, not applying: {}", plan));
            return None;
        }

        self.log.info(format!("Applying fix: {}", plan));
        let outcome = self.executor.execute(plan, dependencies).await;
        match &outcome {
            FixOutcome::Applied => {
                self.counters.applied.fetch_add(1, Ordering::Relaxed);
                self.log.success(format!("Applied fix for {} error: {}", category, plan));
            }
            FixOutcome::AlreadySatisfied => {
                self.counters.already_satisfied.fetch_add(1, Ordering::Relaxed);
                self.log.success(format!("Already fixed ({} error): {}", category, plan));
            }
            FixOutcome::Skipped => {
                self.counters.skipped.fetch_add(1, Ordering::Relaxed);
                self.log.info(format!("Skipped, already attempted: {}", plan.key()));
            }
            FixOutcome::NotApplied => {
                self.counters.advisory.fetch_add(1, Ordering::Relaxed);
            }
            FixOutcome::Failed(reason) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                self.log.error(format!(
                    "Fix failed [{}] {} {}: {}",
                    category,
                    plan.action(),
                    plan.target().unwrap_or("unknown"),
                    reason
                ));
            }
        }
        Some(outcome)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("root", &self.root)
            .field("enabled", &self.enabled)
            .field("auto_fix", &self.auto_fix)
            .field("halted", &self.is_halted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixwatch_patterns::FixAction;
    use fixwatch_runner::MockRunner;
    use tempfile::{tempdir, TempDir};

    fn pipeline(config: MonitorConfig) -> (TempDir, MockRunner, Pipeline) {
        let temp = tempdir().unwrap();
        let runner = MockRunner::new();
        let log = Arc::new(MonitorLog::open(&temp.path().join("error-monitor.log")).with_console(false));
        let pipeline = Pipeline::from_config(temp.path(), &config, Arc::new(runner.clone()), log);
        (temp, runner, pipeline)
    }

    #[tokio::test]
    async fn test_plain_line_is_ignored() {
        let (_temp, _, pipeline) = pipeline(MonitorConfig::default());
        assert!(pipeline.process_line("✓ Ready in 1.2s").await.is_empty());
        assert_eq!(pipeline.stats().lines, 1);
        assert_eq!(pipeline.stats().detected, 0);
    }

    #[tokio::test]
    async fn test_disabled_classifies_nothing() {
        let config = MonitorConfig {
            enabled: false,
            ..MonitorConfig::default()
        };
        let (_temp, _, pipeline) = pipeline(config);

        assert!(pipeline.process_line("Failed to compile.").await.is_empty());
        assert_eq!(pipeline.stats(), PipelineStats::default());
    }

    #[tokio::test]
    async fn test_advisory_is_logged_not_applied() {
        let (temp, runner, pipeline) = pipeline(MonitorConfig::default());
        let processed = pipeline.process_line("Failed to compile.").await;

        assert_eq!(processed.len(), 1);
        assert_eq!(processed[0].outcome, Some(FixOutcome::NotApplied));
        assert_eq!(pipeline.stats().advisory, 1);
        assert_eq!(runner.call_count(), 0);

        let log = std::fs::read_to_string(temp.path().join("error-monitor.log")).unwrap();
        assert!(log.contains("[ERROR] Detected build-failure error: Failed to compile"));
        assert!(log.contains("[INFO] Advisory only, not applied: analyze-build-error"));
    }

    #[tokio::test]
    async fn test_halt_stops_new_fixes() {
        let (temp, runner, pipeline) = pipeline(MonitorConfig::default());
        std::fs::write(temp.path().join("package.json"), r#"{"dependencies":{}}"#).unwrap();

        pipeline.halt();
        let processed = pipeline.process_line("Cannot find module 'zod'").await;

        assert_eq!(processed[0].plan.as_ref().map(|p| p.action()), Some(FixAction::InstallPackage));
        assert_eq!(processed[0].outcome, None);
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_fix_is_logged_with_category_and_target() {
        let (temp, _, pipeline) = pipeline(MonitorConfig::default());
        let processed = pipeline
            .process_line("app/missing.ts(1,1): error TS2304: Cannot find name 'ghost'.")
            .await;

        assert!(matches!(processed[0].outcome, Some(FixOutcome::Failed(_))));
        assert_eq!(pipeline.stats().failed, 1);

        let log = std::fs::read_to_string(temp.path().join("error-monitor.log")).unwrap();
        assert!(log.contains("[ERROR] Fix failed [compiler-diagnostic] add-import app/missing.ts"));
    }

    #[tokio::test]
    async fn test_malformed_manifest_degrades_to_no_install() {
        let (temp, runner, pipeline) = pipeline(MonitorConfig::default());
        std::fs::write(temp.path().join("package.json"), "{ broken").unwrap();

        let processed = pipeline.process_line("Cannot find module 'zod'").await;
        assert!(processed[0].plan.is_none());
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_process_text() {
        let (_temp, _, pipeline) = pipeline(MonitorConfig::default());
        let processed = pipeline
            .process_text("Build error occurred\nnothing here\nParse error in module")
            .await;

        let categories: Vec<_> = processed.iter().map(|p| p.category.as_str()).collect();
        assert_eq!(categories, vec!["build-failure", "syntax-error"]);
        assert_eq!(pipeline.stats().lines, 3);
    }
}
