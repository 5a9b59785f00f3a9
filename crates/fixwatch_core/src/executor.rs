//! Fix executor: applies fix plans to the project.
//!
//! Every file edit is a single read-modify-write that lands through a
//! temporary file and a rename, so an interrupted session never leaves a
//! half-written source file behind.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use fixwatch_patterns::{DependencySet, FixPlan};
use fixwatch_runner::{CommandRunner, OutputMode, PackageManager};

use crate::error::{CoreError, CoreResult};
use crate::ledger::FixLedger;
use crate::resolver::ImportResolver;

/// Result of executing one fix plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "kebab-case")]
pub enum FixOutcome {
    /// The mutation or install was carried out.
    Applied,
    /// The target already satisfied the fix; nothing was changed.
    AlreadySatisfied,
    /// The same key was attempted earlier in this session.
    Skipped,
    /// Advisory action; detected and logged, never applied.
    NotApplied,
    /// The fix was attempted and did not succeed.
    Failed(String),
}

impl FixOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Applied | Self::AlreadySatisfied)
    }
}

impl fmt::Display for FixOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => f.write_str("applied"),
            Self::AlreadySatisfied => f.write_str("already satisfied"),
            Self::Skipped => f.write_str("skipped"),
            Self::NotApplied => f.write_str("not applied"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Applies fix plans, at most once per key per session.
pub struct FixExecutor {
    root: PathBuf,
    resolver: ImportResolver,
    runner: Arc<dyn CommandRunner>,
    package_manager: PackageManager,
    ledger: Arc<FixLedger>,
}

impl FixExecutor {
    pub fn new(
        root: impl Into<PathBuf>,
        resolver: ImportResolver,
        runner: Arc<dyn CommandRunner>,
        package_manager: PackageManager,
    ) -> Self {
        Self {
            root: root.into(),
            resolver,
            runner,
            package_manager,
            ledger: Arc::new(FixLedger::new()),
        }
    }

    /// Share a ledger with other executors of the same session.
    pub fn with_ledger(mut self, ledger: Arc<FixLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn ledger(&self) -> &Arc<FixLedger> {
        &self.ledger
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Execute `plan`. Never fails: errors become [`FixOutcome::Failed`].
    pub async fn execute(&self, plan: &FixPlan, dependencies: Option<&DependencySet>) -> FixOutcome {
        if plan.is_advisory() {
            return FixOutcome::NotApplied;
        }

        let key = plan.key();
        if !self.ledger.try_claim(&key) {
            debug!("Fix {} already attempted this session", key);
            return FixOutcome::Skipped;
        }

        match self.apply(plan, dependencies).await {
            Ok(outcome) => outcome,
            Err(e) => FixOutcome::Failed(e.to_string()),
        }
    }

    async fn apply(&self, plan: &FixPlan, dependencies: Option<&DependencySet>) -> CoreResult<FixOutcome> {
        match plan {
            FixPlan::AddImport { file, symbol } => self.add_import(file, symbol, dependencies),
            FixPlan::FixLocalImport { module, file } => {
                let file = file
                    .as_deref()
                    .ok_or_else(|| CoreError::NoTargetFile(plan.to_string()))?;
                self.add_import(file, module, dependencies)
            }
            FixPlan::RemoveUnused { file, line } => {
                let file = file
                    .as_deref()
                    .ok_or_else(|| CoreError::NoTargetFile(plan.to_string()))?;
                self.remove_unused(file, *line)
            }
            FixPlan::FixSyntax { file, .. } => {
                let file = file
                    .as_deref()
                    .ok_or_else(|| CoreError::NoTargetFile(plan.to_string()))?;
                self.balance_braces(file)
            }
            FixPlan::InstallPackage { package } | FixPlan::InstallDependency { package } => {
                self.install(package).await
            }
            other => Ok(FixOutcome::Failed(format!("no executor for {}", other.action()))),
        }
    }

    fn target_path(&self, file: &str) -> CoreResult<PathBuf> {
        let path = Path::new(file);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        if !path.is_file() {
            return Err(CoreError::FileNotFound(path.display().to_string()));
        }
        Ok(path)
    }

    fn add_import(
        &self,
        file: &str,
        symbol: &str,
        dependencies: Option<&DependencySet>,
    ) -> CoreResult<FixOutcome> {
        let path = self.target_path(file)?;
        let content = fs::read_to_string(&path)?;
        if content.contains(symbol) {
            return Ok(FixOutcome::AlreadySatisfied);
        }

        let source = self
            .resolver
            .resolve(symbol, dependencies)
            .ok_or_else(|| CoreError::Unresolved(symbol.to_string()))?;
        let statement = format!("import {{ {} }} from '{}';", symbol, source);

        let mut lines: Vec<&str> = content.split('\n').collect();
        let at = import_insertion_index(&lines);
        lines.insert(at, &statement);
        write_atomic(&path, &lines.join("\n"))?;

        debug!("Inserted `{}` into {:?} at line {}", statement, path, at + 1);
        Ok(FixOutcome::Applied)
    }

    fn remove_unused(&self, file: &str, line: u32) -> CoreResult<FixOutcome> {
        static BINDING: OnceLock<Option<Regex>> = OnceLock::new();

        let path = self.target_path(file)?;
        let content = fs::read_to_string(&path)?;
        let mut lines: Vec<&str> = content.split('\n').collect();

        let index = (line as usize)
            .checked_sub(1)
            .filter(|i| *i < lines.len())
            .ok_or_else(|| CoreError::Declined(format!("line {} is outside {}", line, file)))?;

        let name = BINDING
            .get_or_init(|| Regex::new(r"\b(?:const|let|var)\s+(\w+)").ok())
            .as_ref()
            .and_then(|re| re.captures(lines[index]))
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| CoreError::Declined(format!("{}:{} is not a binding declaration", file, line)))?;

        let occurrences = content.matches(name.as_str()).count();
        if occurrences > 1 {
            return Err(CoreError::Declined(format!(
                "'{}' occurs {} times in {}",
                name, occurrences, file
            )));
        }

        lines.remove(index);
        write_atomic(&path, &lines.join("\n"))?;
        Ok(FixOutcome::Applied)
    }

    fn balance_braces(&self, file: &str) -> CoreResult<FixOutcome> {
        let path = self.target_path(file)?;
        let content = fs::read_to_string(&path)?;

        let open = content.matches('{').count();
        let close = content.matches('}').count();
        if open <= close || content.trim().ends_with('}') {
            return Err(CoreError::Declined(format!(
                "no safe syntax repair for {} ({} open, {} close)",
                file, open, close
            )));
        }

        write_atomic(&path, &format!("{}\n}}", content))?;
        Ok(FixOutcome::Applied)
    }

    async fn install(&self, package: &str) -> CoreResult<FixOutcome> {
        let command = self.package_manager.install_command(package);
        let output = self
            .runner
            .run(&command, &self.root, OutputMode::Inherit)
            .await?;
        if !output.success() {
            return Err(CoreError::CommandFailed {
                command: command.to_string(),
                code: output.exit_code,
            });
        }
        Ok(FixOutcome::Applied)
    }
}

impl fmt::Debug for FixExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixExecutor")
            .field("root", &self.root)
            .field("package_manager", &self.package_manager)
            .field("ledger", &self.ledger)
            .finish()
    }
}

/// Index to insert a new import at: after the last top-level `import`
/// statement (including a multi-line one), or 0.
fn import_insertion_index(lines: &[&str]) -> usize {
    let mut after = 0;
    let mut i = 0;
    while i < lines.len() {
        if lines[i].trim_start().starts_with("import ") {
            let end = import_end(lines, i);
            after = end + 1;
            i = end + 1;
        } else {
            i += 1;
        }
    }
    after
}

/// Last line of the import statement starting at `start`.
fn import_end(lines: &[&str], start: usize) -> usize {
    for (offset, line) in lines[start..].iter().enumerate() {
        let trimmed = line.trim();
        let complete = trimmed.ends_with(';')
            || trimmed.contains(" from ")
            || trimmed.starts_with("from ")
            || trimmed.starts_with("} from")
            || (offset == 0 && (trimmed.starts_with("import '") || trimmed.starts_with("import \"")));
        if complete {
            return start + offset;
        }
    }
    start
}

/// Replace `path` with `content` through a temp file in the same directory.
fn write_atomic(path: &Path, content: &str) -> CoreResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())?;
    }
    temp.persist(path).map_err(|e| CoreError::Io(e.error))?;
    Ok(())
}
