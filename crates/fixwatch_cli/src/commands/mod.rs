//! CLI command definitions.
//!
//! Without a subcommand, `fixwatch` runs and monitors a command
//! (`npm run dev` unless one is given). `scan` runs the same pipeline over a
//! captured log file instead.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use fixwatch_core::{CoreError, MonitorConfig, MonitorLog};
use fixwatch_runner::ProcessRunner;

pub mod run;
pub mod scan;

/// fixwatch - watch a dev server and fix what it complains about
#[derive(Parser)]
#[command(name = "fixwatch")]
#[command(version, about = "fixwatch - watch a dev server and fix what it complains about")]
#[command(long_about = r#"
fixwatch runs your development command, reads everything it prints, and
applies mechanical fixes for the errors it recognizes: missing imports,
missing packages, unused bindings and unbalanced braces. Everything else is
logged as advisory.

USAGE:
  fixwatch                      → monitor `npm run dev`
  fixwatch -- pnpm dev --turbo  → monitor another command
  fixwatch scan build.log       → run the fix pipeline over a captured log

CONFIGURATION:
  .error-monitor-config.json at the project root (all keys optional)

EXIT CODES:
  0 - Success, or interrupted with Ctrl-C
  1 - General error, or the command could not be started
  2 - Invalid arguments
  3 - Configuration error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub options: GlobalOptions,

    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: run::RunArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the fix pipeline over a captured log file
    Scan(scan::ScanArgs),
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Project root (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Config file (defaults to <root>/.error-monitor-config.json)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not start the file watcher
    #[arg(long, global = true)]
    pub no_watch: bool,

    /// Plan fixes but never apply them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Keep monitor log entries out of the console
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Errors raised by the CLI itself, before any core component runs.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgs(String),
}

/// A project root with its effective configuration and session log.
#[derive(Debug)]
pub struct Project {
    pub root: PathBuf,
    pub config: MonitorConfig,
    pub log: Arc<MonitorLog>,
}

impl Project {
    /// Resolve the root, load the config and apply command-line overrides.
    ///
    /// An explicit `--config` that does not exist is an error. A config that
    /// cannot be read or parsed is reported and replaced by the defaults.
    pub fn load(options: &GlobalOptions) -> Result<Self> {
        let root = match &options.root {
            Some(root) => root.clone(),
            None => std::env::current_dir()?,
        };
        let root = root.canonicalize().map_err(|e| {
            CliError::InvalidArgs(format!("project root {}: {}", root.display(), e))
        })?;

        let config_path = match &options.config {
            Some(path) if !path.exists() => {
                return Err(CoreError::ConfigNotFound(path.display().to_string()).into());
            }
            Some(path) => path.clone(),
            None => MonitorConfig::default_path(&root),
        };

        let (mut config, problem) = match MonitorConfig::load(&config_path) {
            Ok(config) => (config, None),
            Err(e) => (MonitorConfig::default(), Some(e)),
        };
        if options.no_watch {
            config.watch = false;
        }
        if options.dry_run {
            config.auto_fix = false;
        }

        let log = MonitorLog::open(&config.log_path(&root)).with_console(!options.quiet);
        if let Some(e) = problem {
            log.warn(format!("{}; using default configuration", e));
        }

        Ok(Self {
            root,
            config,
            log: Arc::new(log),
        })
    }

    /// Runner for installs and type checks, limited by `commandTimeoutSecs`.
    pub fn runner(&self) -> ProcessRunner {
        let runner = ProcessRunner::new();
        match self.config.command_timeout() {
            Some(limit) => runner.with_timeout(limit),
            None => runner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn options(root: &std::path::Path) -> GlobalOptions {
        GlobalOptions {
            root: Some(root.to_path_buf()),
            quiet: true,
            ..GlobalOptions::default()
        }
    }

    #[test]
    fn test_parse_default_run() {
        let cli = Cli::try_parse_from(["fixwatch"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.run.command.is_empty());
    }

    #[test]
    fn test_parse_trailing_command() {
        let cli = Cli::try_parse_from(["fixwatch", "--no-watch", "pnpm", "dev", "--turbo"]).unwrap();
        assert!(cli.options.no_watch);
        assert_eq!(cli.run.command, ["pnpm", "dev", "--turbo"]);
    }

    #[test]
    fn test_parse_scan() {
        let cli = Cli::try_parse_from(["fixwatch", "scan", "build.log", "--dry-run"]).unwrap();
        assert!(cli.options.dry_run);
        match cli.command {
            Some(Commands::Scan(args)) => assert_eq!(args.log_file, PathBuf::from("build.log")),
            None => panic!("expected scan"),
        }
    }

    #[test]
    fn test_load_applies_overrides() {
        let temp = tempdir().unwrap();
        let project = Project::load(&GlobalOptions {
            no_watch: true,
            dry_run: true,
            ..options(temp.path())
        })
        .unwrap();

        assert!(!project.config.watch);
        assert!(!project.config.auto_fix);
        assert!(project.config.enabled);
        assert_eq!(project.root, temp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_load_missing_explicit_config() {
        let temp = tempdir().unwrap();
        let err = Project::load(&GlobalOptions {
            config: Some(temp.path().join("nope.json")),
            ..options(temp.path())
        })
        .unwrap_err();
        assert!(matches!(err.downcast_ref::<CoreError>(), Some(CoreError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_malformed_config_falls_back() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(".error-monitor-config.json"), "{ autoFix: ").unwrap();

        let project = Project::load(&options(temp.path())).unwrap();

        assert_eq!(project.config, MonitorConfig::default());
        let log = std::fs::read_to_string(temp.path().join("error-monitor.log")).unwrap();
        assert!(log.contains("[WARN] Invalid configuration"));
    }

    #[test]
    fn test_runner_uses_configured_timeout() {
        let temp = tempdir().unwrap();
        std::fs::write(
            temp.path().join(".error-monitor-config.json"),
            r#"{ "commandTimeoutSecs": 45 }"#,
        )
        .unwrap();
        let project = Project::load(&options(temp.path())).unwrap();
        assert_eq!(project.runner().timeout(), Some(std::time::Duration::from_secs(45)));

        std::fs::write(
            temp.path().join(".error-monitor-config.json"),
            r#"{ "commandTimeoutSecs": null }"#,
        )
        .unwrap();
        let project = Project::load(&options(temp.path())).unwrap();
        assert_eq!(project.runner().timeout(), None);
    }

    #[test]
    fn test_load_missing_root() {
        let temp = tempdir().unwrap();
        let err = Project::load(&options(&temp.path().join("missing"))).unwrap_err();
        assert!(matches!(err.downcast_ref::<CliError>(), Some(CliError::InvalidArgs(_))));
    }
}
