//! Monitor configuration (`.error-monitor-config.json`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use fixwatch_runner::{CommandSpec, PackageManager};

use crate::error::{CoreError, CoreResult};

/// Configuration file name at the project root.
pub const CONFIG_FILE: &str = ".error-monitor-config.json";

/// Default session log file name at the project root.
pub const DEFAULT_LOG_FILE: &str = "error-monitor.log";

/// Default limit for installs and type checks.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 600;

/// A project-local import alias, e.g. `@/hooks` -> `hooks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRoot {
    /// Import prefix as written in source files.
    pub prefix: String,
    /// Directory the prefix maps to, relative to the project root.
    pub root: PathBuf,
}

impl AliasRoot {
    pub fn new(prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            root: root.into(),
        }
    }
}

/// A runtime module and the named exports it is known to provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageExports {
    /// Module specifier used in the generated import.
    pub specifier: String,
    /// Named exports that resolve to this module.
    #[serde(default)]
    pub exports: Vec<String>,
}

impl PackageExports {
    pub fn new<I, S>(specifier: impl Into<String>, exports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            specifier: specifier.into(),
            exports: exports.into_iter().map(Into::into).collect(),
        }
    }
}

/// Monitor configuration.
///
/// Every key is optional; absent keys take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitorConfig {
    /// Master switch; when off the child runs but nothing is classified.
    pub enabled: bool,
    /// Execute fix plans; when off plans are only logged.
    pub auto_fix: bool,
    /// Start the file watcher.
    pub watch: bool,
    /// Session log path, relative to the project root.
    pub log_file: PathBuf,
    /// Package manager for installs; detected from the lockfile when unset.
    pub package_manager: Option<PackageManager>,
    /// Type-check command; the changed file is appended as the last argument.
    pub type_check: CommandSpec,
    /// Seconds an install or type check may run before it is killed;
    /// `null` disables the limit.
    pub command_timeout_secs: Option<u64>,
    /// Glob patterns of files the watcher reacts to.
    pub watch_patterns: Vec<String>,
    /// Directory names the watcher ignores anywhere in a path.
    pub ignore_dirs: Vec<String>,
    /// Project-local alias roots, probed in order.
    pub aliases: Vec<AliasRoot>,
    /// Runtime module roots, probed before the aliases.
    pub packages: Vec<PackageExports>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_fix: true,
            watch: true,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            package_manager: None,
            type_check: CommandSpec::new("npx").args(["tsc", "--noEmit"]),
            command_timeout_secs: Some(DEFAULT_COMMAND_TIMEOUT_SECS),
            watch_patterns: ["**/*.ts", "**/*.tsx", "**/*.js", "**/*.jsx"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ignore_dirs: ["node_modules", ".next", ".git", "dist", "build"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            aliases: vec![
                AliasRoot::new("@/components", "components"),
                AliasRoot::new("@/lib", "lib"),
                AliasRoot::new("@/hooks", "hooks"),
                AliasRoot::new("@/types", "types"),
            ],
            packages: vec![
                PackageExports::new(
                    "react",
                    [
                        "useState",
                        "useEffect",
                        "useCallback",
                        "useMemo",
                        "useRef",
                        "useContext",
                        "useReducer",
                        "useLayoutEffect",
                        "useId",
                        "useTransition",
                        "createContext",
                        "forwardRef",
                        "memo",
                        "Fragment",
                        "Suspense",
                    ],
                ),
                PackageExports::new("next", ["Metadata", "NextPage", "Viewport"]),
                PackageExports::new(
                    "next/navigation",
                    ["useRouter", "usePathname", "useSearchParams", "redirect", "notFound"],
                ),
                PackageExports::new("next/server", ["NextRequest", "NextResponse"]),
            ],
        }
    }
}

impl MonitorConfig {
    /// Default config path for a project root.
    pub fn default_path(root: &Path) -> PathBuf {
        root.join(CONFIG_FILE)
    }

    /// Load a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| CoreError::InvalidConfig {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content).map_err(|message| CoreError::InvalidConfig {
            path: path.display().to_string(),
            message,
        })
    }

    /// Parse config JSON text.
    pub fn parse(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| e.to_string())
    }

    /// Resolve the log file against the project root.
    pub fn log_path(&self, root: &Path) -> PathBuf {
        if self.log_file.is_absolute() {
            self.log_file.clone()
        } else {
            root.join(&self.log_file)
        }
    }

    /// The configured package manager, or the one the lockfile implies.
    pub fn package_manager_for(&self, root: &Path) -> PackageManager {
        self.package_manager
            .unwrap_or_else(|| PackageManager::detect(root))
    }

    /// Limit for external commands, if any.
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    /// Specifier prefixes that point into the project.
    pub fn local_prefixes(&self) -> Vec<String> {
        self.aliases.iter().map(|a| a.prefix.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert!(config.enabled);
        assert!(config.auto_fix);
        assert_eq!(config.type_check.shell_line(), "npx tsc --noEmit");
        assert_eq!(config.aliases[2], AliasRoot::new("@/hooks", "hooks"));
        assert_eq!(config.packages[0].specifier, "react");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = tempdir().unwrap();
        let config = MonitorConfig::load(&MonitorConfig::default_path(temp.path())).unwrap();
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = tempdir().unwrap();
        let path = MonitorConfig::default_path(temp.path());
        fs::write(&path, r#"{ "autoFix": false, "packageManager": "pnpm" }"#).unwrap();

        let config = MonitorConfig::load(&path).unwrap();
        assert!(config.enabled);
        assert!(!config.auto_fix);
        assert_eq!(config.package_manager, Some(PackageManager::Pnpm));
        assert_eq!(config.package_manager_for(temp.path()), PackageManager::Pnpm);
        assert_eq!(config.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn test_custom_aliases_and_type_check() {
        let config = MonitorConfig::parse(
            r#"{
                "aliases": [{ "prefix": "~/ui", "root": "src/ui" }],
                "typeCheck": { "program": "pnpm", "args": ["exec", "tsc", "--noEmit"] }
            }"#,
        )
        .unwrap();

        assert_eq!(config.local_prefixes(), vec!["~/ui".to_string()]);
        assert_eq!(config.type_check.program, "pnpm");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = MonitorConfig::default_path(temp.path());
        fs::write(&path, "{ enabled: yes").unwrap();

        assert!(matches!(
            MonitorConfig::load(&path),
            Err(CoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_command_timeout() {
        assert_eq!(
            MonitorConfig::default().command_timeout(),
            Some(Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS))
        );

        let config = MonitorConfig::parse(r#"{ "commandTimeoutSecs": 90 }"#).unwrap();
        assert_eq!(config.command_timeout(), Some(Duration::from_secs(90)));

        let config = MonitorConfig::parse(r#"{ "commandTimeoutSecs": null }"#).unwrap();
        assert_eq!(config.command_timeout(), None);
    }

    #[test]
    fn test_log_path() {
        let root = Path::new("/work/app");
        let mut config = MonitorConfig::default();
        assert_eq!(config.log_path(root), PathBuf::from("/work/app/error-monitor.log"));

        config.log_file = PathBuf::from("/var/log/monitor.log");
        assert_eq!(config.log_path(root), PathBuf::from("/var/log/monitor.log"));
    }
}
