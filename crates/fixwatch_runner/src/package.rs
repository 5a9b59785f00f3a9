//! Package manager selection.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::CommandSpec;

/// A JavaScript package manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

impl PackageManager {
    /// Lockfiles checked by [`detect`](Self::detect), in priority order.
    const LOCKFILES: [(&'static str, PackageManager); 4] = [
        ("pnpm-lock.yaml", PackageManager::Pnpm),
        ("yarn.lock", PackageManager::Yarn),
        ("bun.lockb", PackageManager::Bun),
        ("bun.lock", PackageManager::Bun),
    ];

    /// Get the CLI command name.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
            Self::Bun => "bun",
        }
    }

    /// Subcommand that adds a dependency.
    fn add_subcommand(&self) -> &'static str {
        match self {
            Self::Npm => "install",
            Self::Pnpm | Self::Yarn | Self::Bun => "add",
        }
    }

    /// The command that installs `package` as a project dependency.
    pub fn install_command(&self, package: &str) -> CommandSpec {
        CommandSpec::new(self.command())
            .arg(self.add_subcommand())
            .arg(package)
    }

    /// Pick the manager whose lockfile is present under `root`, else npm.
    pub fn detect(root: &Path) -> Self {
        let detected = Self::LOCKFILES
            .iter()
            .find(|(lockfile, _)| root.join(lockfile).exists())
            .map(|(_, manager)| *manager)
            .unwrap_or_default();
        debug!("Detected package manager: {}", detected);
        detected
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_install_commands() {
        assert_eq!(
            PackageManager::Npm.install_command("left-pad").shell_line(),
            "npm install left-pad"
        );
        assert_eq!(
            PackageManager::Pnpm.install_command("@scope/pkg").shell_line(),
            "pnpm add @scope/pkg"
        );
        assert_eq!(PackageManager::Yarn.install_command("zod").shell_line(), "yarn add zod");
        assert_eq!(PackageManager::Bun.install_command("zod").shell_line(), "bun add zod");
    }

    #[test]
    fn test_detect_defaults_to_npm() {
        let temp = tempdir().unwrap();
        assert_eq!(PackageManager::detect(temp.path()), PackageManager::Npm);

        std::fs::write(temp.path().join("package-lock.json"), "{}").unwrap();
        assert_eq!(PackageManager::detect(temp.path()), PackageManager::Npm);
    }

    #[test]
    fn test_detect_from_lockfile() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("pnpm-lock.yaml"), "").unwrap();
        assert_eq!(PackageManager::detect(temp.path()), PackageManager::Pnpm);

        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("bun.lockb"), "").unwrap();
        assert_eq!(PackageManager::detect(temp.path()), PackageManager::Bun);
    }

    #[test]
    fn test_serde_names() {
        let pm: PackageManager = serde_json::from_str("\"yarn\"").unwrap();
        assert_eq!(pm, PackageManager::Yarn);
    }
}
