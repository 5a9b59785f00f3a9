//! Import source resolution for missing symbols.
//!
//! Candidate roots are probed in a fixed order and the first hit wins:
//! runtime packages first (from a static export list), then each alias root,
//! scanned on disk for a file that exports the symbol.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use fixwatch_patterns::{package_name, DependencySet};

use crate::config::{AliasRoot, MonitorConfig, PackageExports};

const SOURCE_EXTENSIONS: [&str; 4] = ["ts", "tsx", "js", "jsx"];

/// Directories never descended into while scanning alias roots.
const SKIP_DIRS: [&str; 2] = ["node_modules", ".next"];

/// Finds a module to import a missing symbol from.
#[derive(Debug, Clone)]
pub struct ImportResolver {
    root: PathBuf,
    packages: Vec<PackageExports>,
    aliases: Vec<AliasRoot>,
}

impl ImportResolver {
    pub fn new(root: impl Into<PathBuf>, packages: Vec<PackageExports>, aliases: Vec<AliasRoot>) -> Self {
        Self {
            root: root.into(),
            packages,
            aliases,
        }
    }

    pub fn from_config(root: impl Into<PathBuf>, config: &MonitorConfig) -> Self {
        Self::new(root, config.packages.clone(), config.aliases.clone())
    }

    /// Module specifier to import `symbol` from, if any candidate provides it.
    pub fn resolve(&self, symbol: &str, dependencies: Option<&DependencySet>) -> Option<String> {
        self.resolve_package(symbol, dependencies)
            .or_else(|| self.resolve_alias(symbol))
    }

    fn resolve_package(&self, symbol: &str, dependencies: Option<&DependencySet>) -> Option<String> {
        self.packages
            .iter()
            .filter(|p| p.exports.iter().any(|e| e == symbol))
            .find(|p| self.package_available(&p.specifier, dependencies))
            .map(|p| {
                debug!("Resolved {} to package {}", symbol, p.specifier);
                p.specifier.clone()
            })
    }

    fn package_available(&self, specifier: &str, dependencies: Option<&DependencySet>) -> bool {
        let Some(package) = package_name(specifier) else {
            return false;
        };
        self.root.join("node_modules").join(&package).is_dir()
            || dependencies.is_some_and(|deps| deps.contains(&package))
    }

    fn resolve_alias(&self, symbol: &str) -> Option<String> {
        self.aliases.iter().find_map(|alias| {
            let dir = self.root.join(&alias.root);
            if !dir.is_dir() {
                return None;
            }
            let found = search_for_symbol(symbol, &dir)?;
            let specifier = format!("{}/{}", alias.prefix.trim_end_matches('/'), found);
            debug!("Resolved {} to {}", symbol, specifier);
            Some(specifier)
        })
    }
}

/// First source file under `dir` (in file-name order) that mentions both an
/// export and `symbol`, as a slash-separated path without extension.
fn search_for_symbol(symbol: &str, dir: &Path) -> Option<String> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir()
                && SKIP_DIRS.iter().any(|skip| e.file_name() == *skip))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
        })
        .find(|e| {
            fs::read_to_string(e.path())
                .map(|content| content.contains("export") && content.contains(symbol))
                .unwrap_or(false)
        })
        .and_then(|e| {
            let relative = e.path().strip_prefix(dir).ok()?.with_extension("");
            let parts: Vec<_> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            Some(parts.join("/"))
        })
}
