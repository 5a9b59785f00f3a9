//! Fix plans: proposed, not-yet-applied remediation actions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Symbolic name of a remediation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixAction {
    AddImport,
    AddNullCheck,
    FixProperty,
    FixType,
    RemoveUnused,
    FixReactHooks,
    FixTypescriptEslint,
    FixLocalImport,
    InstallPackage,
    InstallDependency,
    AnalyzeBuildError,
    FixSyntax,
    FixTypeAssignment,
}

impl FixAction {
    /// Kebab-case identifier used in logs and dedup keys.
    pub fn id(&self) -> &'static str {
        match self {
            Self::AddImport => "add-import",
            Self::AddNullCheck => "add-null-check",
            Self::FixProperty => "fix-property",
            Self::FixType => "fix-type",
            Self::RemoveUnused => "remove-unused",
            Self::FixReactHooks => "fix-react-hooks",
            Self::FixTypescriptEslint => "fix-typescript-eslint",
            Self::FixLocalImport => "fix-local-import",
            Self::InstallPackage => "install-package",
            Self::InstallDependency => "install-dependency",
            Self::AnalyzeBuildError => "analyze-build-error",
            Self::FixSyntax => "fix-syntax",
            Self::FixTypeAssignment => "fix-type-assignment",
        }
    }

    /// Advisory actions are planned and logged but never applied.
    ///
    /// Rewriting null checks, property accesses, type assertions or hook
    /// dependencies needs program-structure analysis this pipeline does not
    /// have, so these stay detect-only.
    pub fn is_advisory(&self) -> bool {
        matches!(
            self,
            Self::AddNullCheck
                | Self::FixProperty
                | Self::FixType
                | Self::FixReactHooks
                | Self::FixTypescriptEslint
                | Self::AnalyzeBuildError
                | Self::FixTypeAssignment
        )
    }

    /// Action part of the dedup key. Both install actions share one family
    /// so a package is installed at most once whichever category asked.
    pub fn dedup_family(&self) -> &'static str {
        match self {
            Self::InstallPackage | Self::InstallDependency => "install",
            other => other.id(),
        }
    }
}

impl fmt::Display for FixAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A proposed remediation with the parameters its action needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum FixPlan {
    AddImport { file: String, symbol: String },
    AddNullCheck { file: String, line: Option<u32> },
    FixProperty { file: String, message: String },
    FixType { file: String, message: String },
    RemoveUnused { file: Option<String>, line: u32 },
    FixReactHooks { file: Option<String>, line: u32, rule: String },
    FixTypescriptEslint { file: Option<String>, line: u32, rule: String },
    FixLocalImport { module: String, file: Option<String> },
    InstallPackage { package: String },
    InstallDependency { package: String },
    AnalyzeBuildError { message: String },
    FixSyntax { file: Option<String>, message: String },
    FixTypeAssignment { type_name: String, message: String },
}

impl FixPlan {
    pub fn action(&self) -> FixAction {
        match self {
            Self::AddImport { .. } => FixAction::AddImport,
            Self::AddNullCheck { .. } => FixAction::AddNullCheck,
            Self::FixProperty { .. } => FixAction::FixProperty,
            Self::FixType { .. } => FixAction::FixType,
            Self::RemoveUnused { .. } => FixAction::RemoveUnused,
            Self::FixReactHooks { .. } => FixAction::FixReactHooks,
            Self::FixTypescriptEslint { .. } => FixAction::FixTypescriptEslint,
            Self::FixLocalImport { .. } => FixAction::FixLocalImport,
            Self::InstallPackage { .. } => FixAction::InstallPackage,
            Self::InstallDependency { .. } => FixAction::InstallDependency,
            Self::AnalyzeBuildError { .. } => FixAction::AnalyzeBuildError,
            Self::FixSyntax { .. } => FixAction::FixSyntax,
            Self::FixTypeAssignment { .. } => FixAction::FixTypeAssignment,
        }
    }

    pub fn is_advisory(&self) -> bool {
        self.action().is_advisory()
    }

    /// The file, module or package the action works on.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::AddImport { file, .. }
            | Self::AddNullCheck { file, .. }
            | Self::FixProperty { file, .. }
            | Self::FixType { file, .. } => Some(file),
            Self::RemoveUnused { file, .. }
            | Self::FixReactHooks { file, .. }
            | Self::FixTypescriptEslint { file, .. }
            | Self::FixSyntax { file, .. } => file.as_deref(),
            Self::FixLocalImport { module, .. } => Some(module),
            Self::InstallPackage { package } | Self::InstallDependency { package } => Some(package),
            Self::AnalyzeBuildError { .. } | Self::FixTypeAssignment { .. } => None,
        }
    }

    /// Deduplication key for this plan.
    pub fn key(&self) -> FixKey {
        FixKey {
            action: self.action().dedup_family(),
            target: self.target().unwrap_or("unknown").to_string(),
        }
    }
}

impl fmt::Display for FixPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddImport { file, symbol } => write!(f, "add-import {} in {}", symbol, file),
            Self::AddNullCheck { file, line } => match line {
                Some(line) => write!(f, "add-null-check in {}:{}", file, line),
                None => write!(f, "add-null-check in {}", file),
            },
            Self::FixProperty { file, .. } => write!(f, "fix-property in {}", file),
            Self::FixType { file, .. } => write!(f, "fix-type in {}", file),
            Self::RemoveUnused { file, line } => {
                write!(f, "remove-unused in {}:{}", file.as_deref().unwrap_or("<unknown>"), line)
            }
            Self::FixReactHooks { rule, .. } => write!(f, "fix-react-hooks ({})", rule),
            Self::FixTypescriptEslint { rule, .. } => write!(f, "fix-typescript-eslint ({})", rule),
            Self::FixLocalImport { module, .. } => write!(f, "fix-local-import {}", module),
            Self::InstallPackage { package } => write!(f, "install-package {}", package),
            Self::InstallDependency { package } => write!(f, "install-dependency {}", package),
            Self::AnalyzeBuildError { message } => write!(f, "analyze-build-error: {}", message),
            Self::FixSyntax { file, .. } => {
                write!(f, "fix-syntax in {}", file.as_deref().unwrap_or("<unknown>"))
            }
            Self::FixTypeAssignment { type_name, .. } => {
                write!(f, "fix-type-assignment for '{}'", type_name)
            }
        }
    }
}

/// Deduplication key: the same key is never executed twice in one session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixKey {
    pub action: &'static str,
    pub target: String,
}

impl fmt::Display for FixKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.action, self.target)
    }
}
