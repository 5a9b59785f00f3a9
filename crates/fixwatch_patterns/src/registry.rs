//! Ordered registry of error categories.

use std::sync::Arc;

use tracing::debug;

use crate::category::ErrorCategory;
use crate::error::{PatternError, PatternResult};
use crate::planner::{
    BuildFailureRule, CompilerDiagnosticRule, DependencyFailureRule, LintDiagnosticRule,
    MissingModuleRule, SyntaxErrorRule, TypeMismatchRule,
};

/// Names of the built-in categories.
pub mod names {
    pub const COMPILER_DIAGNOSTIC: &str = "compiler-diagnostic";
    pub const LINT_DIAGNOSTIC: &str = "lint-diagnostic";
    pub const MISSING_MODULE: &str = "missing-module";
    pub const BUILD_FAILURE: &str = "build-failure";
    pub const DEPENDENCY_MISSING: &str = "dependency-missing";
    pub const SYNTAX_ERROR: &str = "syntax-error";
    pub const TYPE_MISMATCH: &str = "type-mismatch";
}

/// `file(line,col)` at the start of a compiler diagnostic.
const COMPILER_LOCATOR: &str = r"^\s*(?P<file>.+?)\((?P<line>\d+),(?P<column>\d+)\)";

/// A source path with an optional `:line:col` or `(line,col)` suffix.
const SOURCE_LOCATOR: &str =
    r"(?P<file>[\w@./\\-]+\.(?:tsx?|jsx?|mjs|cjs)\b)(?:[:(](?P<line>\d+)(?:[,:](?P<column>\d+))?\)?)?";

/// A registry of error categories, evaluated in registration order.
///
/// The registry is built once at startup and only read afterwards; the
/// classifier and planner share it through an `Arc`.
#[derive(Debug, Default)]
pub struct PatternRegistry {
    categories: Vec<ErrorCategory>,
}

impl PatternRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            categories: Vec::new(),
        }
    }

    /// The categories matching the toolchain failure shapes of a
    /// TypeScript / ESLint / Next.js project.
    pub fn standard() -> PatternResult<Self> {
        let mut registry = Self::new();

        registry.register(
            ErrorCategory::new(names::COMPILER_DIAGNOSTIC, r"error TS(?P<code>\d+): (?P<message>.+)")?
                .with_locator(COMPILER_LOCATOR)?
                .with_description("Compiler diagnostic with a numbered code")
                .with_planner(Arc::new(CompilerDiagnosticRule)),
        )?;

        registry.register(
            ErrorCategory::new(
                names::LINT_DIAGNOSTIC,
                r"^\s*(?:(?P<file>\S+?):)?(?P<line>\d+):(?P<column>\d+):?\s+error\s+(?P<message>.+?)\s+(?P<rule>\S+)\s*$",
            )?
            .with_description("Linter diagnostic with position, severity, message and rule id")
            .with_planner(Arc::new(LintDiagnosticRule)),
        )?;

        registry.register(
            ErrorCategory::new(
                names::MISSING_MODULE,
                r#"(?:Cannot find module|Can't resolve) ['"](?P<module>.+?)['"]"#,
            )?
            .with_locator(&format!(r"^\s*{}", SOURCE_LOCATOR))?
            .with_description("Import of a module that cannot be found")
            .with_planner(Arc::new(MissingModuleRule)),
        )?;

        registry.register(
            ErrorCategory::new(names::BUILD_FAILURE, r"(?i)Failed to compile|Error:|Build error")?
                .with_description("Generic build or compile failure banner")
                .with_planner(Arc::new(BuildFailureRule)),
        )?;

        registry.register(
            ErrorCategory::new(
                names::DEPENDENCY_MISSING,
                r"(?i)Module not found|Cannot resolve|Package not found",
            )?
            .with_description("Generic dependency resolution failure")
            .with_planner(Arc::new(DependencyFailureRule)),
        )?;

        registry.register(
            ErrorCategory::new(names::SYNTAX_ERROR, r"(?i)SyntaxError|Unexpected token|Parse error")?
                .with_locator(SOURCE_LOCATOR)?
                .with_description("Generic syntax error banner")
                .with_planner(Arc::new(SyntaxErrorRule)),
        )?;

        registry.register(
            ErrorCategory::new(
                names::TYPE_MISMATCH,
                r#"(?i)Type ['"](?P<type>.+?)['"] is not assignable to type"#,
            )?
            .with_description("Assignability mismatch naming a type")
            .with_planner(Arc::new(TypeMismatchRule)),
        )?;

        Ok(registry)
    }

    /// Register a category at the end of the evaluation order.
    pub fn register(&mut self, category: ErrorCategory) -> PatternResult<()> {
        if self.contains(category.name()) {
            return Err(PatternError::DuplicateCategory(category.name().to_string()));
        }
        debug!("Registering error category: {}", category.name());
        self.categories.push(category);
        Ok(())
    }

    /// Get a category by name.
    pub fn get(&self, name: &str) -> Option<&ErrorCategory> {
        self.categories.iter().find(|c| c.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate categories in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorCategory> {
        self.categories.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
