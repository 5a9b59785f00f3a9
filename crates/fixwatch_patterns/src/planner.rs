//! Fix planner: derives a fix plan from a category match.
//!
//! Planning is a pure function of the match and the declared dependency
//! set. It never touches the filesystem itself; the caller loads the
//! manifest and passes it in through [`PlanContext`].

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::debug;

use crate::classifier::Match;
use crate::manifest::{is_local_specifier, package_name, DependencySet};
use crate::plan::FixPlan;
use crate::registry::PatternRegistry;

/// Read-only inputs available while planning.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanContext<'a> {
    /// Declared dependencies, `None` when the project has no manifest.
    pub dependencies: Option<&'a DependencySet>,
    /// Extra specifier prefixes that refer to project-local modules.
    pub local_prefixes: &'a [String],
}

impl<'a> PlanContext<'a> {
    pub fn new(dependencies: Option<&'a DependencySet>, local_prefixes: &'a [String]) -> Self {
        Self {
            dependencies,
            local_prefixes,
        }
    }
}

/// Remediation-derivation rule attached to a category.
pub trait PlanRule: Send + Sync {
    /// Return a plan for the match, or `None` when nothing is actionable.
    fn plan(&self, m: &Match, ctx: &PlanContext<'_>) -> Option<FixPlan>;
}

impl<F> PlanRule for F
where
    F: Fn(&Match, &PlanContext<'_>) -> Option<FixPlan> + Send + Sync,
{
    fn plan(&self, m: &Match, ctx: &PlanContext<'_>) -> Option<FixPlan> {
        self(m, ctx)
    }
}

/// Dispatches each match to the plan rule of its category.
#[derive(Debug, Clone)]
pub struct FixPlanner {
    registry: Arc<PatternRegistry>,
}

impl FixPlanner {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self { registry }
    }

    pub fn plan(&self, m: &Match, ctx: &PlanContext<'_>) -> Option<FixPlan> {
        let category = self.registry.get(&m.category)?;
        let plan = category.planner()?.plan(m, ctx);
        debug!("Planned {:?} for {} match", plan.as_ref().map(|p| p.action()), m.category);
        plan
    }
}

fn quoted(pattern: &'static OnceLock<Option<Regex>>, source: &str, text: &str) -> Option<String> {
    let re = pattern.get_or_init(|| Regex::new(source).ok()).as_ref()?;
    re.captures(text).map(|caps| caps[1].to_string())
}

fn missing_symbol(message: &str) -> Option<String> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    quoted(&RE, r#"Cannot find name ['"](.+?)['"]"#, message)
}

fn first_quoted(text: &str) -> Option<String> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    quoted(&RE, r#"(?:^|[\s:(])['"]([^'"\s]+)['"]"#, text)
}

/// Package to install for a non-local specifier that the manifest lacks.
fn undeclared_package(specifier: &str, ctx: &PlanContext<'_>) -> Option<String> {
    if is_local_specifier(specifier, ctx.local_prefixes) {
        return None;
    }
    let dependencies = ctx.dependencies?;
    let package = package_name(specifier)?;
    if dependencies.contains(&package) {
        debug!("{} is already declared, not installing", package);
        return None;
    }
    Some(package)
}

/// Compiler diagnostics: `file(line,col): error TSxxxx: message`.
#[derive(Debug, Default)]
pub struct CompilerDiagnosticRule;

impl PlanRule for CompilerDiagnosticRule {
    fn plan(&self, m: &Match, _ctx: &PlanContext<'_>) -> Option<FixPlan> {
        let location = m.location.as_ref()?;
        let message = m.capture("message").unwrap_or(&m.text);
        let file = location.file.clone();

        if message.contains("Cannot find name") {
            let symbol = missing_symbol(message)?;
            return Some(FixPlan::AddImport { file, symbol });
        }
        if message.contains("is possibly") {
            return Some(FixPlan::AddNullCheck {
                file,
                line: location.line,
            });
        }
        if message.contains("Property") && message.contains("does not exist") {
            return Some(FixPlan::FixProperty {
                file,
                message: message.to_string(),
            });
        }
        if message.contains("Type") && message.contains("is not assignable") {
            return Some(FixPlan::FixType {
                file,
                message: message.to_string(),
            });
        }
        None
    }
}

/// Linter diagnostics: `[file:]line:col error message rule-id`.
#[derive(Debug, Default)]
pub struct LintDiagnosticRule;

impl PlanRule for LintDiagnosticRule {
    fn plan(&self, m: &Match, _ctx: &PlanContext<'_>) -> Option<FixPlan> {
        let rule = m.capture("rule")?;
        let line = m.line_number()?;
        let file = m.file().map(str::to_string);

        if rule.contains("no-unused-vars") {
            return Some(FixPlan::RemoveUnused { file, line });
        }
        if rule.contains("react-hooks") {
            return Some(FixPlan::FixReactHooks {
                file,
                line,
                rule: rule.to_string(),
            });
        }
        if rule.contains("@typescript-eslint") {
            return Some(FixPlan::FixTypescriptEslint {
                file,
                line,
                rule: rule.to_string(),
            });
        }
        None
    }
}

/// `Cannot find module 'x'` / `Can't resolve 'x'`.
#[derive(Debug, Default)]
pub struct MissingModuleRule;

impl PlanRule for MissingModuleRule {
    fn plan(&self, m: &Match, ctx: &PlanContext<'_>) -> Option<FixPlan> {
        let module = m.capture("module")?;
        if is_local_specifier(module, ctx.local_prefixes) {
            return Some(FixPlan::FixLocalImport {
                module: module.to_string(),
                file: m.file().map(str::to_string),
            });
        }
        undeclared_package(module, ctx).map(|package| FixPlan::InstallPackage { package })
    }
}

/// Generic build failure banner, advisory only.
#[derive(Debug, Default)]
pub struct BuildFailureRule;

impl PlanRule for BuildFailureRule {
    fn plan(&self, m: &Match, _ctx: &PlanContext<'_>) -> Option<FixPlan> {
        Some(FixPlan::AnalyzeBuildError {
            message: m.line.trim().to_string(),
        })
    }
}

/// Generic dependency resolution failure naming a quoted package.
#[derive(Debug, Default)]
pub struct DependencyFailureRule;

impl PlanRule for DependencyFailureRule {
    fn plan(&self, m: &Match, ctx: &PlanContext<'_>) -> Option<FixPlan> {
        let name = first_quoted(&m.line)?;
        undeclared_package(&name, ctx).map(|package| FixPlan::InstallDependency { package })
    }
}

/// Generic syntax error banner.
#[derive(Debug, Default)]
pub struct SyntaxErrorRule;

impl PlanRule for SyntaxErrorRule {
    fn plan(&self, m: &Match, _ctx: &PlanContext<'_>) -> Option<FixPlan> {
        Some(FixPlan::FixSyntax {
            file: m.file().map(str::to_string),
            message: m.line.trim().to_string(),
        })
    }
}

/// `Type 'X' is not assignable to type ...`, advisory only.
#[derive(Debug, Default)]
pub struct TypeMismatchRule;

impl PlanRule for TypeMismatchRule {
    fn plan(&self, m: &Match, _ctx: &PlanContext<'_>) -> Option<FixPlan> {
        Some(FixPlan::FixTypeAssignment {
            type_name: m.capture("type")?.to_string(),
            message: m.line.trim().to_string(),
        })
    }
}
