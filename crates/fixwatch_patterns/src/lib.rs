//! # fixwatch_patterns
//!
//! Error signature recognition for fixwatch.
//!
//! This crate provides:
//! - **Error Categories**: a recognition pattern, an optional locator and a
//!   plan rule under one name
//! - **Pattern Registry**: the ordered, read-only set of categories
//! - **Log Classifier**: one line of tool output in, matches out
//! - **Fix Planner**: match in, proposed remediation out
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use fixwatch_patterns::{FixPlan, FixPlanner, LogClassifier, PatternRegistry, PlanContext};
//!
//! let registry = Arc::new(PatternRegistry::standard().unwrap());
//! let classifier = LogClassifier::new(registry.clone());
//! let planner = FixPlanner::new(registry);
//!
//! let line = "app/foo.ts(10,5): error TS2304: Cannot find name 'useDebounce'.";
//! let plans: Vec<FixPlan> = classifier
//!     .classify(line)
//!     .iter()
//!     .filter_map(|m| planner.plan(m, &PlanContext::default()))
//!     .collect();
//!
//! assert_eq!(plans[0].to_string(), "add-import useDebounce in app/foo.ts");
//! ```

pub mod category;
pub mod classifier;
pub mod error;
pub mod manifest;
pub mod plan;
pub mod planner;
pub mod registry;

pub use category::{ErrorCategory, SourceLocation};
pub use classifier::{strip_ansi, LogClassifier, Match};
pub use error::{PatternError, PatternResult};
pub use manifest::{is_local_specifier, package_name, DependencySet, MANIFEST_FILE};
pub use plan::{FixAction, FixKey, FixPlan};
pub use planner::{
    BuildFailureRule, CompilerDiagnosticRule, DependencyFailureRule, FixPlanner,
    LintDiagnosticRule, MissingModuleRule, PlanContext, PlanRule, SyntaxErrorRule,
    TypeMismatchRule,
};
pub use registry::{names, PatternRegistry};
