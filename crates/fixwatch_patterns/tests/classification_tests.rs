//! Integration tests for classification and planning over captured tool output.

use std::sync::Arc;

use fixwatch_patterns::{
    names, DependencySet, FixAction, FixPlanner, LogClassifier, PatternRegistry, PlanContext,
};

const NEXT_DEV_LOG: &str = r#"
> estate-admin@0.1.0 dev
> next dev --turbopack

   ▲ Next.js 15.1.0
   - Local:        http://localhost:3000

 ✓ Starting...
 ✓ Ready in 1422ms
 ○ Compiling /tenant ...
 ⨯ ./components/tenant/tenant-filters.tsx:4:1
Module not found: Can't resolve 'date-fns'
 GET /tenant 500 in 2310ms
"#;

const TSC_LOG: &str = r#"
app/contract/page.tsx(14,7): error TS2304: Cannot find name 'useDebounce'.
components/property/property-form.tsx(88,21): error TS18048: 'owner' is possibly 'undefined'.
components/home/kpi-cards.tsx(31,9): error TS2322: Type 'string' is not assignable to type 'number'.

Found 3 errors in 3 files.
"#;

const ESLINT_LOG: &str = r#"
/work/estate-admin/components/tenant/tenant-card.tsx
  12:9   error  'status' is assigned a value but never used  @typescript-eslint/no-unused-vars
  40:6   error  React Hook useEffect has a missing dependency: 'tenant'  react-hooks/exhaustive-deps

✖ 2 problems (2 errors, 0 warnings)
"#;

fn setup() -> (LogClassifier, FixPlanner) {
    let registry = Arc::new(PatternRegistry::standard().unwrap());
    (LogClassifier::new(registry.clone()), FixPlanner::new(registry))
}

fn actions(log: &str, deps: Option<&DependencySet>) -> Vec<FixAction> {
    let (classifier, planner) = setup();
    let ctx = PlanContext::new(deps, &[]);
    classifier
        .classify_text(log)
        .iter()
        .filter_map(|m| planner.plan(m, &ctx))
        .map(|p| p.action())
        .collect()
}

#[test]
fn test_next_dev_log() {
    let deps = DependencySet::new().with("next").with("react").with("react-dom");
    let found = actions(NEXT_DEV_LOG, Some(&deps));

    assert_eq!(found, vec![FixAction::InstallPackage, FixAction::InstallDependency]);
}

#[test]
fn test_tsc_log() {
    let found = actions(TSC_LOG, None);

    assert_eq!(
        found,
        vec![
            FixAction::AddImport,
            FixAction::AddNullCheck,
            FixAction::FixType,
            FixAction::FixTypeAssignment,
        ]
    );
}

#[test]
fn test_eslint_stylish_log() {
    let found = actions(ESLINT_LOG, None);
    assert_eq!(found, vec![FixAction::RemoveUnused, FixAction::FixReactHooks]);
}

#[test]
fn test_summary_lines_are_ignored() {
    let (classifier, _) = setup();
    assert!(classifier.classify("Found 3 errors in 3 files.").is_empty());
    assert!(classifier.classify("✖ 2 problems (2 errors, 0 warnings)").is_empty());
    assert!(classifier
        .classify(" ⨯ ./components/tenant/tenant-filters.tsx:4:1")
        .is_empty());
}

#[test]
fn test_every_builtin_category_has_a_planner() {
    let registry = PatternRegistry::standard().unwrap();
    for name in [
        names::COMPILER_DIAGNOSTIC,
        names::LINT_DIAGNOSTIC,
        names::MISSING_MODULE,
        names::BUILD_FAILURE,
        names::DEPENDENCY_MISSING,
        names::SYNTAX_ERROR,
        names::TYPE_MISMATCH,
    ] {
        assert!(registry.get(name).unwrap().planner().is_some(), "{}", name);
    }
}
