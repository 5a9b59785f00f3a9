//! End-to-end pipeline scenarios over a scratch project.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use fixwatch_core::{FixOutcome, MonitorConfig, MonitorLog, Pipeline};
use fixwatch_patterns::{FixAction, MANIFEST_FILE};
use fixwatch_runner::{MockRunner, OutputMode};
use tempfile::{tempdir, TempDir};

const MANIFEST: &str = r#"{
  "name": "estate-admin",
  "dependencies": { "next": "15.1.0", "react": "19.0.0", "react-dom": "19.0.0" },
  "devDependencies": { "typescript": "5.7.2" }
}"#;

struct Project {
    temp: TempDir,
    runner: MockRunner,
    pipeline: Pipeline,
}

impl Project {
    fn new(config: MonitorConfig) -> Self {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(MANIFEST_FILE), MANIFEST).unwrap();
        let runner = MockRunner::new();
        let log = Arc::new(MonitorLog::open(&config.log_path(temp.path())).with_console(false));
        let pipeline = Pipeline::from_config(temp.path(), &config, Arc::new(runner.clone()), log);
        Self { temp, runner, pipeline }
    }

    fn root(&self) -> &Path {
        self.temp.path()
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.root().join(rel)).unwrap()
    }

    fn log(&self) -> String {
        fs::read_to_string(self.root().join("error-monitor.log")).unwrap()
    }
}

fn config() -> MonitorConfig {
    MonitorConfig {
        watch: false,
        ..MonitorConfig::default()
    }
}

#[tokio::test]
async fn test_missing_name_gets_import_from_alias_root() {
    let project = Project::new(config());
    project.write(
        "hooks/use-debounce.ts",
        "export function useDebounce<T>(value: T, delay = 300): T {\n  return value;\n}\n",
    );
    project.write(
        "app/foo.ts",
        "import { useState } from 'react';\nimport { cn } from '@/lib/utils';\n\nexport function Search() {\n  const [q] = useState('');\n}\n",
    );

    let processed = project
        .pipeline
        .process_line("app/foo.ts(10,5): error TS2304: Cannot find name 'useDebounce'.")
        .await;

    assert_eq!(processed.len(), 1);
    let plan = processed[0].plan.as_ref().unwrap();
    assert_eq!(plan.action(), FixAction::AddImport);
    assert_eq!(plan.target(), Some("app/foo.ts"));
    assert_eq!(processed[0].outcome, Some(FixOutcome::Applied));

    let lines: Vec<String> = project.read("app/foo.ts").lines().map(String::from).collect();
    assert_eq!(lines[0], "import { useState } from 'react';");
    assert_eq!(lines[1], "import { cn } from '@/lib/utils';");
    assert_eq!(lines[2], "import { useDebounce } from '@/hooks/use-debounce';");
    assert!(project.log().contains("[SUCCESS] Applied fix for compiler-diagnostic error"));
}

#[tokio::test]
async fn test_missing_package_is_installed_once() {
    let project = Project::new(config());

    project
        .pipeline
        .process_line("Module not found: Can't resolve 'left-pad'")
        .await;

    assert_eq!(project.runner.call_count(), 1);
    assert!(project.runner.was_called_with("npm install left-pad"));
    assert_eq!(project.runner.get_calls()[0].mode, OutputMode::Inherit);
    assert_eq!(project.runner.get_calls()[0].dir.as_path(), project.root());
}

#[tokio::test]
async fn test_repeated_missing_module_installs_once() {
    let project = Project::new(config());

    let first = project.pipeline.process_line("Error: Cannot find module 'left-pad'").await;
    let second = project.pipeline.process_line("Error: Cannot find module 'left-pad'").await;

    assert_eq!(project.runner.call_count(), 1);
    assert!(first.iter().any(|p| p.outcome == Some(FixOutcome::Applied)));
    assert!(second.iter().all(|p| p.outcome != Some(FixOutcome::Applied)));
    assert!(second.iter().any(|p| p.outcome == Some(FixOutcome::Skipped)));
}

#[tokio::test]
async fn test_declared_package_is_not_reinstalled() {
    let project = Project::new(config());

    project
        .pipeline
        .process_line("Module not found: Can't resolve 'react-dom/client'")
        .await;

    assert_eq!(project.runner.call_count(), 0);
}

#[tokio::test]
async fn test_hooks_rule_is_detected_but_never_applied() {
    let project = Project::new(config());
    let source = "export function Card({ tenant }) {\n  useEffect(() => load(tenant), []);\n}\n";
    project.write("components/tenant/tenant-card.tsx", source);

    let processed = project
        .pipeline
        .process_line(
            "components/tenant/tenant-card.tsx:2:3 error React Hook useEffect has a missing dependency: 'tenant' react-hooks/exhaustive-deps",
        )
        .await;

    assert_eq!(processed.len(), 1);
    let plan = processed[0].plan.as_ref().unwrap();
    assert_eq!(plan.action(), FixAction::FixReactHooks);
    assert_eq!(processed[0].outcome, Some(FixOutcome::NotApplied));
    assert_eq!(project.read("components/tenant/tenant-card.tsx"), source);
    assert!(project.pipeline.executor().ledger().is_empty());
}

#[tokio::test]
async fn test_auto_fix_off_only_logs() {
    let project = Project::new(MonitorConfig {
        auto_fix: false,
        ..config()
    });
    project.write("hooks/use-debounce.ts", "export const useDebounce = <T,>(v: T) => v;\n");
    project.write("app/foo.ts", "export const x = 1;\n");

    let log = "\
app/foo.ts(1,1): error TS2304: Cannot find name 'useDebounce'.
Module not found: Can't resolve 'left-pad'
app/foo.ts:3:7 error 'unused' is assigned a value but never used @typescript-eslint/no-unused-vars";
    let processed = project.pipeline.process_text(log).await;

    assert!(!processed.is_empty());
    assert!(processed.iter().all(|p| p.outcome.is_none()));
    assert_eq!(project.runner.call_count(), 0);
    assert_eq!(project.read("app/foo.ts"), "export const x = 1;\n");
    assert_eq!(project.pipeline.stats().applied, 0);
    assert!(project.log().contains("Planned fix (autoFix disabled)"));
}
