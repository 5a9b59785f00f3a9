//! Scan command - Run the fix pipeline over a captured log file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use fixwatch_core::{CoreError, Pipeline, ProcessedMatch};

use super::{GlobalOptions, Project};

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Captured dev server, compiler or linter output
    pub log_file: PathBuf,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: ScanArgs, options: &GlobalOptions) -> Result<()> {
    let project = Project::load(options)?;

    if !args.log_file.exists() {
        return Err(CoreError::FileNotFound(args.log_file.display().to_string()).into());
    }
    let text = std::fs::read_to_string(&args.log_file)
        .with_context(|| format!("Failed to read {}", args.log_file.display()))?;

    let pipeline = Pipeline::from_config(
        &project.root,
        &project.config,
        Arc::new(project.runner()),
        project.log.clone(),
    );
    project
        .log
        .info(format!("Scanning {}", args.log_file.display()));
    let processed = pipeline.process_text(&text).await;
    let stats = pipeline.stats();
    project.log.info(format!("Scan summary: {}", stats));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&processed)?);
    } else if !options.quiet {
        print_report(&processed);
    }
    Ok(())
}

fn print_report(processed: &[ProcessedMatch]) {
    if processed.is_empty() {
        println!("✅ No known errors found");
        return;
    }
    println!("🔍 {} error(s) found:", processed.len());
    for p in processed {
        let plan = p
            .plan
            .as_ref()
            .map(|plan| plan.to_string())
            .unwrap_or_else(|| "no fix".to_string());
        let outcome = p
            .outcome
            .as_ref()
            .map(|o| o.to_string())
            .unwrap_or_else(|| "not executed".to_string());
        println!("   - [{}] {} ({})", p.category, plan, outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_dry_run_scan_leaves_project_untouched() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("hooks")).unwrap();
        std::fs::write(temp.path().join("hooks/use-debounce.ts"), "export const useDebounce = 1;\n").unwrap();
        std::fs::write(temp.path().join("page.ts"), "export const x = 1;\n").unwrap();
        let log_file = temp.path().join("build.log");
        std::fs::write(&log_file, "page.ts(1,1): error TS2304: Cannot find name 'useDebounce'.\n").unwrap();

        let options = GlobalOptions {
            root: Some(temp.path().to_path_buf()),
            dry_run: true,
            quiet: true,
            ..GlobalOptions::default()
        };
        execute(ScanArgs { log_file, json: false }, &options).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(temp.path().join("page.ts")).unwrap(),
            "export const x = 1;\n"
        );
        let log = std::fs::read_to_string(temp.path().join("error-monitor.log")).unwrap();
        assert!(log.contains("Detected compiler-diagnostic error"));
        assert!(log.contains("Scan summary: 1 lines, 1 errors detected"));
    }

    #[tokio::test]
    async fn test_scan_applies_fixes() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("hooks")).unwrap();
        std::fs::write(temp.path().join("hooks/use-debounce.ts"), "export const useDebounce = 1;\n").unwrap();
        std::fs::write(temp.path().join("page.ts"), "export const x = 1;\n").unwrap();
        let log_file = temp.path().join("build.log");
        std::fs::write(&log_file, "page.ts(1,1): error TS2304: Cannot find name 'useDebounce'.\n").unwrap();

        let options = GlobalOptions {
            root: Some(temp.path().to_path_buf()),
            quiet: true,
            ..GlobalOptions::default()
        };
        execute(ScanArgs { log_file, json: false }, &options).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(temp.path().join("page.ts")).unwrap(),
            "import { useDebounce } from '@/hooks/use-debounce';\nexport const x = 1;\n"
        );
    }

    #[tokio::test]
    async fn test_missing_log_file() {
        let temp = tempdir().unwrap();
        let options = GlobalOptions {
            root: Some(temp.path().to_path_buf()),
            quiet: true,
            ..GlobalOptions::default()
        };
        let err = execute(
            ScanArgs {
                log_file: temp.path().join("missing.log"),
                json: false,
            },
            &options,
        )
        .await
        .unwrap_err();
        assert!(matches!(err.downcast_ref::<CoreError>(), Some(CoreError::FileNotFound(_))));
    }
}
