//! Run command - Monitor a development command until it exits or Ctrl-C.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::{info, warn};

use fixwatch_core::{Supervisor, SupervisorState};
use fixwatch_runner::{CommandRunner, CommandSpec};

use super::{GlobalOptions, Project};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Command to monitor, with its arguments (default: npm run dev)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl RunArgs {
    /// The command to supervise.
    pub fn command_spec(&self) -> CommandSpec {
        CommandSpec::from_argv(self.command.iter().cloned())
            .unwrap_or_else(|| CommandSpec::new("npm").args(["run", "dev"]))
    }
}

pub async fn execute(args: RunArgs, options: &GlobalOptions) -> Result<()> {
    let project = Project::load(options)?;
    let command = args.command_spec();
    info!("Monitoring {} in {}", command, project.root.display());

    let runner: Arc<dyn CommandRunner> = Arc::new(project.runner());
    let supervisor = Supervisor::new(project.root, command, project.config, runner, project.log);

    let summary = supervisor.run(shutdown_signal()).await?;
    match summary.state {
        SupervisorState::Exited(Some(code)) if code != 0 => {
            info!("Monitored command exited with code {}", code)
        }
        SupervisorState::Interrupted => info!("Interrupted"),
        _ => {}
    }
    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed the session simply
/// runs until the child exits.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let args = RunArgs::default();
        assert_eq!(args.command_spec().shell_line(), "npm run dev");
    }

    #[test]
    fn test_explicit_command() {
        let args = RunArgs {
            command: vec!["pnpm".into(), "dev".into(), "--port".into(), "3001".into()],
        };
        assert_eq!(args.command_spec().shell_line(), "pnpm dev --port 3001");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_child_exit_code_is_not_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let options = GlobalOptions {
            root: Some(temp.path().to_path_buf()),
            no_watch: true,
            quiet: true,
            ..GlobalOptions::default()
        };
        let args = RunArgs {
            command: vec!["exit".into(), "4".into()],
        };

        execute(args, &options).await.unwrap();

        let log = std::fs::read_to_string(temp.path().join("error-monitor.log")).unwrap();
        assert!(log.contains("Monitored process exited with code 4"));
    }
}
