//! fixwatch CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success (including a graceful interrupt)
//! - 1: General error, or the monitored command could not be started
//! - 2: Invalid arguments
//! - 3: Configuration error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, CliError, Commands};
use fixwatch_core::CoreError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const SPAWN_FAILURE: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const CONFIG_ERROR: u8 = 3;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_directives = if cli.options.verbose {
        "warn,fixwatch_core=debug,fixwatch_patterns=debug,fixwatch_runner=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Some(Commands::Scan(args)) => commands::scan::execute(args, &cli.options).await,
        None => commands::run::execute(cli.run, &cli.options).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if let Some(e) = e.downcast_ref::<CoreError>() {
        return match e {
            CoreError::Spawn { .. } => ExitCodes::SPAWN_FAILURE,
            CoreError::ConfigNotFound(_) | CoreError::InvalidConfig { .. } => ExitCodes::CONFIG_ERROR,
            _ => ExitCodes::GENERAL_ERROR,
        };
    }
    match e.downcast_ref::<CliError>() {
        Some(CliError::InvalidArgs(_)) => ExitCodes::INVALID_ARGS,
        None => ExitCodes::GENERAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        let spawn = anyhow::Error::new(CoreError::Spawn {
            command: "npm run dev".into(),
            message: "No such file or directory".into(),
        });
        assert_eq!(categorize_error(&spawn), ExitCodes::SPAWN_FAILURE);

        let config = anyhow::Error::new(CoreError::ConfigNotFound("custom.json".into()));
        assert_eq!(categorize_error(&config), ExitCodes::CONFIG_ERROR);

        let args = anyhow::Error::new(CliError::InvalidArgs("bad root".into()));
        assert_eq!(categorize_error(&args), ExitCodes::INVALID_ARGS);

        assert_eq!(categorize_error(&anyhow::anyhow!("boom")), ExitCodes::GENERAL_ERROR);
    }
}
