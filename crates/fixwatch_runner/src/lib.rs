//! # fixwatch_runner
//!
//! Subprocess execution for fixwatch.
//!
//! The fix pipeline shells out to exactly two kinds of external tools: the
//! package manager (to install a missing dependency) and the type checker
//! (re-run on a changed file). Both go through the [`CommandRunner`] trait so
//! the pipeline can be tested against [`MockRunner`] without spawning
//! anything.
//!
//! # Features
//!
//! - **Process Runner**: tokio-based, runs commands through the platform shell
//! - **Output Modes**: inherit the console (installs) or capture (type checks)
//! - **Package Managers**: npm, pnpm, yarn and bun, detected from the lockfile
//! - **Mock Runner**: captured calls and queued responses for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use fixwatch_runner::{CommandRunner, OutputMode, PackageManager, ProcessRunner};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let root = Path::new(".");
//!     let install = PackageManager::detect(root).install_command("left-pad");
//!
//!     let output = ProcessRunner::new().run(&install, root, OutputMode::Inherit).await?;
//!     println!("Exit code: {}", output.exit_code);
//!
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod error;
pub mod mock;
pub mod package;
pub mod process;
pub mod runner;

pub use command::CommandSpec;
pub use error::{RunnerError, RunnerResult};
pub use mock::{CapturedCall, MockResponse, MockRunner};
pub use package::PackageManager;
pub use process::{shell_command, ProcessRunner};
pub use runner::{CommandOutput, CommandRunner, OutputMode};
