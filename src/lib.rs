//! # Stepwise
//!
//! Run discrete units of work and fold their results into one status.
//!
//! ## Modules
//!
//! - `command` - The command contract plus shell-backed and in-process commands
//! - `sequence` - Aggregation of per-step results into a sequence status
//! - `subprocess` - Process spawning with timeout and process-group kill
//! - `config` - Sequence definition files
//! - `error` - Construction errors
//! - `app` - Logging and configuration for the binary
//! - `cli` - Command-line interface
//!
//! ## Example
//!
//! ```no_run
//! use stepwise::command::{Command, ShellCommand, ShellCommandConfig, Strategy};
//! use stepwise::sequence::CommandSequenceStatus;
//!
//! # async fn demo() -> Result<(), stepwise::error::CommandError> {
//! let mut build = ShellCommand::new(
//!     ShellCommandConfig::new("cargo build").with_name("build").with_timeout(600.0),
//! )?;
//! build.set_number(1);
//! build.set_strategy(Strategy::FailOnError);
//! build.run(None).await;
//!
//! let mut sequence = CommandSequenceStatus::new("release");
//! sequence.record(&build);
//! println!("{}", sequence.summary());
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod sequence;
pub mod subprocess;

pub use command::{
    CallableCommand, Command, CommandStatus, ExecutionContext, ShellCommand, ShellCommandConfig,
    Strategy,
};
pub use error::CommandError;
pub use sequence::{CommandSequenceStatus, StepState};
