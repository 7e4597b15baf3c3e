//! Command contract
//!
//! A command is a single unit of executable work: an external shell
//! invocation ([`ShellCommand`]) or an in-process closure
//! ([`CallableCommand`]). Every variant exposes the same status, output,
//! error and timing view through the [`Command`] trait, which is what a
//! [`CommandSequenceStatus`](crate::sequence::CommandSequenceStatus)
//! consumes.
//!
//! `run` never returns an error. Whatever goes wrong while executing is
//! written to `error` (and `backtrace` where available) and reflected in
//! the returned [`CommandStatus`].

pub mod callable;
pub mod context;
pub mod shell;
pub mod status;
pub mod workdir;

pub use callable::{CallableCommand, CallableCommandBuilder};
pub use context::ExecutionContext;
pub use shell::{ShellCommand, ShellCommandConfig};
pub use status::{CommandStatus, Strategy};
pub use workdir::WorkingDirGuard;

use crate::sequence::StepState;
use async_trait::async_trait;
use std::time::Duration;

/// Fields every command carries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandState {
    pub name: String,
    pub status: CommandStatus,
    pub output: String,
    pub error: String,
    pub backtrace: String,
    pub exec_time: Duration,
    /// Ordinal within a sequence
    pub number: u32,
    pub strategy: Strategy,
}

impl CommandState {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Forget the results of the last execution
    pub fn reset(&mut self) {
        self.backtrace.clear();
        self.error.clear();
        self.exec_time = Duration::ZERO;
        self.output.clear();
        self.status = CommandStatus::NotExecuted;
    }

    /// Append a line to `error`, separating it from earlier text
    pub fn append_error(&mut self, message: &str) {
        if !self.error.is_empty() && !self.error.ends_with('\n') {
            self.error.push('\n');
        }
        self.error.push_str(message);
    }
}

#[async_trait]
pub trait Command: Send {
    fn state(&self) -> &CommandState;

    fn state_mut(&mut self) -> &mut CommandState;

    /// Execute the work and return the resulting status.
    ///
    /// Sets `status`, `output`, `error` and `exec_time` before returning.
    async fn run(&mut self, context: Option<&ExecutionContext>) -> CommandStatus;

    fn name(&self) -> &str {
        &self.state().name
    }

    fn status(&self) -> CommandStatus {
        self.state().status
    }

    fn output(&self) -> &str {
        &self.state().output
    }

    fn error(&self) -> &str {
        &self.state().error
    }

    fn backtrace(&self) -> &str {
        &self.state().backtrace
    }

    fn exec_time(&self) -> Duration {
        self.state().exec_time
    }

    fn number(&self) -> u32 {
        self.state().number
    }

    fn set_number(&mut self, number: u32) {
        self.state_mut().number = number;
    }

    fn strategy(&self) -> Strategy {
        self.state().strategy
    }

    fn set_strategy(&mut self, strategy: Strategy) {
        self.state_mut().strategy = strategy;
    }

    fn reset(&mut self) {
        self.state_mut().reset();
    }

    fn is_executed(&self) -> bool {
        self.status() != CommandStatus::NotExecuted
    }

    fn has_run(&self) -> bool {
        self.is_executed()
    }

    fn is_success(&self) -> bool {
        self.status() == CommandStatus::Success
    }

    /// Freeze the current results into a step record for a sequence
    fn snapshot(&self) -> StepState {
        StepState::from(self.state())
    }
}
