//! Status and strategy values shared by commands and sequences

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a command or of a whole sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    /// The command has not been run (or was reset)
    #[default]
    NotExecuted,
    /// Execution is in progress
    Running,
    /// Finished without errors
    Success,
    /// Finished, but something noteworthy happened
    Warning,
    /// Finished with an error
    Error,
}

impl CommandStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandStatus::NotExecuted => "not_executed",
            CommandStatus::Running => "running",
            CommandStatus::Success => "success",
            CommandStatus::Warning => "warning",
            CommandStatus::Error => "error",
        }
    }

    /// `true` for `success`, `warning` and `error`
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CommandStatus::Success | CommandStatus::Warning | CommandStatus::Error
        )
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-step policy deciding whether a sequence may stop early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// A failing step completes the sequence
    FailOnError,
    /// A step with warnings completes the sequence
    FailOnWarning,
    /// Keep going regardless of the step outcome
    #[default]
    Continue,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::FailOnError => "fail_on_error",
            Strategy::FailOnWarning => "fail_on_warning",
            Strategy::Continue => "continue",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
