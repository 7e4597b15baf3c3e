use crate::command::{CommandState, CommandStatus, Strategy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Frozen view of a command at the moment it was recorded in a sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepState {
    pub number: u32,
    pub name: String,
    pub status: CommandStatus,
    pub output: String,
    pub duration: Duration,
    pub error: String,
    pub strategy: Strategy,
}

impl StepState {
    /// Placeholder for a planned step that has not run yet
    pub fn pending(number: u32, name: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            number,
            name: name.into(),
            strategy,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: CommandStatus) -> Self {
        self.status = status;
        self
    }
}

impl From<&CommandState> for StepState {
    fn from(state: &CommandState) -> Self {
        Self {
            number: state.number,
            name: state.name.clone(),
            status: state.status,
            output: state.output.clone(),
            duration: state.exec_time,
            error: state.error.clone(),
            strategy: state.strategy,
        }
    }
}
