//! Aggregate status precedence
//!
//! The worst observed outcome wins: `error > warning > success >
//! not_executed`. An incoming `running` always switches the aggregate to
//! `running`, and once the aggregate is `running` step updates leave it
//! there. An incoming `not_executed` changes nothing.

use crate::command::CommandStatus;

/// New aggregate status after recording a step with status `incoming`
pub fn next_status(previous: CommandStatus, incoming: CommandStatus) -> CommandStatus {
    use CommandStatus::*;

    match (previous, incoming) {
        (Running, _) => Running,
        (_, Running) => Running,
        (_, Error) => Error,
        (Error, Warning) => Error,
        (_, Warning) => Warning,
        (Error, Success) => Error,
        (Warning, Success) => Warning,
        (_, Success) => Success,
        (previous, NotExecuted) => previous,
    }
}
