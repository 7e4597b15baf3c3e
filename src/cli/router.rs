//! Command routing and execution

use crate::app::error_handling::EXIT_SEQUENCE_FAILED;
use crate::cli::args::Commands;
use crate::cli::commands::*;
use crate::command::CommandStatus;
use anyhow::Result;

/// Execute a CLI command and return the process exit code
pub async fn execute_command(command: Commands) -> Result<i32> {
    match command {
        Commands::Run {
            sequence,
            format,
            debug,
        } => {
            let status = run_sequence_command(&sequence, format, debug).await?;
            Ok(match status {
                CommandStatus::Error => EXIT_SEQUENCE_FAILED,
                _ => 0,
            })
        }
        Commands::Validate { sequence } => {
            run_validate_command(&sequence).await?;
            Ok(0)
        }
    }
}
