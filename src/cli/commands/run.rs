//! Run command implementation
//!
//! Executes the steps of a sequence file in order and feeds every result
//! into a [`CommandSequenceStatus`]. Stops as soon as the sequence counts
//! as completed, which is immediately after a fail-fast step.

use crate::cli::args::OutputFormat;
use crate::command::{Command, CommandStatus, ExecutionContext};
use crate::config::{load_sequence, SequenceConfig};
use crate::sequence::CommandSequenceStatus;
use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

/// Run a sequence file and print its final status
pub async fn run_sequence_command(
    sequence: &Path,
    format: OutputFormat,
    debug: bool,
) -> Result<CommandStatus> {
    let config = load_sequence(sequence).await?;
    let status = execute_sequence(&config, debug).await?;

    match format {
        OutputFormat::Text => println!("{}", status.summary()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
    }

    Ok(status.status())
}

pub async fn execute_sequence(
    config: &SequenceConfig,
    debug: bool,
) -> Result<CommandSequenceStatus> {
    let mut commands = config.build_commands()?;
    let mut status = CommandSequenceStatus::with_steps(&config.name, config.pending_steps())
        .with_runner(config.runner.as_deref().unwrap_or("stepwise"));
    status.sequence_id = config.id.clone();

    let context = ExecutionContext::new().with_debug(debug);
    info!(
        "Running sequence '{}' with {} steps",
        config.name,
        commands.len()
    );

    for command in commands.iter_mut() {
        info!("Step {} - {}", command.number(), command);
        let result = command.run(Some(&context)).await;

        match result {
            CommandStatus::Error | CommandStatus::Warning => warn!(
                "Step {} finished with {} in {:?}: {}",
                command.number(),
                result,
                command.exec_time(),
                command.error().trim()
            ),
            _ => info!(
                "Step {} finished with {} in {:?}",
                command.number(),
                result,
                command.exec_time()
            ),
        }

        status.record(&*command);
        if status.is_completed() {
            break;
        }
    }

    status.stop();
    info!("{}", status);
    Ok(status)
}
