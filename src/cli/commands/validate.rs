//! Validate command implementation

use crate::config::load_sequence;
use anyhow::Result;
use std::path::Path;

/// Load a sequence file and report what would run
pub async fn run_validate_command(sequence: &Path) -> Result<()> {
    let config = load_sequence(sequence).await?;

    println!(
        "Sequence '{}' is valid: {} steps",
        config.name,
        config.steps.len()
    );
    for command in config.build_commands()? {
        println!("  {}", command);
    }
    Ok(())
}
