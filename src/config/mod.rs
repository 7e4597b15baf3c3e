//! Sequence definition files
//!
//! A sequence file lists shell steps in the order they should run:
//!
//! ```yaml
//! name: release
//! id: "2024-06-01"
//! steps:
//!   - name: build
//!     command: cargo build --release
//!     strategy: fail_on_error
//!   - name: smoke
//!     command: ./scripts/smoke.sh
//!     timeout: 30
//!     working_directory: target/smoke
//! ```

use crate::command::{Command, ShellCommand, ShellCommandConfig, Strategy};
use crate::sequence::StepState;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceConfig {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub runner: Option<String>,
    pub steps: Vec<StepConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    #[serde(flatten)]
    pub command: ShellCommandConfig,
    #[serde(default)]
    pub strategy: Strategy,
}

impl SequenceConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: SequenceConfig =
            serde_yaml::from_str(content).context("Failed to parse sequence definition")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            bail!("Sequence '{}' has no steps", self.name);
        }
        for (index, step) in self.steps.iter().enumerate() {
            ShellCommand::new(step.command.clone())
                .with_context(|| format!("Invalid step {} in '{}'", index + 1, self.name))?;
        }
        Ok(())
    }

    /// Build the commands, numbered from 1 in file order
    pub fn build_commands(&self) -> Result<Vec<ShellCommand>> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let mut command = ShellCommand::new(step.command.clone())
                    .with_context(|| format!("Invalid step {} in '{}'", index + 1, self.name))?;
                command.set_number(index as u32 + 1);
                command.set_strategy(step.strategy);
                Ok(command)
            })
            .collect()
    }

    /// One pending snapshot per step
    pub fn pending_steps(&self) -> Vec<StepState> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                StepState::pending(
                    index as u32 + 1,
                    step.command.name.clone().unwrap_or_default(),
                    step.strategy,
                )
            })
            .collect()
    }
}

pub async fn load_sequence(path: &Path) -> Result<SequenceConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read sequence file {}", path.display()))?;
    SequenceConfig::from_yaml(&content)
        .with_context(|| format!("Invalid sequence file {}", path.display()))
}
