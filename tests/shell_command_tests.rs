//! End-to-end tests for shell and callable commands against real processes

use anyhow::anyhow;
use std::time::{Duration, Instant};
use stepwise::command::{
    CallableCommand, Command, CommandStatus, ExecutionContext, ShellCommand, ShellCommandConfig,
};
use stepwise::CommandError;
use tempfile::TempDir;

fn shell(dir: &TempDir, command: &str) -> ShellCommandConfig {
    ShellCommandConfig::new(command).with_working_directory(dir.path())
}

#[test]
fn test_missing_command_fails_construction() {
    let config: ShellCommandConfig = serde_yaml::from_str("name: nameless").unwrap();
    assert_eq!(
        ShellCommand::new(config).unwrap_err(),
        CommandError::MissingCommand
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_zero_exit_is_success() {
    let dir = TempDir::new().unwrap();
    let mut command = ShellCommand::new(shell(&dir, "echo hello").with_name("greet")).unwrap();

    assert_eq!(command.run(None).await, CommandStatus::Success);
    assert_eq!(command.output(), "hello\n");
    assert_eq!(command.error(), "");
    assert!(command.exec_time() > Duration::ZERO);
    assert!(command.is_success());
}

#[cfg(unix)]
#[tokio::test]
async fn test_non_zero_exit_is_error() {
    let dir = TempDir::new().unwrap();
    let mut command =
        ShellCommand::new(shell(&dir, "echo out; echo bad >&2; exit 2")).unwrap();

    assert_eq!(command.run(None).await, CommandStatus::Error);
    assert_eq!(command.output(), "out\n");
    assert_eq!(command.error(), "bad\n");
    assert!(command.exec_time() > Duration::ZERO);
}

#[cfg(unix)]
#[tokio::test]
async fn test_timeout_kills_and_reports_error() {
    let dir = TempDir::new().unwrap();
    let mut command = ShellCommand::new(shell(&dir, "sleep 10").with_timeout(0.5)).unwrap();

    let start = Instant::now();
    assert_eq!(command.run(None).await, CommandStatus::Error);

    assert!(command.error().contains("timed out"), "{}", command.error());
    assert!(command.exec_time() >= Duration::from_millis(500));
    assert!(command.exec_time() < Duration::from_secs(5));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[cfg(unix)]
#[tokio::test]
async fn test_timeout_not_reached() {
    let dir = TempDir::new().unwrap();
    let mut command = ShellCommand::new(shell(&dir, "echo fast").with_timeout(5.0)).unwrap();

    assert_eq!(command.run(None).await, CommandStatus::Success);
    assert_eq!(command.output(), "fast\n");
    assert!(command.exec_time() < Duration::from_secs(5));
}

#[cfg(unix)]
#[tokio::test]
async fn test_working_directory_is_created() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");
    let mut command = ShellCommand::new(
        ShellCommandConfig::new("touch created.txt").with_working_directory(&nested),
    )
    .unwrap();

    assert_eq!(command.run(None).await, CommandStatus::Success);
    assert!(nested.join("created.txt").exists());

    // Already existing is fine
    assert_eq!(command.run(None).await, CommandStatus::Success);
}

#[cfg(unix)]
#[tokio::test]
async fn test_uncreatable_working_directory_is_error() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("plain-file");
    std::fs::write(&file, "").unwrap();

    let mut command = ShellCommand::new(
        ShellCommandConfig::new("true").with_working_directory(file.join("sub")),
    )
    .unwrap();

    assert_eq!(command.run(None).await, CommandStatus::Error);
    assert!(command.error().contains("Failed to create working directory"));
    assert!(command.exec_time() > Duration::ZERO);
}

#[cfg(unix)]
#[tokio::test]
async fn test_self_signal_is_warning() {
    let dir = TempDir::new().unwrap();
    let mut command = ShellCommand::new(shell(&dir, "kill -TERM $$")).unwrap();

    assert_eq!(command.run(None).await, CommandStatus::Warning);
}

#[cfg(unix)]
#[tokio::test]
async fn test_reset_after_run() {
    let dir = TempDir::new().unwrap();
    let mut command = ShellCommand::new(shell(&dir, "echo x; exit 1")).unwrap();
    command.run(None).await;
    assert!(command.is_executed());

    command.reset();
    command.reset();

    assert_eq!(command.status(), CommandStatus::NotExecuted);
    assert_eq!(command.output(), "");
    assert_eq!(command.error(), "");
    assert_eq!(command.exec_time(), Duration::ZERO);
    assert!(!command.is_executed());
}

#[tokio::test]
async fn test_callable_error_sets_backtrace() {
    let mut command = CallableCommand::new("raise", |_| Err(anyhow!("something broke")));
    let context = ExecutionContext::new().with_debug(true);

    assert_eq!(command.run(Some(&context)).await, CommandStatus::Error);
    assert!(command.error().contains("something broke"));
    assert!(!command.backtrace().is_empty());
    assert!(command.context().is_none());
}

#[tokio::test]
async fn test_commands_as_trait_objects() {
    let mut commands: Vec<Box<dyn Command>> = vec![
        Box::new(CallableCommand::new("ok", |cmd| {
            cmd.set_output("fine");
            Ok(())
        })),
        Box::new(CallableCommand::new("bad", |_| Err(anyhow!("no")))),
    ];

    let mut results = Vec::new();
    for command in commands.iter_mut() {
        results.push(command.run(None).await);
    }

    assert_eq!(results, vec![CommandStatus::Success, CommandStatus::Error]);
}
