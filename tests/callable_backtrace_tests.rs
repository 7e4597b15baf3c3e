//! Backtrace capture for callables returning errors
//!
//! Kept in its own binary: std caches the backtrace setting on first use.

use anyhow::anyhow;
use stepwise::command::{CallableCommand, Command, CommandStatus};

#[tokio::test]
async fn test_returned_error_records_origin_when_backtraces_enabled() {
    std::env::set_var("RUST_LIB_BACKTRACE", "1");

    let mut command = CallableCommand::new("origin", |_| Err(anyhow!("boom")));

    assert_eq!(command.run(None).await, CommandStatus::Error);
    assert_eq!(command.error(), "boom");
    assert!(command.backtrace().starts_with("0: boom\n"));
    assert!(
        command.backtrace().contains("callable_backtrace_tests.rs:"),
        "{}",
        command.backtrace()
    );
}
