use clap::Parser;
use stepwise::app::{handle_fatal_error, init_logging, AppConfig};
use stepwise::cli::{execute_command, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = AppConfig::new(cli.verbose).with_log_mode(cli.log_mode);
    init_logging(&config);

    match execute_command(cli.command).await {
        Ok(code) => std::process::exit(code),
        Err(e) => handle_fatal_error(e, cli.verbose),
    }
}
