//! Usage: futures-bot [--testnet | --production] price --symbol <SYMBOL>
//!        futures-bot [--testnet | --production] balance [--non-zero]
//!        futures-bot [--testnet | --production] time

mod cli;
mod commands;
mod logging;

use std::process::ExitCode;

use clap::Parser;

use crate::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_file = (!cli.no_log_file).then_some(cli.log_file.as_path());
    let _guard = match logging::init(log_file) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e:#}");
            None
        }
    };

    let mut stdout = std::io::stdout().lock();
    match commands::run(&cli, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {e:#}");
            ExitCode::from(commands::exit_code(&e))
        }
    }
}
