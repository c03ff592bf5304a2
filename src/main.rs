//! rest-dispatch: asynchronous REST call dispatcher
//!
//! Entry point for the rest-dispatch application.

use rest_dispatch::config::{Cli, Command, ValidatedConfig, write_default_config};
use std::io::Write;
use std::process::ExitCode;

mod app;
mod run;

use app::{exit_code, print_config_hint, setup_tracing};

/// Main entry point.
///
/// Excluded from coverage as it's the thin wrapper around testable components.
#[cfg(not(tarpaulin_include))]
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Handle init subcommand
    if let Some(Command::Init { output }) = &cli.command {
        return handle_init(output);
    }

    // Load and validate configuration
    let config = match ValidatedConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            print_config_hint(&e);
            return exit_code::CONFIG_ERROR;
        }
    };

    // Setup logging and run
    setup_tracing(config.verbose);
    tracing::info!("{config}");

    run_application(config)
}

/// Handles the `init` subcommand.
fn handle_init(output: &std::path::Path) -> ExitCode {
    match write_default_config(output) {
        Ok(()) => {
            println!("Configuration template written to: {}", output.display());
            exit_code::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            exit_code::CONFIG_ERROR
        }
    }
}

/// Sends the configured call and prints the accepted response body.
///
/// Excluded from coverage - requires network access.
#[cfg(not(tarpaulin_include))]
fn run_application(config: ValidatedConfig) -> ExitCode {
    match run::execute(config) {
        Ok(response) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout
                .write_all(&response.body)
                .and_then(|()| writeln!(stdout))
            {
                tracing::error!("Failed to write response body: {e}");
                return exit_code::runtime_error();
            }
            exit_code::SUCCESS
        }
        Err(e) => {
            tracing::error!("Application error: {e}");
            exit_code::runtime_error()
        }
    }
}
