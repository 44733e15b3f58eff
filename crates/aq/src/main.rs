use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod dispatch;

use cli::Cli;
use commands::config::load_config;
use commands::connection::ConnectionSettings;
use commands::{CommandContext, CommandError};
use dispatch::{ConnectedCommand, ConnectedDispatch, LocalCommand, LocalDispatch};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                eprintln!("{error_json:#}");
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::from(error_exit_code(&e))
        }
    }
}

/// Installs the stderr subscriber. `AQ_LOG` wins over `RUST_LOG`.
fn init_tracing(cli: &Cli) {
    let default = if cli.verbose {
        "arango=debug,aq=debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env("AQ_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .try_init();
}

async fn run(cli: &Cli) -> commands::Result<()> {
    let ctx = CommandContext::from_cli(cli);

    if let Some(dispatch) = LocalDispatch::try_from_cli(cli) {
        return dispatch.execute(&ctx).await;
    }

    let config = load_config()?;
    let settings = ConnectionSettings::resolve(cli, &config)?;

    match ConnectedDispatch::from_cli(cli) {
        Some(dispatch) => dispatch.execute(&ctx, &settings).await,
        None => Err(CommandError::InvalidArgument(format!(
            "unhandled command: {:?}",
            cli.command
        ))),
    }
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    use arango_api_rs::error::Error;

    match e {
        CommandError::Api(Error::Api(_)) => "DATABASE_ERROR",
        CommandError::Api(Error::Http(_) | Error::Transport(_) | Error::StreamInterrupted) => "TRANSPORT_ERROR",
        CommandError::Api(Error::Decode { .. }) => "DECODE_ERROR",
        CommandError::Api(Error::Filter(_)) | CommandError::Filter(_) => "FILTER_ERROR",
        CommandError::Api(Error::Canceled) => "CANCELED",
        CommandError::Api(Error::EmptyQuery) | CommandError::InvalidArgument(_) => "INVALID_ARGUMENT",
        CommandError::Api(Error::Config(_)) | CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the exit code for an error.
fn error_exit_code(e: &CommandError) -> u8 {
    match e {
        CommandError::Api(err) => u8::try_from(err.exit_code()).unwrap_or(1),
        CommandError::Filter(_) => 1,
        CommandError::InvalidArgument(_) => 1,
        CommandError::Json(_) => 1,
        CommandError::Io(_) => 3,
        CommandError::Config(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arango_api_rs::error::{ApiError, Error};

    #[test]
    fn test_error_codes() {
        let db_err = CommandError::Api(Error::Api(ApiError::new("boom").with_status_code(500)));
        assert_eq!(error_code(&db_err), "DATABASE_ERROR");
        assert_eq!(error_exit_code(&db_err), 2);

        let canceled = CommandError::Api(Error::Canceled);
        assert_eq!(error_code(&canceled), "CANCELED");
        assert_eq!(error_exit_code(&canceled), 4);

        let config = CommandError::Config("bad".to_string());
        assert_eq!(error_code(&config), "CONFIG_ERROR");
        assert_eq!(error_exit_code(&config), 5);
    }

    #[test]
    fn test_filter_errors_exit_with_one() {
        let err = CommandError::Filter(arango_filter_rs::FilterError::forbidden_keyword("INSERT"));
        assert_eq!(error_code(&err), "FILTER_ERROR");
        assert_eq!(error_exit_code(&err), 1);

        let err = CommandError::Api(Error::Filter(arango_filter_rs::FilterError::forbidden_keyword("INSERT")));
        assert_eq!(error_code(&err), "FILTER_ERROR");
        assert_eq!(error_exit_code(&err), 1);
    }
}
