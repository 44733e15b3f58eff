//! Command dispatch module for routing CLI commands to their handlers.

use crate::cli::{Cli, Commands, ConfigCommands, QueryArgs, Shell};
use crate::commands::compile::CompileOptions;
use crate::commands::connection::ConnectionSettings;
use crate::commands::{self, CommandContext, CommandError, Result};

/// Trait for commands that never contact the server.
#[allow(async_fn_in_trait)]
pub trait LocalCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// Trait for commands that need a database connection.
#[allow(async_fn_in_trait)]
pub trait ConnectedCommand {
    async fn execute(&self, ctx: &CommandContext, settings: &ConnectionSettings) -> Result<()>;
}

/// Commands that don't need a connection.
pub enum LocalDispatch<'a> {
    Config(&'a Option<ConfigCommands>),
    Completions(&'a Shell),
    Compile {
        filter: &'a str,
        query_string: bool,
        var: &'a str,
    },
    Help,
}

impl<'a> LocalDispatch<'a> {
    /// Returns None if the command needs a connection.
    pub fn try_from_cli(cli: &'a Cli) -> Option<Self> {
        match &cli.command {
            Some(Commands::Config { command }) => Some(Self::Config(command)),
            Some(Commands::Completions { shell }) => Some(Self::Completions(shell)),
            Some(Commands::Compile {
                filter,
                query_string,
                var,
            }) => Some(Self::Compile {
                filter,
                query_string: *query_string,
                var,
            }),
            None => Some(Self::Help),
            Some(Commands::Query(_) | Commands::Stream(_)) => None,
        }
    }
}

impl LocalCommand for LocalDispatch<'_> {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Self::Config(command) => dispatch_config(ctx, command),
            Self::Completions(shell) => commands::completions::execute(shell).map_err(CommandError::Io),
            Self::Compile {
                filter,
                query_string,
                var,
            } => {
                let opts = CompileOptions {
                    input: filter.to_string(),
                    query_string: *query_string,
                    var: var.to_string(),
                };
                commands::compile::execute(ctx, &opts).await
            }
            Self::Help => {
                if !ctx.quiet {
                    println!("aq - filtered AQL queries for ArangoDB");
                    println!("Use --help for usage information");
                }
                Ok(())
            }
        }
    }
}

/// Dispatch config subcommands.
fn dispatch_config(ctx: &CommandContext, command: &Option<ConfigCommands>) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::execute_show(ctx),
        Some(ConfigCommands::Set { key, value }) => {
            let opts = commands::config::ConfigSetOptions {
                key: key.clone(),
                value: value.clone(),
            };
            commands::config::execute_set(ctx, &opts)
        }
        Some(ConfigCommands::Path) => commands::config::execute_path(ctx),
    }
}

/// Commands that run against the server.
pub enum ConnectedDispatch<'a> {
    Query(&'a QueryArgs),
    Stream(&'a QueryArgs),
}

impl<'a> ConnectedDispatch<'a> {
    pub fn from_cli(cli: &'a Cli) -> Option<Self> {
        match &cli.command {
            Some(Commands::Query(args)) => Some(Self::Query(args)),
            Some(Commands::Stream(args)) => Some(Self::Stream(args)),
            _ => None,
        }
    }
}

impl ConnectedCommand for ConnectedDispatch<'_> {
    async fn execute(&self, ctx: &CommandContext, settings: &ConnectionSettings) -> Result<()> {
        let args = match self {
            Self::Query(args) | Self::Stream(args) => args,
        };
        // Filter and bind errors surface before any network traffic.
        let query = commands::query::build_query(args, settings)?;
        let db = settings.connect().await?;

        match self {
            Self::Query(_) => commands::query::execute_query(ctx, &db, &query).await,
            Self::Stream(_) => commands::query::execute_stream(ctx, &db, &query).await,
        }
    }
}
