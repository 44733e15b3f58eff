//! CLI argument parsing using clap derive macros.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// aq - run filtered AQL queries against ArangoDB
#[derive(Parser, Debug)]
#[command(name = "aq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (log every request with its body)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Force JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Server URL (default: from config, then http://localhost:8529)
    #[arg(long, global = true, env = "ARANGO_URL")]
    pub url: Option<String>,

    /// Database name (default: from config, then _system)
    #[arg(short, long, global = true, env = "ARANGO_DATABASE")]
    pub database: Option<String>,

    /// Username for authentication
    #[arg(short, long, global = true, env = "ARANGO_USER")]
    pub user: Option<String>,

    /// Password for authentication
    #[arg(long, global = true, env = "ARANGO_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Authentication method
    #[arg(long, global = true, value_enum)]
    pub auth: Option<AuthMethod>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a filter to AQL fragments without contacting the server
    #[command(alias = "c")]
    Compile {
        /// Filter as JSON, or a URL query string with --query-string
        filter: String,

        /// Treat the input as a URL query string carrying a `filter` parameter
        #[arg(long)]
        query_string: bool,

        /// Variable name the fragments refer to
        #[arg(long, default_value = "var")]
        var: String,
    },

    /// Run a query and print the merged result
    #[command(alias = "q")]
    Query(QueryArgs),

    /// Run a query and print each batch as it arrives
    #[command(alias = "s")]
    Stream(QueryArgs),

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Arguments shared by `query` and `stream`.
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// AQL query text
    pub aql: String,

    /// Filter JSON applied to the query results
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Bind parameter as NAME=VALUE; VALUE is parsed as JSON, else taken as a string (repeatable)
    #[arg(short, long = "bind", action = clap::ArgAction::Append)]
    pub binds: Vec<String>,

    /// Batch size requested from the server
    #[arg(long)]
    pub batch_size: Option<u32>,

    /// Enable the query result cache
    #[arg(long)]
    pub cache: bool,

    /// Variable name used when wrapping the query with a filter
    #[arg(long)]
    pub var: Option<String>,
}

/// Authentication methods
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMethod {
    None,
    Basic,
    Jwt,
}

/// Supported shells for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Configuration value
        value: String,
    },

    /// Print config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_compile_command() {
        let cli = Cli::parse_from(["aq", "compile", r#"{"limit": 3}"#, "--var", "u"]);
        if let Some(Commands::Compile {
            filter,
            query_string,
            var,
        }) = cli.command
        {
            assert_eq!(filter, r#"{"limit": 3}"#);
            assert!(!query_string);
            assert_eq!(var, "u");
        } else {
            panic!("Expected Compile command");
        }
    }

    #[test]
    fn test_query_command_with_binds() {
        let cli = Cli::parse_from([
            "aq",
            "query",
            "FOR u IN @@col RETURN u",
            "-b",
            "@col=users",
            "--bind",
            "min=18",
            "--batch-size",
            "100",
            "--cache",
        ]);
        if let Some(Commands::Query(args)) = cli.command {
            assert_eq!(args.aql, "FOR u IN @@col RETURN u");
            assert_eq!(args.binds, vec!["@col=users", "min=18"]);
            assert_eq!(args.batch_size, Some(100));
            assert!(args.cache);
        } else {
            panic!("Expected Query command");
        }
    }

    #[test]
    fn test_global_connection_flags() {
        let cli = Cli::parse_from([
            "aq",
            "stream",
            "RETURN 1",
            "--url",
            "http://db:8529",
            "-d",
            "shop",
            "--auth",
            "jwt",
        ]);
        assert_eq!(cli.url.as_deref(), Some("http://db:8529"));
        assert_eq!(cli.database.as_deref(), Some("shop"));
        assert_eq!(cli.auth, Some(AuthMethod::Jwt));
        assert!(matches!(cli.command, Some(Commands::Stream(_))));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["aq", "-q", "-v", "config"]).is_err());
    }

    #[test]
    fn test_config_set() {
        let cli = Cli::parse_from(["aq", "config", "set", "query.batch_size", "500"]);
        if let Some(Commands::Config {
            command: Some(ConfigCommands::Set { key, value }),
        }) = cli.command
        {
            assert_eq!(key, "query.batch_size");
            assert_eq!(value, "500");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn test_completions() {
        let cli = Cli::parse_from(["aq", "completions", "zsh"]);
        if let Some(Commands::Completions { shell }) = cli.command {
            assert!(matches!(shell, Shell::Zsh));
        } else {
            panic!("Expected Completions command");
        }
    }
}
