//! Resolves connection settings and builds the database handle.
//!
//! Precedence is flag > env > config file > defaults. Flags and env vars
//! arrive already merged by clap.

use arango_api_rs::client::{Database, DEFAULT_DATABASE};
use arango_api_rs::logging::LogVerbosity;

use super::config::Config;
use super::{CommandError, Result};
use crate::cli::{AuthMethod, Cli};

/// Server URL used when none is configured.
pub const DEFAULT_URL: &str = "http://localhost:8529";

/// Everything needed to talk to the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSettings {
    pub url: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub auth: AuthMethod,
    pub verbosity: LogVerbosity,
    pub batch_size: Option<u32>,
    pub var_name: Option<String>,
}

fn parse_auth(value: &str) -> Result<AuthMethod> {
    match value.to_lowercase().as_str() {
        "none" => Ok(AuthMethod::None),
        "basic" => Ok(AuthMethod::Basic),
        "jwt" => Ok(AuthMethod::Jwt),
        other => Err(CommandError::Config(format!(
            "Invalid auth value '{}'. Valid values: none, basic, jwt",
            other
        ))),
    }
}

impl ConnectionSettings {
    pub fn resolve(cli: &Cli, config: &Config) -> Result<Self> {
        let username = cli.user.clone().or_else(|| config.username.clone());
        let password = cli.password.clone().or_else(|| config.password.clone());

        let auth = match (cli.auth, config.auth.as_deref()) {
            (Some(auth), _) => auth,
            (None, Some(value)) => parse_auth(value)?,
            (None, None) if username.is_some() => AuthMethod::Basic,
            (None, None) => AuthMethod::None,
        };
        if auth != AuthMethod::None && username.is_none() {
            return Err(CommandError::Config(
                "authentication requires a username (--user, ARANGO_USER or config 'username')".to_string(),
            ));
        }

        let verbosity = if cli.verbose {
            LogVerbosity::Debug
        } else {
            match config.log.verbosity.as_deref() {
                Some(value) => value.parse()?,
                None => LogVerbosity::Summary,
            }
        };

        Ok(Self {
            url: cli
                .url
                .clone()
                .or_else(|| config.url.clone())
                .unwrap_or_else(|| DEFAULT_URL.to_string()),
            database: cli
                .database
                .clone()
                .or_else(|| config.database.clone())
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            username,
            password,
            auth,
            verbosity,
            batch_size: config.query.batch_size,
            var_name: config.query.var_name.clone(),
        })
    }

    /// Builds the handle and runs the authentication setup.
    pub async fn connect(&self) -> Result<Database> {
        let db = self.builder().build()?;
        db.connect().await?;
        tracing::debug!(url = %self.url, database = %self.database, "connected");
        Ok(db)
    }

    fn builder(&self) -> arango_api_rs::client::DatabaseBuilder {
        let builder = Database::builder(&self.url)
            .database(&self.database)
            .log_verbosity(self.verbosity);
        let username = self.username.clone().unwrap_or_default();
        let password = self.password.clone().unwrap_or_default();
        match self.auth {
            AuthMethod::None => builder,
            AuthMethod::Basic => builder.basic_auth(username, password),
            AuthMethod::Jwt => builder.jwt_auth(username, password),
        }
    }
}
