//! Config command implementation.
//!
//! Config file is located at ~/.config/aq/config.toml.

use std::env;
use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Minimum secret length to apply masking (show first and last N characters).
const SECRET_MASK_MIN_LENGTH: usize = 8;

/// Number of characters to show at start/end of a masked secret.
const SECRET_MASK_VISIBLE_CHARS: usize = 2;

const AUTH_VALUES: [&str; 3] = ["none", "basic", "jwt"];
const VERBOSITY_VALUES: [&str; 2] = ["summary", "debug"];

/// Configuration file structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password (can also use ARANGO_PASSWORD env var instead).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Authentication method: "none", "basic" or "jwt".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            url: None,
            database: None,
            username: None,
            password: None,
            auth: None,
            query: QueryConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Query defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub var_name: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// "summary" or "debug".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<String>,
}

/// Gets the config file path.
///
/// `AQ_CONFIG` wins, then `$XDG_CONFIG_HOME/aq`, then `~/.config/aq`.
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var("AQ_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("aq").join("config.toml"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("aq").join("config.toml"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Loads the configuration from disk. A missing file yields the defaults.
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;

    migrate_config(config)
}

/// Migrates config to current version if needed.
fn migrate_config(mut config: Config) -> Result<Config> {
    if config.version > CONFIG_VERSION {
        return Err(CommandError::Config(format!(
            "Config version {} is newer than supported version {}",
            config.version, CONFIG_VERSION
        )));
    }

    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Saves the configuration to disk.
fn save_config(config: &Config) -> Result<()> {
    let path = get_config_path()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CommandError::Config(format!("Failed to create config directory: {}", e)))?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| CommandError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(&path, content)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let mut config = load_config()?;
    let path = get_config_path()?;
    config.password = config.password.as_deref().map(mask_secret);

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }
    if ctx.quiet {
        return Ok(());
    }

    use owo_colors::OwoColorize;

    let header = "Configuration";
    if ctx.use_colors {
        println!("{}\n", header.green().bold());
    } else {
        println!("{}\n", header);
    }

    println!("File: {}", path.display());
    println!("Exists: {}\n", path.exists());

    if !path.exists() {
        println!("(No config file exists. Run 'aq config set <key> <value>' to create one.)");
        return Ok(());
    }

    println!("Settings:");
    let top_level = [
        ("url", &config.url),
        ("database", &config.database),
        ("username", &config.username),
        ("password", &config.password),
        ("auth", &config.auth),
    ];
    for (key, value) in top_level {
        if let Some(value) = value {
            println!("  {}: {}", key, value);
        }
    }

    println!("\n[query]");
    if let Some(batch_size) = config.query.batch_size {
        println!("  batch_size: {}", batch_size);
    }
    if let Some(ref var_name) = config.query.var_name {
        println!("  var_name: {}", var_name);
    }

    println!("\n[log]");
    if let Some(ref verbosity) = config.log.verbosity {
        println!("  verbosity: {}", verbosity);
    }

    Ok(())
}

/// Options for the config set command.
pub struct ConfigSetOptions {
    /// Configuration key, e.g. `url` or `query.batch_size`.
    pub key: String,
    /// Configuration value.
    pub value: String,
}

fn one_of(key: &str, value: &str, valid: &[&str]) -> Result<String> {
    let lowered = value.to_lowercase();
    if valid.contains(&lowered.as_str()) {
        Ok(lowered)
    } else {
        Err(CommandError::Config(format!(
            "Invalid {} value '{}'. Valid values: {}",
            key,
            value,
            valid.join(", ")
        )))
    }
}

/// Applies `key = value` to `config`.
pub fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "url" => config.url = Some(value.trim_end_matches('/').to_string()),
        "database" => config.database = Some(value.to_string()),
        "username" => config.username = Some(value.to_string()),
        "password" => config.password = Some(value.to_string()),
        "auth" => config.auth = Some(one_of(key, value, &AUTH_VALUES)?),
        "query.batch_size" => {
            let batch_size = value.parse::<u32>().ok().filter(|n| *n > 0).ok_or_else(|| {
                CommandError::Config(format!(
                    "Invalid batch_size value '{}'. Use a positive integer",
                    value
                ))
            })?;
            config.query.batch_size = Some(batch_size);
        }
        "query.var_name" => config.query.var_name = Some(value.to_string()),
        "log.verbosity" => config.log.verbosity = Some(one_of(key, value, &VERBOSITY_VALUES)?),
        _ => {
            return Err(CommandError::Config(format!(
                "Unknown config key '{}'. Valid keys: url, database, username, password, auth, query.batch_size, query.var_name, log.verbosity",
                key
            )));
        }
    }
    Ok(())
}

/// Executes the config set command.
pub fn execute_set(ctx: &CommandContext, opts: &ConfigSetOptions) -> Result<()> {
    let mut config = load_config()?;
    let path = get_config_path()?;

    apply_setting(&mut config, &opts.key, &opts.value)?;
    save_config(&config)?;

    let shown = if opts.key == "password" {
        mask_secret(&opts.value)
    } else {
        opts.value.clone()
    };

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "key": opts.key,
            "value": shown,
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Set {} = {}", opts.key, shown);
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Masks a secret for display, showing only the first and last N characters.
///
/// Uses character-based (not byte-based) indexing to safely handle
/// multi-byte UTF-8 characters.
fn mask_secret(secret: &str) -> String {
    let char_count = secret.chars().count();
    if char_count > SECRET_MASK_MIN_LENGTH {
        let prefix: String = secret.chars().take(SECRET_MASK_VISIBLE_CHARS).collect();
        let suffix: String = secret
            .chars()
            .skip(char_count - SECRET_MASK_VISIBLE_CHARS)
            .collect();
        format!("{}...{}", prefix, suffix)
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    /// Points AQ_CONFIG at a temp file for the duration of `f`.
    fn with_config_file<T>(contents: Option<&str>, f: impl FnOnce(&PathBuf) -> T) -> T {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");
        if let Some(contents) = contents {
            fs::create_dir_all(config_path.parent().unwrap()).unwrap();
            fs::write(&config_path, contents).unwrap();
        }

        let original = env::var("AQ_CONFIG").ok();
        env::set_var("AQ_CONFIG", &config_path);
        let result = f(&config_path);
        match original {
            Some(val) => env::set_var("AQ_CONFIG", val),
            None => env::remove_var("AQ_CONFIG"),
        }
        result
    }

    fn quiet_ctx() -> CommandContext {
        CommandContext {
            json_output: false,
            use_colors: false,
            quiet: true,
            verbose: false,
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.url.is_none());
        assert!(config.query.batch_size.is_none());
        assert!(config.log.verbosity.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.url = Some("http://localhost:8529".to_string());
        config.query.batch_size = Some(100);

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("version = 1"));
        assert!(toml_str.contains(r#"url = "http://localhost:8529""#));
        assert!(toml_str.contains("[query]"));
        assert!(toml_str.contains("batch_size = 100"));
        assert!(!toml_str.contains("password"));
    }

    #[test]
    #[serial]
    fn test_load_missing_config_yields_defaults() {
        let config = with_config_file(None, |_| load_config().unwrap());
        assert_eq!(config, Config::default());
    }

    #[test]
    #[serial]
    fn test_load_config_from_file() {
        let contents = r#"
url = "http://db:8529"
database = "shop"
username = "root"
auth = "jwt"

[query]
batch_size = 250
var_name = "doc"

[log]
verbosity = "debug"
"#;
        let config = with_config_file(Some(contents), |_| load_config().unwrap());
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.url.as_deref(), Some("http://db:8529"));
        assert_eq!(config.database.as_deref(), Some("shop"));
        assert_eq!(config.auth.as_deref(), Some("jwt"));
        assert_eq!(config.query.batch_size, Some(250));
        assert_eq!(config.query.var_name.as_deref(), Some("doc"));
        assert_eq!(config.log.verbosity.as_deref(), Some("debug"));
    }

    #[test]
    #[serial]
    fn test_load_rejects_malformed_file() {
        let result = with_config_file(Some("url = ["), |_| load_config());
        assert!(matches!(result, Err(CommandError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_load_rejects_future_version() {
        let result = with_config_file(Some("version = 99"), |_| load_config());
        assert!(matches!(result, Err(CommandError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_set_creates_file_and_persists() {
        let (config, path_exists) = with_config_file(None, |path| {
            let opts = ConfigSetOptions {
                key: "query.batch_size".to_string(),
                value: "64".to_string(),
            };
            execute_set(&quiet_ctx(), &opts).unwrap();
            (load_config().unwrap(), path.exists())
        });
        assert!(path_exists);
        assert_eq!(config.query.batch_size, Some(64));
    }

    #[test]
    #[serial]
    fn test_config_path_honors_override() {
        let path = with_config_file(None, |expected| {
            assert_eq!(&get_config_path().unwrap(), expected);
            get_config_path().unwrap()
        });
        assert!(path.ends_with("nested/config.toml"));
    }

    #[test]
    fn test_apply_setting_validates_values() {
        let mut config = Config::default();
        apply_setting(&mut config, "auth", "JWT").unwrap();
        assert_eq!(config.auth.as_deref(), Some("jwt"));
        apply_setting(&mut config, "url", "http://db:8529/").unwrap();
        assert_eq!(config.url.as_deref(), Some("http://db:8529"));

        assert!(apply_setting(&mut config, "auth", "kerberos").is_err());
        assert!(apply_setting(&mut config, "query.batch_size", "0").is_err());
        assert!(apply_setting(&mut config, "query.batch_size", "many").is_err());
        assert!(apply_setting(&mut config, "log.verbosity", "loud").is_err());
        assert!(apply_setting(&mut config, "token", "x").is_err());
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("short"), "****");
        assert_eq!(mask_secret("a-long-password"), "a-...rd");
    }
}
