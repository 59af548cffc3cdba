use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "bookmark.toml";

/// Browser-like user agent; many sites refuse to serve obvious bots
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; CrOS x86_64 8172.45.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/51.0.2704.64 Safari/537.36";

/// Environment variables that override file settings
pub const ENV_PORT: &str = "BOOKMARK_PORT";
pub const ENV_FRONTEND_PATH: &str = "BOOKMARK_FRONTEND_PATH";
pub const ENV_DB_FILE: &str = "BOOKMARK_DB_FILE";
pub const ENV_USER_AGENT: &str = "BOOKMARK_USER_AGENT";

/// Older names still honoured when the `BOOKMARK_*` variable is unset
pub const LEGACY_ENV_PORT: &str = "BOOKMARKSERVER_PORT";
pub const LEGACY_ENV_FRONTEND_PATH: &str = "BOOKMARKSERVER_FRONTENDPATH";
pub const LEGACY_ENV_DB_FILE: &str = "BOOKMARKSERVER_DBFILE";

/// First of `keys` that is set, with the name it was found under
fn lookup_any<'k>(lookup: &impl Fn(&str) -> Option<String>, keys: &[&'k str]) -> Option<(&'k str, String)> {
    keys.iter().find_map(|key| lookup(key).map(|value| (*key, value)))
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// TCP port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the built frontend (index.html, assets/, static/)
    #[serde(default = "default_frontend_path")]
    pub frontend_path: PathBuf,
}

fn default_port() -> u16 {
    9000
}

fn default_frontend_path() -> PathBuf {
    PathBuf::from("frontend/dist")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port(), frontend_path: default_frontend_path() }
    }
}

/// Bookmark database settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite database file, created on first start
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/bookmark.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

/// Page fetcher settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetcherConfig {
    /// User-Agent header sent with every page request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self { user_agent: default_user_agent(), timeout_secs: default_timeout_secs() }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive for stderr output
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Stderr format: pretty, json or compact
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Rolling file output
    #[serde(default)]
    pub file: FileLoggingConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: default_log_format(), file: FileLoggingConfig::default() }
    }
}

/// `[logging.file]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileLoggingConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Directory for the daily log files
    #[serde(default = "default_log_dir")]
    pub directory: PathBuf,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self { enabled: false, directory: default_log_dir() }
    }
}

/// Root configuration, built once at startup and handed to each component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub fetcher: FetcherConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(toml_str).map_err(|e| crate::Error::Config(ConfigError::from(e).to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Resolve the startup configuration.
    ///
    /// Reads `path` when given, otherwise `bookmark.toml` in the working directory if present,
    /// otherwise the defaults; then applies the `BOOKMARK_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides looked up by environment variable name
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some((key, port)) = lookup_any(&lookup, &[ENV_PORT, LEGACY_ENV_PORT]) {
            self.server.port = port.trim().parse().map_err(|_| {
                let err = ConfigError::InvalidValue { key: key.to_string(), value: port.clone() };
                crate::Error::Config(err.to_string())
            })?;
        }

        if let Some((_, frontend_path)) = lookup_any(&lookup, &[ENV_FRONTEND_PATH, LEGACY_ENV_FRONTEND_PATH]) {
            self.server.frontend_path = PathBuf::from(frontend_path);
        }

        if let Some((_, db_file)) = lookup_any(&lookup, &[ENV_DB_FILE, LEGACY_ENV_DB_FILE]) {
            self.database.path = PathBuf::from(db_file);
        }

        if let Some(user_agent) = lookup(ENV_USER_AGENT) {
            self.fetcher.user_agent = user_agent;
        }

        self.validate()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        use crate::Error;

        if self.server.port == 0 {
            return Err(Error::Config(ConfigError::InvalidPort.to_string()));
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(Error::Config(ConfigError::EmptyPath("database.path".to_string()).to_string()));
        }

        if self.fetcher.timeout_secs == 0 {
            return Err(Error::Config(ConfigError::InvalidTimeout.to_string()));
        }

        Ok(())
    }

    /// Get example configuration (as a string)
    pub fn example() -> &'static str {
        r#"# Bookmark server configuration

[server]
# TCP port for the HTTP API and frontend
port = 9000
# Directory with the built frontend (index.html, assets/, static/)
frontend_path = "frontend/dist"

[database]
# SQLite database file; created and migrated on startup
path = "data/bookmark.db"

[fetcher]
# timeout for fetching a page title, in seconds
timeout_secs = 15
# user_agent = "Mozilla/5.0 ..."

[logging]
# Filter directive, overridden by BOOKMARK_LOG or RUST_LOG
level = "info"
# pretty, json or compact
format = "pretty"

[logging.file]
enabled = false
directory = "logs"
"#
    }
}

/// Configuration-specific errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Port zero cannot be listened on
    #[error("server.port must be non-zero")]
    InvalidPort,

    /// Fetch timeout of zero seconds
    #[error("fetcher.timeout_secs must be non-zero")]
    InvalidTimeout,

    /// A required path is empty
    #[error("empty path: {0}")]
    EmptyPath(String),

    /// An override could not be parsed
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::TomlParse(err.to_string())
    }
}
