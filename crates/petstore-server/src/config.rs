//! Server configuration loading from file and environment variables.

use petstore_db::DbLocation;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Environment variables of the networked-database layout. The embedded
/// store has no server to authenticate against, so these are only reported.
const IGNORED_DB_VARS: &[&str] = &["DB_USER", "DB_PASSWORD", "DB_HOST", "DB_PORT"];

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Upload and static image locations.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Explicit database URL. Takes precedence over `name` when set.
    #[serde(default)]
    pub url: Option<String>,

    /// Database name; the file `<name>.db` is used when no URL is given.
    #[serde(default = "default_db_name")]
    pub name: String,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Filesystem locations for images.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory receiving uploaded images, served at `/uploads`.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Directory of bundled images, served at `/static/images`.
    #[serde(default = "default_static_images_dir")]
    pub static_images_dir: String,

    /// `image_url` given to pets created without a usable image.
    #[serde(default = "default_image_url")]
    pub default_image_url: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "petstore_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8000
}

fn default_db_name() -> String {
    "petstore_db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_static_images_dir() -> String {
    "static/images".to_string()
}

fn default_image_url() -> String {
    "/assets/default-pet.jpg".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            name: default_db_name(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            static_images_dir: default_static_images_dir(),
            default_image_url: default_image_url(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl DatabaseConfig {
    /// Resolves where the catalog database lives.
    ///
    /// `url` wins when present and accepts `sqlite://<path>`, `sqlite:<path>`,
    /// a bare path, or `:memory:`. Without a URL the file is `<name>.db`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnsupportedDatabaseUrl` for any other URL scheme.
    pub fn location(&self) -> Result<DbLocation, ConfigError> {
        let Some(url) = self.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
            return Ok(DbLocation::File(format!("{}.db", self.name).into()));
        };

        let path = match url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
        {
            Some(path) => path,
            None if url.contains("://") => {
                return Err(ConfigError::UnsupportedDatabaseUrl(url.to_string()))
            }
            None => url,
        };

        Ok(DbLocation::from_path(path))
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The database URL names a backend other than SQLite.
    #[error("unsupported database url '{0}': only sqlite is available")]
    UnsupportedDatabaseUrl(String),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `PETSTORE_HOST` overrides `server.host`
/// - `PETSTORE_PORT` overrides `server.port`
/// - `DATABASE_URL` overrides `database.url`
/// - `DB_NAME` overrides `database.name`
/// - `PETSTORE_UPLOAD_DIR` overrides `storage.upload_dir`
/// - `PETSTORE_STATIC_IMAGES_DIR` overrides `storage.static_images_dir`
/// - `PETSTORE_LOG_LEVEL` overrides `logging.level`
/// - `PETSTORE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
}

fn apply_env_overrides(mut config: Config, var: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(host) = var("PETSTORE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("PETSTORE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(url) = var("DATABASE_URL").filter(|u| !u.trim().is_empty()) {
        config.database.url = Some(url);
    }
    if let Some(name) = var("DB_NAME") {
        config.database.name = name;
    }
    for &key in IGNORED_DB_VARS {
        if var(key).is_some() {
            tracing::warn!(
                variable = key,
                "ignored: the embedded sqlite store does not use server credentials"
            );
        }
    }
    if let Some(dir) = var("PETSTORE_UPLOAD_DIR") {
        config.storage.upload_dir = dir;
    }
    if let Some(dir) = var("PETSTORE_STATIC_IMAGES_DIR") {
        config.storage.static_images_dir = dir;
    }
    if let Some(level) = var("PETSTORE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("PETSTORE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    config
}
