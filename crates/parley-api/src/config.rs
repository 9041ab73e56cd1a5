use config::{Config as ConfigLoader, ConfigError, Environment, File};
use parley::{DedupPolicy, MessagePolicy, PageRequest};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub storage: StorageConfig,
    pub mongodb: MongoDbConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub threads: ThreadsConfig,
    #[serde(default)]
    pub messages: MessagePolicy,
    #[serde(default)]
    pub pagination: PaginationConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Mongodb,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Usernames created at startup (memory backend only)
    #[serde(default)]
    pub seed_users: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoDbConfig {
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub enabled: bool,
    #[serde(default)]
    pub jwt_secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("enabled", &self.enabled)
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadsConfig {
    #[serde(default)]
    pub dedup: DedupPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: PageRequest::DEFAULT_LIMIT,
            max_limit: PageRequest::MAX_LIMIT,
        }
    }
}

impl PaginationConfig {
    pub fn page(&self, limit: Option<u64>, offset: Option<u64>) -> PageRequest {
        PageRequest::bounded(limit, offset, self.default_limit, self.max_limit)
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set, defaults to `dev`)
    /// 3. Environment variables prefixed with `PARLEY_`, sections split by
    ///    `__` (e.g. `PARLEY_SERVER__PORT=9000`)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("PARLEY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;
        cfg.load_secrets()?;
        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Secrets never live in TOML; they are only required by the features
    /// that use them.
    fn load_secrets(&mut self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::Mongodb {
            self.mongodb_uri = std::env::var("MONGODB_URI").map_err(|_| {
                ConfigError::Message("MONGODB_URI environment variable is required".to_string())
            })?;
        }
        if self.auth.enabled {
            self.auth.jwt_secret = std::env::var("AUTH_JWT_SECRET").map_err(|_| {
                ConfigError::Message("AUTH_JWT_SECRET environment variable is required".to_string())
            })?;
        }
        Ok(())
    }
}
