//! Configuration management for the Cloud Library server

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the individual parts
    #[serde(default)]
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    /// Connection URL for the Postgres pool
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            ),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// HMAC signing secret. Empty means tokens can be neither issued nor verified.
    #[serde(default)]
    pub jwt_secret: String,
    pub jwt_expiration_minutes: i64,
}

/// Longest accepted token lifetime (one year)
const MAX_JWT_EXPIRATION_MINUTES: i64 = 60 * 24 * 365;

impl AuthConfig {
    /// Token lifetime, or `None` when the configured minutes are out of range
    pub fn token_lifetime(&self) -> Option<chrono::Duration> {
        if !(1..=MAX_JWT_EXPIRATION_MINUTES).contains(&self.jwt_expiration_minutes) {
            return None;
        }
        chrono::Duration::try_minutes(self.jwt_expiration_minutes)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding `<book-id>.pdf` files
    pub books_path: PathBuf,
}

/// Access policy for the endpoints whose gating is a deployment choice
#[derive(Debug, Deserialize, Clone)]
pub struct AccessConfig {
    /// Allow anonymous callers to list books
    pub public_book_list: bool,
    /// Allow anonymous callers to register reader accounts
    pub open_registration: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct UsersConfig {
    pub bootstrap_admin_username: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub users: UsersConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // e.g. LIBRARY_SERVER__PORT=9000
            .add_source(
                Environment::with_prefix("LIBRARY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("auth.jwt_secret", env::var("JWT_SECRET").ok())?
            .set_override_option("storage.books_path", env::var("BOOKS_STORAGE_PATH").ok())?
            .build()?;

        let config: Self = config.try_deserialize()?;
        if config.auth.token_lifetime().is_none() {
            return Err(ConfigError::Message(format!(
                "auth.jwt_expiration_minutes must be between 1 and {}, got {}",
                MAX_JWT_EXPIRATION_MINUTES, config.auth.jwt_expiration_minutes
            )));
        }
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            name: "library".to_string(),
            user: "library".to_string(),
            password: "library".to_string(),
            max_connections: 10,
            min_connections: 2,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expiration_minutes: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            books_path: PathBuf::from("./data/books"),
        }
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            public_book_list: false,
            open_registration: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            storage: StorageConfig::default(),
            access: AccessConfig::default(),
            users: UsersConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
