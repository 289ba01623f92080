//! Configuration management
//!
//! This module handles loading and parsing configuration for Fitlog.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Token configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Account created at startup when missing
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/fitlog.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Access/refresh token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign tokens
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token lifetime in minutes
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: i64,
    /// Refresh token lifetime in days
    #[serde(default = "default_refresh_token_days")]
    pub refresh_token_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            access_token_minutes: default_access_token_minutes(),
            refresh_token_days: default_refresh_token_days(),
        }
    }
}

/// Longest accepted access token lifetime (one year)
pub const MAX_ACCESS_TOKEN_MINUTES: i64 = 365 * 24 * 60;

/// Longest accepted refresh token lifetime (ten years)
pub const MAX_REFRESH_TOKEN_DAYS: i64 = 3650;

/// Development-only secret; deployments set `FITLOG_AUTH_JWT_SECRET`.
pub const DEFAULT_JWT_SECRET: &str = "fitlog-insecure-development-secret";

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_access_token_minutes() -> i64 {
    5
}

fn default_refresh_token_days() -> i64 {
    1
}

/// Bootstrap account settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl BootstrapConfig {
    /// Username and password are both required; email is optional.
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some((username, self.email.as_deref().unwrap_or(""), password))
            }
            _ => None,
        }
    }
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - FITLOG_SERVER_HOST / FITLOG_SERVER_PORT / FITLOG_SERVER_CORS_ORIGIN
    /// - FITLOG_DATABASE_DRIVER / FITLOG_DATABASE_URL
    /// - FITLOG_AUTH_JWT_SECRET / FITLOG_AUTH_ACCESS_TOKEN_MINUTES / FITLOG_AUTH_REFRESH_TOKEN_DAYS
    /// - FITLOG_BOOTSTRAP_USERNAME / FITLOG_BOOTSTRAP_EMAIL / FITLOG_BOOTSTRAP_PASSWORD
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.jwt_secret cannot be empty".to_string(),
            ));
        }
        if self.auth.access_token_minutes <= 0 || self.auth.refresh_token_days <= 0 {
            return Err(ConfigError::ValidationError(
                "token lifetimes must be positive".to_string(),
            ));
        }
        if self.auth.access_token_minutes > MAX_ACCESS_TOKEN_MINUTES {
            return Err(ConfigError::ValidationError(format!(
                "auth.access_token_minutes cannot exceed {}",
                MAX_ACCESS_TOKEN_MINUTES
            )));
        }
        if self.auth.refresh_token_days > MAX_REFRESH_TOKEN_DAYS {
            return Err(ConfigError::ValidationError(format!(
                "auth.refresh_token_days cannot exceed {}",
                MAX_REFRESH_TOKEN_DAYS
            )));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("FITLOG_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("FITLOG_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("FITLOG_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(driver) = std::env::var("FITLOG_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("FITLOG_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(secret) = std::env::var("FITLOG_AUTH_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(minutes) = std::env::var("FITLOG_AUTH_ACCESS_TOKEN_MINUTES") {
            if let Ok(minutes) = minutes.parse::<i64>() {
                self.auth.access_token_minutes = minutes;
            }
        }
        if let Ok(days) = std::env::var("FITLOG_AUTH_REFRESH_TOKEN_DAYS") {
            if let Ok(days) = days.parse::<i64>() {
                self.auth.refresh_token_days = days;
            }
        }

        if let Ok(username) = std::env::var("FITLOG_BOOTSTRAP_USERNAME") {
            self.bootstrap.username = Some(username);
        }
        if let Ok(email) = std::env::var("FITLOG_BOOTSTRAP_EMAIL") {
            self.bootstrap.email = Some(email);
        }
        if let Ok(password) = std::env::var("FITLOG_BOOTSTRAP_PASSWORD") {
            self.bootstrap.password = Some(password);
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by every test that touches FITLOG_* variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "FITLOG_SERVER_HOST",
    "FITLOG_SERVER_PORT",
    "FITLOG_SERVER_CORS_ORIGIN",
    "FITLOG_DATABASE_DRIVER",
    "FITLOG_DATABASE_URL",
    "FITLOG_AUTH_JWT_SECRET",
    "FITLOG_AUTH_ACCESS_TOKEN_MINUTES",
    "FITLOG_AUTH_REFRESH_TOKEN_DAYS",
    "FITLOG_BOOTSTRAP_USERNAME",
    "FITLOG_BOOTSTRAP_EMAIL",
    "FITLOG_BOOTSTRAP_PASSWORD",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn valid_config_strategy() -> impl Strategy<Value = Config> {
        (
            "[a-z0-9.]{1,20}",
            1u16..=65535,
            prop_oneof![Just(DatabaseDriver::Sqlite), Just(DatabaseDriver::Mysql)],
            "[a-z0-9/._]{1,30}",
            "[A-Za-z0-9]{8,40}",
            1i64..=1440,
            1i64..=90,
        )
            .prop_map(|(host, port, driver, url, secret, minutes, days)| Config {
                server: ServerConfig {
                    host,
                    port,
                    cors_origin: default_cors_origin(),
                },
                database: DatabaseConfig { driver, url },
                auth: AuthConfig {
                    jwt_secret: secret,
                    access_token_minutes: minutes,
                    refresh_token_days: days,
                },
                bootstrap: BootstrapConfig::default(),
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn config_survives_yaml_roundtrip(config in valid_config_strategy()) {
            let yaml = serde_yaml::to_string(&config).expect("Failed to serialize config");

            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "{}", yaml).expect("Failed to write config");

            let parsed = Config::load(file.path()).expect("Failed to parse config");

            prop_assert_eq!(config.server.host, parsed.server.host);
            prop_assert_eq!(config.server.port, parsed.server.port);
            prop_assert_eq!(config.database.driver, parsed.database.driver);
            prop_assert_eq!(config.database.url, parsed.database.url);
            prop_assert_eq!(config.auth.jwt_secret, parsed.auth.jwt_secret);
            prop_assert_eq!(config.auth.access_token_minutes, parsed.auth.access_token_minutes);
            prop_assert_eq!(config.auth.refresh_token_days, parsed.auth.refresh_token_days);
        }
    }
}
