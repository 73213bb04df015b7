//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::api::ApiConfig;
use crate::storage::{StorageConfig, StoreProfile};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, for development
    #[default]
    Pretty,
    /// One JSON object per line, for production
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::Invalid(format!("unknown log format '{}'", other))),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Filter directive for tracing-subscriber's EnvFilter
    pub fn filter_directive(&self) -> String {
        format!("sensor_readings={},tower_http={}", self.level, self.level)
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("sensor-readings").join("config.toml")),
            Some(PathBuf::from("/etc/sensor-readings/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup; unparseable values are skipped
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Storage overrides
        if let Some(data_dir) = lookup("SENSOR_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }
        if let Some(profile) = lookup("SENSOR_PROFILE") {
            match profile.parse::<StoreProfile>() {
                Ok(p) => self.storage.profile = p,
                Err(e) => tracing::warn!("Ignoring SENSOR_PROFILE: {}", e),
            }
        }
        if let Some(size) = lookup("SENSOR_POOL_SIZE").and_then(|s| s.parse().ok()) {
            self.storage.pool_size = size;
        }

        // API overrides
        if let Some(host) = lookup("SENSOR_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("SENSOR_API_PORT").and_then(|s| s.parse().ok()) {
            self.api.port = port;
        }

        // Logging overrides
        if let Some(level) = lookup("SENSOR_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("SENSOR_LOG_FORMAT") {
            match format.parse::<LogFormat>() {
                Ok(f) => self.logging.format = f,
                Err(e) => tracing::warn!("Ignoring SENSOR_LOG_FORMAT: {}", e),
            }
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Sensor Readings Configuration
#
# Environment variables override these settings:
# - SENSOR_DATA_DIR
# - SENSOR_PROFILE
# - SENSOR_POOL_SIZE
# - SENSOR_API_HOST
# - SENSOR_API_PORT
# - SENSOR_LOG_LEVEL
# - SENSOR_LOG_FORMAT

[storage]
# Directory holding the SQLite database files
data_dir = "./sensor_data"

# production -> database.db, testing -> test_database.db
profile = "production"

# Number of pooled database connections
pool_size = 4

# How long a request waits for a free connection (ms)
acquire_timeout_ms = 5000

# How long SQLite retries while the database is locked (ms)
busy_timeout_ms = 5000

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 5000

# Request timeout in seconds
request_timeout_secs = 30

# Maximum request body size in bytes
max_body_size = 65536

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_parses() {
        let config = Config::from_toml(&generate_default_config()).unwrap();
        assert_eq!(config.storage.profile, StoreProfile::Production);
        assert_eq!(config.storage.pool_size, 4);
        assert_eq!(config.api.port, 5000);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [storage]
            data_dir = "/tmp/sensors"
            profile = "testing"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.storage.database_path(),
            PathBuf::from("/tmp/sensors/test_database.db")
        );
        assert_eq!(config.storage.pool_size, 4);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml("[storage\nprofile = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let err = Config::from_toml("[storage]\nprofile = \"staging\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nport = 9000\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.port, 9000);

        let missing = Config::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SENSOR_DATA_DIR", "/var/lib/sensors"),
            ("SENSOR_PROFILE", "testing"),
            ("SENSOR_POOL_SIZE", "8"),
            ("SENSOR_API_PORT", "not-a-port"),
            ("SENSOR_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/sensors"));
        assert_eq!(config.storage.profile, StoreProfile::Testing);
        assert_eq!(config.storage.pool_size, 8);
        assert_eq!(config.api.port, 5000);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_filter_directive() {
        let logging = LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Json,
        };
        assert_eq!(
            logging.filter_directive(),
            "sensor_readings=debug,tower_http=debug"
        );
    }
}
