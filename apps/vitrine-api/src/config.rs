//! API server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//! Upstream and schedule settings live in the sync config
//! ([`vitrine_sync::SyncConfig`]).

use std::env;
use std::path::PathBuf;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, multi-line.
    #[default]
    Pretty,

    /// One JSON object per line.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidValue("LOG_FORMAT".to_string())),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// HTTP bind address
    pub bind_addr: String,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Key expected in the `X-API-KEY` header of tool calls.
    /// When unset, every tool call is refused.
    pub server_api_key: Option<String>,

    /// Run the background sync scheduler
    pub sync_enabled: bool,

    pub log_format: LogFormat,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from `lookup`, keyed by env var name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ApiConfig {
            http_port: lookup("HTTP_PORT")
                .unwrap_or_else(|| "8000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            bind_addr: lookup("HTTP_BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),

            database_path: lookup("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./vitrine.db")),

            server_api_key: lookup("SERVER_API_KEY").filter(|key| !key.is_empty()),

            sync_enabled: match lookup("SYNC_ENABLED") {
                None => true,
                Some(value) => parse_bool(&value)
                    .ok_or_else(|| ConfigError::InvalidValue("SYNC_ENABLED".to_string()))?,
            },

            log_format: match lookup("LOG_FORMAT") {
                None => LogFormat::default(),
                Some(value) => value.parse()?,
            },
        };

        if config.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("DATABASE_PATH".to_string()));
        }

        Ok(config)
    }

    /// Full listen address.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.http_port)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        ApiConfig::from_lookup(|key| map.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.http_port, 8000);
        assert_eq!(config.listen_address(), "0.0.0.0:8000");
        assert_eq!(config.database_path, PathBuf::from("./vitrine.db"));
        assert_eq!(config.server_api_key, None);
        assert!(config.sync_enabled);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HTTP_PORT", "9090"),
            ("SERVER_API_KEY", "secret"),
            ("SYNC_ENABLED", "false"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.http_port, 9090);
        assert_eq!(config.server_api_key.as_deref(), Some("secret"));
        assert!(!config.sync_enabled);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("HTTP_PORT", "http")]),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(load(&[("SYNC_ENABLED", "maybe")]).is_err());
        assert!(load(&[("LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn test_empty_api_key_is_unset() {
        assert_eq!(load(&[("SERVER_API_KEY", "")]).unwrap().server_api_key, None);
    }
}
