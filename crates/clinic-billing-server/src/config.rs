//! Server configuration from environment variables.

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_DB_PATH: &str = "clinic.db";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=info";

/// `CLINIC_DB_PATH` value that selects an in-memory database.
pub const IN_MEMORY_DB: &str = ":memory:";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid CLINIC_BIND_ADDR '{0}'")]
    BindAddr(String),

    #[error("Invalid CLINIC_ALLOWED_ORIGIN '{0}'")]
    AllowedOrigin(String),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub db_path: String,
    /// Single origin allowed by CORS (the web client)
    pub allowed_origin: HeaderValue,
    /// Used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys take the default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bind_addr = get("CLINIC_BIND_ADDR", DEFAULT_BIND_ADDR);
        let bind_addr = bind_addr
            .parse()
            .map_err(|_| ConfigError::BindAddr(bind_addr.clone()))?;

        let origin = get("CLINIC_ALLOWED_ORIGIN", DEFAULT_ALLOWED_ORIGIN);
        let allowed_origin =
            HeaderValue::from_str(&origin).map_err(|_| ConfigError::AllowedOrigin(origin.clone()))?;

        Ok(Self {
            bind_addr,
            db_path: get("CLINIC_DB_PATH", DEFAULT_DB_PATH),
            allowed_origin,
            log_filter: get("CLINIC_LOG_FILTER", DEFAULT_LOG_FILTER),
        })
    }

    pub fn is_in_memory(&self) -> bool {
        self.db_path == IN_MEMORY_DB
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            db_path: DEFAULT_DB_PATH.to_string(),
            allowed_origin: HeaderValue::from_static(DEFAULT_ALLOWED_ORIGIN),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.port(), 5000);
        assert_eq!(config.db_path, "clinic.db");
        assert_eq!(config.allowed_origin, "http://localhost:5173");
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert!(!config.is_in_memory());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("CLINIC_BIND_ADDR", "127.0.0.1:8080"),
            ("CLINIC_DB_PATH", ":memory:"),
            ("CLINIC_ALLOWED_ORIGIN", "https://clinic.example"),
            ("CLINIC_LOG_FILTER", "  "),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert!(config.is_in_memory());
        assert_eq!(config.allowed_origin, "https://clinic.example");
        // Blank falls back to the default
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_invalid_bind_addr() {
        let err = ServerConfig::from_lookup(lookup(&[("CLINIC_BIND_ADDR", "nowhere")])).unwrap_err();
        assert!(matches!(err, ConfigError::BindAddr(ref v) if v == "nowhere"));
    }
}
