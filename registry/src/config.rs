//! TOML configuration for the server binary.

use std::net::SocketAddr;
use std::path::Path;

use record_store::StoreConfig;
use serde::Deserialize;

/// Error loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this schema.
    #[error("parse config file: {0}")]
    Parse(#[from] toml_edit::de::Error),
}

/// Top-level server configuration.
///
/// ```toml
/// [store.local]
/// path = "/var/lib/terraform-registry"
///
/// [server]
/// bind = "127.0.0.1:8080"
/// base-path = "/v1"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// The record store backend.
    pub store: StoreConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ServerConfig {
    /// The address to listen on.
    pub bind: SocketAddr,

    /// The base path the module API is mounted under.
    pub base_path: String,

    /// An absolute URL to advertise in the discovery document instead of
    /// the base path. Production deployments behind a proxy should set
    /// this to the public `https` URL.
    pub advertise: Option<String>,

    /// Default and maximum page size for list responses.
    pub page_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            base_path: "/v1".to_string(),
            advertise: None,
            page_limit: 1000,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml_edit::de::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_local_store_config() {
        let config: Config = toml_edit::de::from_str(
            r#"
            [store.local]
            path = "/var/lib/terraform-registry"

            [server]
            bind = "0.0.0.0:9000"
            base-path = "/registry/v1"
            advertise = "https://registry.example.com/registry/v1"
            page-limit = 100
            "#,
        )
        .unwrap();

        assert!(matches!(config.store, StoreConfig::Local { .. }));
        assert_eq!(config.server.bind.port(), 9000);
        assert_eq!(config.server.base_path, "/registry/v1");
        assert_eq!(config.server.page_limit, 100);
    }

    #[test]
    fn memory_store_with_default_server() {
        let config: Config = toml_edit::de::from_str(r#"store = "memory""#).unwrap();
        assert!(matches!(config.store, StoreConfig::Memory));
        assert_eq!(config.server.base_path, "/v1");
        assert_eq!(config.server.page_limit, 1000);
    }
}
