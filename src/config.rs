//! Configuration loading and management.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server information.
    pub server: ServerConfig,
    /// WebSocket listen configuration.
    pub listen: ListenConfig,
    /// HTTP sidecar configuration (management API + metrics).
    pub http: HttpConfig,
    /// WebSocket handshake options.
    #[serde(default)]
    pub websocket: WebSocketConfig,
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name (e.g., "flowstate.example.net").
    pub name: String,
}

/// Network listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind the WebSocket listener to (e.g., "0.0.0.0:8001").
    pub address: SocketAddr,
}

/// HTTP sidecar configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Port for the management API and metrics. 0 disables the listener.
    pub port: u16,
}

/// WebSocket handshake options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebSocketConfig {
    /// Allowed Origin header values. Empty allows all origins.
    #[serde(default)]
    pub allow_origins: Vec<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
