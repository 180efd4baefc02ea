//! Server configuration.

use std::fmt;
use std::path::Path;

use lobbychat_room::LobbyConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Which wire framing the server listens with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Newline-delimited text over TCP (telnet, netcat).
    #[default]
    Tcp,
    /// One text frame per line over WebSocket.
    #[serde(alias = "ws")]
    #[value(name = "websocket", alias = "ws")]
    WebSocket,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str("tcp"),
            Self::WebSocket => f.write_str("websocket"),
        }
    }
}

/// Top-level configuration for a lobbychat server.
///
/// ```json
/// {
///   "bind_addr": "0.0.0.0:65535",
///   "transport": "tcp",
///   "log_filter": "info",
///   "lobby": { "max_clients": 12, "room_ttl_secs": 604800 }
/// }
/// ```
///
/// Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind_addr: String,

    /// Wire framing.
    pub transport: TransportKind,

    /// Default `tracing` filter directive. `RUST_LOG` takes precedence.
    pub log_filter: String,

    /// Lobby settings.
    pub lobby: LobbyConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:65535".to_owned(),
            transport: TransportKind::Tcp,
            log_filter: "info".to_owned(),
            lobby: LobbyConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parses a JSON config document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}
