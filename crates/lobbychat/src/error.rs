//! Unified error type for lobbychat.

use lobbychat_protocol::ProtocolError;
use lobbychat_room::LobbyError;
use lobbychat_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls,
/// so `?` converts layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// A transport-level error (bind, accept, send, receive).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An inbound line could not be turned into an intent.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The lobby rejected a request or is gone.
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// The server configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors while loading a [`ServerConfig`](crate::ServerConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for this schema.
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}
