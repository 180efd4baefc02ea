//! `ChatServer` builder and accept loop.
//!
//! This is the entry point for running a lobbychat server. It ties
//! together all the layers: transport → protocol → lobby.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use lobbychat_protocol::PrefixGrammar;
use lobbychat_room::{LobbyConfig, LobbyHandle, spawn_lobby};
use lobbychat_transport::{TcpLineTransport, Transport, WebSocketTransport};

use crate::handler::{establish, handle_connection};
use crate::{ChatError, ServerConfig};

/// Builder for configuring and starting a lobbychat server.
///
/// # Example
///
/// ```rust,no_run
/// # async fn run() -> Result<(), lobbychat::ChatError> {
/// use lobbychat::prelude::*;
///
/// let server = ChatServer::builder()
///     .bind("0.0.0.0:65535")
///     .max_clients(32)
///     .build_tcp()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ChatServerBuilder {
    bind_addr: String,
    lobby: LobbyConfig,
}

impl ChatServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::from_config(&ServerConfig::default())
    }

    /// Starts from a loaded [`ServerConfig`]. The transport kind is not
    /// part of the builder; pick it with the `build_*` method.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            bind_addr: config.bind_addr.clone(),
            lobby: config.lobby.clone(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_owned();
        self
    }

    /// Replaces the lobby configuration.
    pub fn lobby_config(mut self, config: LobbyConfig) -> Self {
        self.lobby = config;
        self
    }

    /// Sets the connected-client cap.
    pub fn max_clients(mut self, max: usize) -> Self {
        self.lobby.max_clients = max;
        self
    }

    /// Binds a newline-framed TCP listener and starts the lobby.
    pub async fn build_tcp(self) -> Result<ChatServer<TcpLineTransport>, ChatError> {
        let transport = TcpLineTransport::bind(&self.bind_addr).await?;
        Ok(self.build_with(transport))
    }

    /// Binds a WebSocket listener and starts the lobby.
    pub async fn build_websocket(self) -> Result<ChatServer<WebSocketTransport>, ChatError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        Ok(self.build_with(transport))
    }

    /// Starts the lobby on an already bound transport.
    pub fn build_with<T: Transport>(self, transport: T) -> ChatServer<T> {
        let grammar = Arc::new(PrefixGrammar::new(self.lobby.command_prefix));
        let lobby = spawn_lobby(self.lobby);
        ChatServer {
            transport,
            lobby,
            grammar,
        }
    }
}

impl Default for ChatServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A lobbychat server bound to a transport.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ChatServer<T: Transport> {
    transport: T,
    lobby: LobbyHandle,
    grammar: Arc<PrefixGrammar>,
}

impl ChatServer<TcpLineTransport> {
    /// Creates a new builder.
    pub fn builder() -> ChatServerBuilder {
        ChatServerBuilder::new()
    }
}

impl<T: Transport> ChatServer<T> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns a handle to the lobby, for diagnostics.
    pub fn lobby(&self) -> LobbyHandle {
        self.lobby.clone()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), ChatError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` resolves, then closes every
    /// client connection and stops the lobby.
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> Result<(), ChatError> {
        let addr = self.transport.local_addr().ok();
        tracing::info!(?addr, "lobbychat server running");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(pending) => {
                        let lobby = self.lobby.clone();
                        let grammar = Arc::clone(&self.grammar);
                        tokio::spawn(async move {
                            let conn = match establish::<T>(pending).await {
                                Ok(conn) => conn,
                                Err(e) => {
                                    tracing::debug!(error = %e, "handshake failed");
                                    return;
                                }
                            };
                            if let Err(e) = handle_connection(conn, lobby, &*grammar).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                () = &mut shutdown => break,
            }
        }

        tracing::info!("lobbychat server shutting down");
        self.lobby.shutdown().await?;
        Ok(())
    }
}
