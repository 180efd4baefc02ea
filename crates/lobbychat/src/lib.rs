//! # lobbychat
//!
//! A multi-room chat server. Clients connect over TCP (or WebSocket),
//! start in the lobby, and create, join and leave named rooms. Rooms keep
//! their history and are reclaimed after a week without activity.
//!
//! All lobby state lives in one actor task; connections talk to it through
//! a [`LobbyHandle`](lobbychat_room::LobbyHandle).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lobbychat::prelude::*;
//!
//! # async fn run() -> Result<(), ChatError> {
//! let server = ChatServer::builder()
//!     .bind("127.0.0.1:65535")
//!     .build_tcp()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
pub mod logging;
mod server;

pub use config::{ServerConfig, TransportKind};
pub use error::{ChatError, ConfigError};
pub use server::{ChatServer, ChatServerBuilder};

/// Convenient re-exports for running and testing a server.
pub mod prelude {
    pub use crate::{ChatError, ChatServer, ChatServerBuilder, ServerConfig, TransportKind};
    pub use lobbychat_protocol::{ClientId, CommandGrammar, Intent, IntentKind, PrefixGrammar};
    pub use lobbychat_room::{LobbyConfig, LobbyError, LobbyHandle, LobbySnapshot};
    pub use lobbychat_transport::{Connection, Transport};
}
