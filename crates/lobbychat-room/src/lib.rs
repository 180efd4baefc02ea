//! Lobby, rooms, and inactivity expiry for lobbychat.
//!
//! One lobby actor owns every room and every connected client. Connection
//! handlers talk to it through a [`LobbyHandle`]; the lobby talks back
//! through each client's [`Outbox`].
//!
//! # Key types
//!
//! - [`LobbyHandle`]: submit intents, admit clients, take snapshots
//! - [`spawn_lobby`]: start the actor
//! - [`LobbyConfig`]: capacity, room lifetime, command prefix
//! - [`Outbound`]: what a connection's writer receives
//! - [`LobbySnapshot`]: a consistent copy of lobby state for tests and
//!   diagnostics

mod actor;
mod client;
mod config;
mod error;
mod expiry;
mod lobby;
mod room;
mod snapshot;

pub use actor::{LobbyHandle, spawn_lobby};
pub use client::{Outbound, Outbox, OutboxReceiver, outbox};
pub use config::{LobbyConfig, MAX_ROOM_TTL_SECS};
pub use error::LobbyError;
pub use room::RoomId;
pub use snapshot::{ClientSnapshot, LobbySnapshot, RoomSnapshot};
