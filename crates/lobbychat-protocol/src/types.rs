//! Identity and intent types shared by the transport glue and the lobby.

use std::fmt;

use lobbychat_transport::ConnectionId;
use serde::{Deserialize, Serialize};

/// A unique identifier for a connected client.
///
/// Stable for the lifetime of the connection. The server derives it from
/// the transport's [`ConnectionId`], so ids are never reused within a
/// process.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl From<ConnectionId> for ClientId {
    fn from(id: ConnectionId) -> Self {
        Self(id.into_inner())
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// What a client asked for. The payload meaning depends on the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentKind {
    /// Say something in the current room. The payload is the raw line.
    Message(String),
    /// Create a room with this name, then join it.
    CreateRoom(String),
    /// Join an existing room by name.
    JoinRoom(String),
    /// Go back to the lobby.
    LeaveRoom,
    /// List the names of all rooms.
    ListRooms,
    /// Change display name.
    Rename(String),
    /// Show the command reference.
    Help,
    /// Leave the server. Also synthesized when a connection drops.
    Quit,
}

impl IntentKind {
    /// Short lowercase label, used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::CreateRoom(_) => "create",
            Self::JoinRoom(_) => "join",
            Self::LeaveRoom => "leave",
            Self::ListRooms => "list",
            Self::Rename(_) => "rename",
            Self::Help => "help",
            Self::Quit => "quit",
        }
    }
}

/// A parsed client action on its way to the lobby. Consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    /// The client the intent came from.
    pub client: ClientId,
    /// What the client wants.
    pub kind: IntentKind,
}

impl Intent {
    /// Pairs a client with what it asked for.
    pub fn new(client: ClientId, kind: IntentKind) -> Self {
        Self { client, kind }
    }

    /// The quit intent synthesized on disconnect.
    pub fn quit(client: ClientId) -> Self {
        Self::new(client, IntentKind::Quit)
    }
}
