//! Error types for the lobby layer.

use lobbychat_protocol::ClientId;

/// Errors that can occur during lobby operations.
///
/// The first four variants are user errors: their `Display` text is what
/// the offending client sees after the `Error: ` prefix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LobbyError {
    /// A room with this name already exists.
    #[error("There is a chat room with that name already.")]
    NameTaken(String),

    /// No room with this name exists.
    #[error("Chat room does not exist, you cannot join.")]
    RoomNotFound(String),

    /// The client tried to leave while already in the lobby.
    #[error("You cannot leave the lobby!")]
    LeaveLobby,

    /// The client tried to chat while in the lobby.
    #[error("Cannot send messages in the lobby.")]
    SendOutsideRoom,

    /// The roster is at capacity; the connection is closed instead of
    /// admitted.
    #[error("server is full ({0} clients)")]
    ServerFull(usize),

    /// A client with this id is already on the roster.
    #[error("client {0} is already connected")]
    AlreadyConnected(ClientId),

    /// The lobby actor has stopped.
    #[error("lobby is unavailable")]
    Unavailable,
}

impl LobbyError {
    /// Returns `true` for errors reported to the client as an error line.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NameTaken(_)
                | Self::RoomNotFound(_)
                | Self::LeaveLobby
                | Self::SendOutsideRoom
        )
    }
}
