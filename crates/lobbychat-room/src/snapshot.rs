//! Point-in-time copies of lobby state, for tests and diagnostics.

use std::collections::BTreeMap;

use lobbychat_protocol::ClientId;

/// A copy of one room's membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    /// Members in join order.
    pub members: Vec<ClientId>,
    /// Number of lines in the room's history.
    pub history_len: usize,
}

/// A copy of one client's lobby-visible state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSnapshot {
    /// Current display name.
    pub display_name: String,
    /// The room the client is in, `None` for the lobby.
    pub current_room: Option<String>,
}

/// The whole directory and roster, copied between two commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LobbySnapshot {
    /// Rooms keyed by name.
    pub rooms: BTreeMap<String, RoomSnapshot>,
    /// Connected clients keyed by id.
    pub clients: BTreeMap<ClientId, ClientSnapshot>,
}

impl LobbySnapshot {
    /// Room names in sorted order.
    pub fn room_names(&self) -> Vec<&str> {
        self.rooms.keys().map(String::as_str).collect()
    }

    /// The room a client is in, or `None` for the lobby or an unknown client.
    pub fn room_of(&self, client: ClientId) -> Option<&str> {
        self.clients
            .get(&client)
            .and_then(|c| c.current_room.as_deref())
    }

    /// Members of a room in join order; empty if the room doesn't exist.
    pub fn members(&self, room: &str) -> &[ClientId] {
        self.rooms
            .get(room)
            .map(|r| r.members.as_slice())
            .unwrap_or(&[])
    }

    /// Checks the membership invariant in both directions:
    /// `client.current_room == Some(r)` iff room `r` lists the client,
    /// and no room lists a client twice.
    pub fn is_consistent(&self) -> bool {
        let clients_agree = self.clients.iter().all(|(id, client)| {
            match &client.current_room {
                Some(room) => self
                    .rooms
                    .get(room)
                    .is_some_and(|r| r.members.contains(id)),
                None => self.rooms.values().all(|r| !r.members.contains(id)),
            }
        });

        let rooms_agree = self.rooms.iter().all(|(name, room)| {
            room.members.iter().enumerate().all(|(i, id)| {
                !room.members[..i].contains(id)
                    && self
                        .clients
                        .get(id)
                        .is_some_and(|c| c.current_room.as_deref() == Some(name))
            })
        });

        clients_agree && rooms_agree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(room: Option<&str>) -> ClientSnapshot {
        ClientSnapshot {
            display_name: "Anon".into(),
            current_room: room.map(str::to_owned),
        }
    }

    fn room(members: &[u64]) -> RoomSnapshot {
        RoomSnapshot {
            members: members.iter().copied().map(ClientId).collect(),
            history_len: 0,
        }
    }

    #[test]
    fn test_consistent_snapshot() {
        let mut snap = LobbySnapshot::default();
        snap.rooms.insert("general".into(), room(&[1]));
        snap.clients.insert(ClientId(1), client(Some("general")));
        snap.clients.insert(ClientId(2), client(None));

        assert!(snap.is_consistent());
        assert_eq!(snap.room_of(ClientId(1)), Some("general"));
        assert_eq!(snap.room_of(ClientId(2)), None);
        assert_eq!(snap.members("general"), &[ClientId(1)]);
        assert!(snap.members("random").is_empty());
        assert_eq!(snap.room_names(), vec!["general"]);
    }

    #[test]
    fn test_detects_client_pointing_at_missing_room() {
        let mut snap = LobbySnapshot::default();
        snap.clients.insert(ClientId(1), client(Some("gone")));
        assert!(!snap.is_consistent());
    }

    #[test]
    fn test_detects_member_without_back_reference() {
        let mut snap = LobbySnapshot::default();
        snap.rooms.insert("general".into(), room(&[1]));
        snap.clients.insert(ClientId(1), client(None));
        assert!(!snap.is_consistent());
    }

    #[test]
    fn test_detects_duplicate_member() {
        let mut snap = LobbySnapshot::default();
        snap.rooms.insert("general".into(), room(&[1, 1]));
        snap.clients.insert(ClientId(1), client(Some("general")));
        assert!(!snap.is_consistent());
    }
}
