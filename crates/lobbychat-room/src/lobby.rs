//! The lobby: sole owner of the room directory and the client roster.
//!
//! Every state transition happens inside one of the methods below, called
//! by the lobby actor one command at a time. That ordering is the only
//! synchronization the chat core needs.

use std::collections::HashMap;

use chrono::Local;
use lobbychat_protocol::{ClientId, Intent, IntentKind, text};

use crate::client::{Client, Outbound, Outbox};
use crate::expiry::{ExpiryCheck, ExpiryDecision, ExpirySupervisor, decide};
use crate::room::{Room, Roster};
use crate::snapshot::{ClientSnapshot, LobbySnapshot, RoomSnapshot};
use crate::{LobbyConfig, LobbyError};

/// Owns all rooms and clients.
///
/// A client is either in the lobby proper (`current_room == None`) or in
/// exactly one room, and that room's member list contains it. Every
/// method leaves that invariant intact.
pub(crate) struct Lobby {
    config: LobbyConfig,
    /// Room directory, keyed by unique name.
    rooms: HashMap<String, Room>,
    /// Every connected client, in a room or not.
    clients: Roster,
    expiry: ExpirySupervisor,
}

impl Lobby {
    pub(crate) fn new(config: LobbyConfig, expiry: ExpirySupervisor) -> Self {
        Self {
            config,
            rooms: HashMap::new(),
            clients: Roster::new(),
            expiry,
        }
    }

    /// Adds a client to the roster, in no room.
    ///
    /// At capacity the client is not admitted: its outbox gets
    /// [`Outbound::Close`] and no error line.
    pub(crate) fn admit(&mut self, id: ClientId, outbox: Outbox) -> Result<(), LobbyError> {
        if self.clients.contains_key(&id) {
            tracing::error!(client_id = %id, "client id admitted twice");
            return Err(LobbyError::AlreadyConnected(id));
        }
        if self.clients.len() >= self.config.max_clients {
            let _ = outbox.send(Outbound::Close);
            tracing::info!(
                client_id = %id,
                max_clients = self.config.max_clients,
                "server full, rejecting client"
            );
            return Err(LobbyError::ServerFull(self.config.max_clients));
        }

        let client = Client::new(id, self.config.default_name.clone(), outbox);
        client.send(text::welcome(self.config.command_prefix));
        self.clients.insert(id, client);

        tracing::info!(client_id = %id, clients = self.clients.len(), "client admitted");
        Ok(())
    }

    /// Routes one intent. Results are only observable through outboxes.
    pub(crate) fn dispatch(&mut self, intent: Intent) {
        let Intent { client: client_id, kind } = intent;

        if !self.clients.contains_key(&client_id) {
            tracing::debug!(
                %client_id,
                intent = kind.label(),
                "intent from client not on the roster, dropping"
            );
            return;
        }
        tracing::debug!(%client_id, intent = kind.label(), "dispatching intent");

        let result = match kind {
            IntentKind::Message(line) => self.send_message(client_id, &line),
            IntentKind::CreateRoom(name) => self.create_room(client_id, name),
            IntentKind::JoinRoom(name) => self.join_room(client_id, name),
            IntentKind::LeaveRoom => self.leave_room(client_id),
            IntentKind::ListRooms => {
                self.list_rooms(client_id);
                Ok(())
            }
            IntentKind::Rename(name) => {
                self.rename(client_id, name);
                Ok(())
            }
            IntentKind::Help => {
                self.help(client_id);
                Ok(())
            }
            IntentKind::Quit => self.quit(client_id),
        };

        match result {
            Ok(()) => {}
            Err(e) if e.is_user_error() => {
                tracing::debug!(%client_id, error = %e, "intent rejected");
                self.send_to(client_id, text::error(&e));
            }
            Err(e) => tracing::warn!(%client_id, error = %e, "intent failed"),
        }
    }

    fn send_message(&mut self, client_id: ClientId, line: &str) -> Result<(), LobbyError> {
        let Some(client) = self.clients.get(&client_id) else {
            return Ok(());
        };
        let room = client
            .current_room
            .clone()
            .ok_or(LobbyError::SendOutsideRoom)?;
        let chat = text::chat_line(&Local::now(), &client.display_name, line);
        self.broadcast(&room, chat);
        Ok(())
    }

    /// Creates a room and joins the creator to it.
    fn create_room(&mut self, client_id: ClientId, name: String) -> Result<(), LobbyError> {
        if self.rooms.contains_key(&name) {
            return Err(LobbyError::NameTaken(name));
        }

        let mut room = Room::new(name.clone(), self.config.room_ttl());
        room.set_timer(self.expiry.arm(&room));
        tracing::info!(room = %name, room_id = %room.id(), %client_id, "room created");
        self.rooms.insert(name.clone(), room);

        self.send_to(client_id, text::room_created(&name));
        self.join_room(client_id, name)
    }

    /// Moves a client into a room: leave the old one, replay history to
    /// the joiner, then announce the join.
    fn join_room(&mut self, client_id: ClientId, name: String) -> Result<(), LobbyError> {
        if !self.rooms.contains_key(&name) {
            return Err(LobbyError::RoomNotFound(name));
        }
        if self.room_of(client_id).is_some() {
            self.leave_room(client_id)?;
        }

        let ttl = self.config.room_ttl();
        let (Some(client), Some(room)) =
            (self.clients.get_mut(&client_id), self.rooms.get_mut(&name))
        else {
            return Ok(());
        };

        room.add_member(client_id);
        client.current_room = Some(name);

        if !room.history().is_empty() {
            client.send(text::LOG_BEGIN);
            for line in room.history() {
                client.send(line.as_str());
            }
            client.send(text::LOG_END);
        }
        let notice = text::joined(&client.display_name);

        room.broadcast(notice, &self.clients, ttl);
        tracing::debug!(%client_id, room = %room.name(), members = room.members().len(), "joined room");
        Ok(())
    }

    /// Announces the leave to the old member set (leaver included), then
    /// removes the client from it.
    fn leave_room(&mut self, client_id: ClientId) -> Result<(), LobbyError> {
        let Some(client) = self.clients.get(&client_id) else {
            return Ok(());
        };
        let room_name = client.current_room.clone().ok_or(LobbyError::LeaveLobby)?;
        let notice = text::left(&client.display_name);

        if !self.rooms.contains_key(&room_name) {
            self.repair_dangling(&room_name);
            return Ok(());
        }
        self.broadcast(&room_name, notice);

        if let Some(room) = self.rooms.get_mut(&room_name) {
            room.remove_member(client_id);
        }
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.current_room = None;
        }
        tracing::debug!(%client_id, room = %room_name, "left room");
        Ok(())
    }

    /// Notifies first, then renames. Lobby renames are private.
    fn rename(&mut self, client_id: ClientId, new_name: String) {
        let Some(client) = self.clients.get(&client_id) else {
            return;
        };
        match client.current_room.clone() {
            Some(room) => {
                let notice = text::renamed_public(&client.display_name, &new_name);
                self.broadcast(&room, notice);
            }
            None => client.send(text::renamed_private(&new_name)),
        }

        if let Some(client) = self.clients.get_mut(&client_id) {
            tracing::debug!(%client_id, from = %client.display_name, to = %new_name, "renamed");
            client.display_name = new_name;
        }
    }

    fn list_rooms(&self, client_id: ClientId) {
        let Some(client) = self.clients.get(&client_id) else {
            return;
        };
        let mut names: Vec<&str> = self.rooms.keys().map(String::as_str).collect();
        names.sort_unstable();

        client.send(text::ROOM_LIST_HEADER);
        for name in names {
            client.send(name);
        }
    }

    fn help(&self, client_id: ClientId) {
        if let Some(client) = self.clients.get(&client_id) {
            for line in text::help(self.config.command_prefix) {
                client.send(line);
            }
        }
    }

    /// Leaves the current room (if any), drops the client from the roster
    /// and closes its connection.
    fn quit(&mut self, client_id: ClientId) -> Result<(), LobbyError> {
        if self.room_of(client_id).is_some() {
            self.leave_room(client_id)?;
        }
        if let Some(client) = self.clients.remove(&client_id) {
            client.close();
            tracing::info!(%client_id, clients = self.clients.len(), "client quit");
        }
        Ok(())
    }

    /// Handles a fired expiry timer.
    pub(crate) fn check_expiry(&mut self, check: ExpiryCheck) {
        match decide(&check, &self.rooms, tokio::time::Instant::now()) {
            ExpiryDecision::Stale => {
                tracing::debug!(room = %check.room, room_id = %check.room_id, "stale expiry check ignored");
            }
            ExpiryDecision::Rearm => {
                if let Some(room) = self.rooms.get_mut(&check.room) {
                    let timer = self.expiry.arm(room);
                    room.set_timer(timer);
                    tracing::debug!(room = %check.room, "room still active, expiry re-armed");
                }
            }
            ExpiryDecision::Expire => self.reclaim(&check.room),
        }
    }

    /// Deletes an expired room: notify members, send them back to the
    /// lobby, drop it from the directory.
    fn reclaim(&mut self, name: &str) {
        let Some(mut room) = self.rooms.remove(name) else {
            return;
        };

        room.broadcast(text::ROOM_DELETED.to_owned(), &self.clients, self.config.room_ttl());
        for id in room.members() {
            if let Some(client) = self.clients.get_mut(id) {
                client.current_room = None;
            }
        }

        tracing::info!(
            room = %name,
            room_id = %room.id(),
            members = room.members().len(),
            "room reclaimed after inactivity"
        );
    }

    /// Closes every connection. Called when the actor stops.
    pub(crate) fn close_all(&mut self) {
        for (_, client) in self.clients.drain() {
            client.close();
        }
        self.rooms.clear();
    }

    pub(crate) fn snapshot(&self) -> LobbySnapshot {
        LobbySnapshot {
            rooms: self
                .rooms
                .iter()
                .map(|(name, room)| {
                    (
                        name.clone(),
                        RoomSnapshot {
                            members: room.members().to_vec(),
                            history_len: room.history().len(),
                        },
                    )
                })
                .collect(),
            clients: self
                .clients
                .values()
                .map(|client| {
                    (
                        client.id,
                        ClientSnapshot {
                            display_name: client.display_name.clone(),
                            current_room: client.current_room.clone(),
                        },
                    )
                })
                .collect(),
        }
    }

    fn room_of(&self, client_id: ClientId) -> Option<&str> {
        self.clients
            .get(&client_id)
            .and_then(|c| c.current_room.as_deref())
    }

    fn send_to(&self, client_id: ClientId, line: String) {
        if let Some(client) = self.clients.get(&client_id) {
            client.send(line);
        }
    }

    fn broadcast(&mut self, room: &str, line: String) {
        let ttl = self.config.room_ttl();
        if let Some(target) = self.rooms.get_mut(room) {
            target.broadcast(line, &self.clients, ttl);
            return;
        }
        self.repair_dangling(room);
    }

    /// A client pointing at a room that is not in the directory can't
    /// happen while all transitions go through this type. Debug builds
    /// stop here; release builds log and send the clients back to the lobby.
    fn repair_dangling(&mut self, room: &str) {
        debug_assert!(
            self.rooms.contains_key(room),
            "client references room {room:?} missing from the directory"
        );
        tracing::error!(room, "membership invariant violated: dangling room reference");
        for client in self.clients.values_mut() {
            if client.current_room.as_deref() == Some(room) {
                client.current_room = None;
            }
        }
    }
}
