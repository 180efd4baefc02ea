//! A named chat room: members, history, and inactivity deadline.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lobbychat_protocol::ClientId;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::client::Client;

/// Counter for generating unique room IDs.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one room *instance*. A room re-created under a reclaimed
/// name gets a new id, which is how expiry checks tell a stale timer
/// from a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoomId(u64);

impl RoomId {
    fn next() -> Self {
        Self(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// The lobby's client roster, keyed by id.
pub(crate) type Roster = HashMap<ClientId, Client>;

/// A chat room.
///
/// Only the lobby touches rooms, one command at a time, so nothing here
/// is synchronized.
#[derive(Debug)]
pub(crate) struct Room {
    id: RoomId,
    name: String,
    /// Insertion order, no duplicates.
    members: Vec<ClientId>,
    /// Every line ever broadcast, replayed to joiners.
    history: Vec<String>,
    expires_at: Instant,
    /// The pending expiry timer, if armed.
    timer: Option<AbortHandle>,
}

impl Room {
    pub(crate) fn new(name: String, ttl: Duration) -> Self {
        Self {
            id: RoomId::next(),
            name,
            members: Vec::new(),
            history: Vec::new(),
            expires_at: Instant::now() + ttl,
            timer: None,
        }
    }

    pub(crate) fn id(&self) -> RoomId {
        self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn members(&self) -> &[ClientId] {
        &self.members
    }

    pub(crate) fn history(&self) -> &[String] {
        &self.history
    }

    pub(crate) fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub(crate) fn contains(&self, client: ClientId) -> bool {
        self.members.contains(&client)
    }

    /// Adds a member. Returns `false` if it was already present.
    pub(crate) fn add_member(&mut self, client: ClientId) -> bool {
        if self.contains(client) {
            return false;
        }
        self.members.push(client);
        true
    }

    /// Removes a member. Returns `false` if it was not present.
    pub(crate) fn remove_member(&mut self, client: ClientId) -> bool {
        let before = self.members.len();
        self.members.retain(|id| *id != client);
        self.members.len() != before
    }

    /// Records `line` in the history, pushes the deadline to
    /// `now + ttl`, and queues the line for every member in join order.
    pub(crate) fn broadcast(&mut self, line: String, roster: &Roster, ttl: Duration) {
        self.expires_at = Instant::now() + ttl;
        for id in &self.members {
            match roster.get(id) {
                Some(client) => client.send(line.clone()),
                None => tracing::error!(
                    room = %self.name,
                    client_id = %id,
                    "room member missing from roster"
                ),
            }
        }
        self.history.push(line);
    }

    /// Installs a freshly armed expiry timer, cancelling any previous one
    /// so a room never has two pending timers.
    pub(crate) fn set_timer(&mut self, timer: AbortHandle) {
        if let Some(old) = self.timer.replace(timer) {
            old.abort();
        }
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Outbound, outbox};

    fn roster_with(ids: &[u64]) -> (Roster, Vec<crate::OutboxReceiver>) {
        let mut roster = Roster::new();
        let mut receivers = Vec::new();
        for &id in ids {
            let (tx, rx) = outbox();
            roster.insert(ClientId(id), Client::new(ClientId(id), "Anon".into(), tx));
            receivers.push(rx);
        }
        (roster, receivers)
    }

    #[test]
    fn test_room_ids_are_unique() {
        let a = Room::new("a".into(), Duration::from_secs(1));
        let b = Room::new("a".into(), Duration::from_secs(1));
        assert_ne!(a.id(), b.id());
        assert_eq!(a.name(), "a");
    }

    #[test]
    fn test_add_member_is_set_like_and_ordered() {
        let mut room = Room::new("general".into(), Duration::from_secs(60));
        assert!(room.add_member(ClientId(2)));
        assert!(room.add_member(ClientId(1)));
        assert!(!room.add_member(ClientId(2)));
        assert_eq!(room.members(), &[ClientId(2), ClientId(1)]);
    }

    #[test]
    fn test_remove_member() {
        let mut room = Room::new("general".into(), Duration::from_secs(60));
        room.add_member(ClientId(1));
        room.add_member(ClientId(2));
        assert!(room.remove_member(ClientId(1)));
        assert!(!room.remove_member(ClientId(1)));
        assert_eq!(room.members(), &[ClientId(2)]);
        assert!(!room.contains(ClientId(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_records_history_and_extends_deadline() {
        let ttl = Duration::from_secs(60);
        let mut room = Room::new("general".into(), ttl);
        let created_deadline = room.expires_at();

        tokio::time::advance(Duration::from_secs(30)).await;
        let (roster, _rx) = roster_with(&[]);
        room.broadcast("hello".into(), &roster, ttl);

        assert_eq!(room.history(), &["hello".to_owned()]);
        assert_eq!(room.expires_at(), created_deadline + Duration::from_secs(30));
    }

    #[test]
    fn test_broadcast_reaches_members_only() {
        let (roster, mut receivers) = roster_with(&[1, 2, 3]);
        let mut room = Room::new("general".into(), Duration::from_secs(60));
        room.add_member(ClientId(1));
        room.add_member(ClientId(3));

        room.broadcast("hi".into(), &roster, Duration::from_secs(60));

        assert_eq!(receivers[0].try_recv().unwrap(), Outbound::Line("hi".into()));
        assert!(receivers[1].try_recv().is_err());
        assert_eq!(receivers[2].try_recv().unwrap(), Outbound::Line("hi".into()));
    }

    #[tokio::test]
    async fn test_dropping_room_aborts_timer() {
        let mut room = Room::new("general".into(), Duration::from_secs(60));
        let task = tokio::spawn(std::future::pending::<()>());
        room.set_timer(task.abort_handle());
        drop(room);
        let err = task.await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_set_timer_cancels_previous() {
        let mut room = Room::new("general".into(), Duration::from_secs(60));
        let first = tokio::spawn(std::future::pending::<()>());
        let second = tokio::spawn(std::future::pending::<()>());
        room.set_timer(first.abort_handle());
        room.set_timer(second.abort_handle());
        assert!(first.await.unwrap_err().is_cancelled());
        second.abort();
    }
}
