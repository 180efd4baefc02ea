//! Expiry supervisor: timer-driven reclamation of inactive rooms.
//!
//! Each room cycles through
//!
//! ```text
//! ACTIVE ──(timer fires)──→ CHECK ──(deadline moved)──→ ACTIVE (re-armed)
//!                             │
//!                             └──(deadline passed)──→ DELETED
//! ```
//!
//! Timers are plain tokio tasks that sleep until the deadline they were
//! armed with and then post an [`ExpiryCheck`] to the lobby's expiry
//! queue. They never touch a room. The lobby reads the room's *current*
//! deadline when the check arrives, so a broadcast that landed after the
//! timer was armed is always seen.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::room::{Room, RoomId};

/// Posted by a timer when its deadline passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExpiryCheck {
    pub(crate) room_id: RoomId,
    pub(crate) room: String,
}

/// What the lobby should do with an [`ExpiryCheck`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExpiryDecision {
    /// The room is gone or was re-created under the same name.
    Stale,
    /// Activity moved the deadline; arm a new timer for the remainder.
    Rearm,
    /// Deadline passed with no activity; reclaim the room.
    Expire,
}

/// Decides the CHECK transition against the live directory.
pub(crate) fn decide(
    check: &ExpiryCheck,
    rooms: &HashMap<String, Room>,
    now: Instant,
) -> ExpiryDecision {
    match rooms.get(&check.room) {
        Some(room) if room.id() == check.room_id => {
            if room.expires_at() > now {
                ExpiryDecision::Rearm
            } else {
                ExpiryDecision::Expire
            }
        }
        _ => ExpiryDecision::Stale,
    }
}

/// Arms expiry timers that report back into one queue.
#[derive(Debug)]
pub(crate) struct ExpirySupervisor {
    tx: mpsc::UnboundedSender<ExpiryCheck>,
}

impl ExpirySupervisor {
    /// Creates a supervisor and the queue its timers post to.
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<ExpiryCheck>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Spawns a timer for the room's current deadline and returns a
    /// handle that cancels it.
    pub(crate) fn arm(&self, room: &Room) -> AbortHandle {
        let deadline = room.expires_at();
        let check = ExpiryCheck {
            room_id: room.id(),
            room: room.name().to_owned(),
        };
        let tx = self.tx.clone();

        tracing::trace!(
            room = %check.room,
            room_id = %check.room_id,
            in_secs = deadline.saturating_duration_since(Instant::now()).as_secs(),
            "expiry timer armed"
        );

        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            // The receiver only goes away with the lobby itself.
            let _ = tx.send(check);
        })
        .abort_handle()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn directory_with(room: Room) -> HashMap<String, Room> {
        let mut rooms = HashMap::new();
        rooms.insert(room.name().to_owned(), room);
        rooms
    }

    #[tokio::test(start_paused = true)]
    async fn test_decide_expire_after_deadline() {
        let room = Room::new("general".into(), Duration::from_secs(60));
        let check = ExpiryCheck { room_id: room.id(), room: "general".into() };
        let rooms = directory_with(room);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(decide(&check, &rooms, Instant::now()), ExpiryDecision::Expire);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decide_rearm_when_deadline_moved() {
        let room = Room::new("general".into(), Duration::from_secs(60));
        let check = ExpiryCheck { room_id: room.id(), room: "general".into() };
        let rooms = directory_with(room);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(decide(&check, &rooms, Instant::now()), ExpiryDecision::Rearm);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decide_stale_for_recreated_room() {
        let old = Room::new("general".into(), Duration::from_secs(60));
        let check = ExpiryCheck { room_id: old.id(), room: "general".into() };
        drop(old);
        let rooms = directory_with(Room::new("general".into(), Duration::from_secs(60)));

        tokio::time::advance(Duration::from_secs(120)).await;
        assert_eq!(decide(&check, &rooms, Instant::now()), ExpiryDecision::Stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decide_stale_for_missing_room() {
        let room = Room::new("general".into(), Duration::from_secs(60));
        let check = ExpiryCheck { room_id: room.id(), room: "general".into() };
        assert_eq!(
            decide(&check, &HashMap::new(), Instant::now()),
            ExpiryDecision::Stale
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_armed_timer_posts_check_at_deadline() {
        let (supervisor, mut rx) = ExpirySupervisor::new();
        let room = Room::new("general".into(), Duration::from_secs(60));
        let _timer = supervisor.arm(&room);

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(rx.try_recv().is_err(), "must not fire early");

        let check = rx.recv().await.expect("timer should fire");
        assert_eq!(check.room, "general");
        assert_eq!(check.room_id, room.id());
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_timer_never_posts() {
        let (supervisor, mut rx) = ExpirySupervisor::new();
        let room = Room::new("general".into(), Duration::from_secs(60));
        supervisor.arm(&room).abort();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(rx.try_recv().is_err());
    }
}
