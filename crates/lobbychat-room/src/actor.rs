//! Lobby actor: the single Tokio task that owns the [`Lobby`].
//!
//! Connections never touch lobby state. They hold a [`LobbyHandle`] and
//! send commands through a bounded mpsc channel; expiry timers post to a
//! second, internal queue. The actor drains both one item at a time, so
//! every state transition is serialized.

use lobbychat_protocol::{ClientId, Intent};
use tokio::sync::{mpsc, oneshot};

use crate::client::Outbox;
use crate::expiry::{ExpiryCheck, ExpirySupervisor};
use crate::lobby::Lobby;
use crate::{LobbyConfig, LobbyError, LobbySnapshot};

/// Commands sent to the lobby actor through its channel.
///
/// Variants with a `oneshot::Sender` expect a reply; the rest are
/// fire-and-forget.
pub(crate) enum LobbyCommand {
    /// Put a new connection on the roster.
    Admit {
        client: ClientId,
        outbox: Outbox,
        reply: oneshot::Sender<Result<(), LobbyError>>,
    },

    /// Apply one parsed intent.
    Dispatch(Intent),

    /// Report a copy of the room directory and roster.
    Snapshot {
        reply: oneshot::Sender<LobbySnapshot>,
    },

    /// Close every connection and stop.
    Shutdown,
}

/// Handle to the running lobby actor.
///
/// Cheap to clone: it's an `mpsc::Sender` wrapper. Every connection
/// handler holds one.
#[derive(Debug, Clone)]
pub struct LobbyHandle {
    sender: mpsc::Sender<LobbyCommand>,
}

impl LobbyHandle {
    /// Registers a connection. On success the client has already been
    /// sent the welcome line.
    pub async fn admit(&self, client: ClientId, outbox: Outbox) -> Result<(), LobbyError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(LobbyCommand::Admit {
                client,
                outbox,
                reply: reply_tx,
            })
            .await
            .map_err(|_| LobbyError::Unavailable)?;
        reply_rx.await.map_err(|_| LobbyError::Unavailable)?
    }

    /// Submits an intent (fire-and-forget). Outcomes arrive on outboxes.
    pub async fn dispatch(&self, intent: Intent) -> Result<(), LobbyError> {
        self.sender
            .send(LobbyCommand::Dispatch(intent))
            .await
            .map_err(|_| LobbyError::Unavailable)
    }

    /// Returns a snapshot taken after every previously sent command has
    /// been applied.
    pub async fn snapshot(&self) -> Result<LobbySnapshot, LobbyError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(LobbyCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| LobbyError::Unavailable)?;
        reply_rx.await.map_err(|_| LobbyError::Unavailable)
    }

    /// Tells the lobby to close all connections and stop.
    pub async fn shutdown(&self) -> Result<(), LobbyError> {
        self.sender
            .send(LobbyCommand::Shutdown)
            .await
            .map_err(|_| LobbyError::Unavailable)
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

struct LobbyActor {
    lobby: Lobby,
    receiver: mpsc::Receiver<LobbyCommand>,
    expiry_rx: mpsc::UnboundedReceiver<ExpiryCheck>,
}

impl LobbyActor {
    /// Runs the actor loop until shutdown or until every handle is dropped.
    async fn run(mut self) {
        tracing::info!("lobby actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else {
                        tracing::debug!("all lobby handles dropped");
                        break;
                    };
                    if !self.handle(cmd) {
                        break;
                    }
                }
                Some(check) = self.expiry_rx.recv() => {
                    self.lobby.check_expiry(check);
                }
            }
        }

        self.receiver.close();
        self.lobby.close_all();
        tracing::info!("lobby actor stopped");
    }

    /// Applies one command. Returns `false` when the actor should stop.
    fn handle(&mut self, cmd: LobbyCommand) -> bool {
        match cmd {
            LobbyCommand::Admit {
                client,
                outbox,
                reply,
            } => {
                let result = self.lobby.admit(client, outbox);
                let _ = reply.send(result);
            }
            LobbyCommand::Dispatch(intent) => self.lobby.dispatch(intent),
            LobbyCommand::Snapshot { reply } => {
                let _ = reply.send(self.lobby.snapshot());
            }
            LobbyCommand::Shutdown => {
                tracing::info!("lobby shutting down");
                return false;
            }
        }
        true
    }
}

/// Spawns the lobby actor and returns a handle to it.
///
/// `channel_size` bounds the command channel; when it fills up,
/// connection handlers wait.
pub fn spawn_lobby(config: LobbyConfig) -> LobbyHandle {
    let config = config.validated();
    let (sender, receiver) = mpsc::channel(config.channel_size);
    let (expiry, expiry_rx) = ExpirySupervisor::new();

    tracing::debug!(
        max_clients = config.max_clients,
        room_ttl_secs = config.room_ttl_secs,
        "spawning lobby"
    );

    let actor = LobbyActor {
        lobby: Lobby::new(config, expiry),
        receiver,
        expiry_rx,
    };
    tokio::spawn(actor.run());

    LobbyHandle { sender }
}
