//! Per-connection client state and its outbox.

use lobbychat_protocol::ClientId;
use tokio::sync::mpsc;

/// One item queued for a client's writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A text line, without delimiter.
    Line(String),
    /// Close the connection after everything queued before this.
    Close,
}

/// Sending side of a client's outbox. Unbounded, so enqueueing never
/// waits on a slow reader.
pub type Outbox = mpsc::UnboundedSender<Outbound>;

/// Receiving side of a client's outbox, drained by exactly one writer.
pub type OutboxReceiver = mpsc::UnboundedReceiver<Outbound>;

/// Creates a fresh outbox pair for a new connection.
pub fn outbox() -> (Outbox, OutboxReceiver) {
    mpsc::unbounded_channel()
}

/// The lobby's record of one connected client.
///
/// `current_room` is a key into the lobby's room directory, not a
/// reference: the lobby resolves it on every use.
#[derive(Debug)]
pub(crate) struct Client {
    pub(crate) id: ClientId,
    pub(crate) display_name: String,
    pub(crate) current_room: Option<String>,
    outbox: Outbox,
}

impl Client {
    pub(crate) fn new(id: ClientId, display_name: String, outbox: Outbox) -> Self {
        Self {
            id,
            display_name,
            current_room: None,
            outbox,
        }
    }

    /// Queues a line. Silently drops it if the writer is gone; the
    /// connection handler turns that into a quit on its own.
    pub(crate) fn send(&self, line: impl Into<String>) {
        let _ = self.outbox.send(Outbound::Line(line.into()));
    }

    /// Tells the writer to close the connection.
    pub(crate) fn close(&self) {
        let _ = self.outbox.send(Outbound::Close);
    }
}
