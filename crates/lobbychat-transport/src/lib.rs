//! Transport abstraction layer for lobbychat.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! how chat lines reach the server. Whatever the wire looks like, a
//! connection hands the layers above one decoded text line at a time and
//! accepts one outbound line at a time.
//!
//! # Implementations
//!
//! - [`TcpLineTransport`]: newline-delimited text over plain TCP
//!   (telnet/netcat friendly). Always available.
//! - `WebSocketTransport`: one text frame per line, via
//!   `tokio-tungstenite` (feature `websocket`, on by default).

mod error;
mod tcp;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use tcp::{TcpLineConnection, TcpLineTransport};
#[cfg(feature = "websocket")]
pub use websocket::{PendingWebSocket, WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs across all transports.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-wide unique id.
    pub(crate) fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Longest inbound line, in bytes, a connection will buffer.
pub const MAX_LINE_BYTES: usize = 8 * 1024;

/// Accepts new incoming connections.
///
/// Accepting is split in two. [`accept`](Transport::accept) only takes the
/// socket off the listener and must never wait on the peer; any protocol
/// handshake happens in [`establish`](Transport::establish), which the
/// server runs in the connection's own task.
pub trait Transport: Send + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// An accepted socket that has not finished its handshake yet.
    type Pending: Send + 'static;

    /// Waits for and accepts the next incoming socket.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Pending, TransportError>> + Send;

    /// Completes the handshake for an accepted socket.
    fn establish(
        pending: Self::Pending,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;

    /// Returns the address the transport is listening on.
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// A single client connection carrying text lines in both directions.
///
/// Reading and writing are independent: one task may sit in
/// [`recv_line`](Connection::recv_line) while another calls
/// [`send_line`](Connection::send_line) on the same connection.
pub trait Connection: Send + Sync + 'static {
    /// Sends one line to the remote peer. The implementation adds
    /// whatever delimiter its framing needs.
    fn send_line(
        &self,
        line: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next line from the remote peer, without its delimiter.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv_line(
        &self,
    ) -> impl Future<Output = Result<Option<String>, TransportError>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
