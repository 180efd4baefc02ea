//! End-to-end tests: real sockets, real lobby, full connection flow.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use lobbychat::prelude::*;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

const WELCOME: &str =
    "Welcome to the lobbychat server! To get started, type \"!help\" to retrieve a list of commands.";

/// Starts a TCP server on a random port. Returns its address and a lobby
/// handle for inspecting state.
async fn start_server(max_clients: usize) -> (String, LobbyHandle) {
    let server = ChatServerBuilder::new()
        .bind("127.0.0.1:0")
        .max_clients(max_clients)
        .build_tcp()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let lobby = server.lobby();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    (addr, lobby)
}

/// A line-oriented TCP client, like telnet.
struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: &str) -> Self {
        let stream = TcpStream::connect(addr).await.expect("should connect");
        let (read_half, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    /// Connects and consumes the welcome line.
    async fn join_server(addr: &str) -> Self {
        let mut client = Self::connect(addr).await;
        assert_eq!(client.recv().await.as_deref(), Some(WELCOME));
        client
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\r\n").as_bytes())
            .await
            .expect("send");
    }

    /// Next line, or `None` once the server closed the connection.
    async fn recv(&mut self) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .expect("read error")
    }

    async fn expect(&mut self, expected: &str) {
        assert_eq!(self.recv().await.as_deref(), Some(expected));
    }
}

fn text_frame(msg: Option<Result<Message, tokio_tungstenite::tungstenite::Error>>) -> String {
    match msg {
        Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_two_clients_chat_in_a_room() {
    let (addr, lobby) = start_server(12).await;
    let mut alice = Client::join_server(&addr).await;
    let mut bob = Client::join_server(&addr).await;

    alice.send("!name alice").await;
    alice.expect("Note: Changed their name to [alice].").await;
    alice.send("!create general").await;
    alice.expect("Note: Created the room {general}.").await;
    alice.expect("Note: [alice] has joined the room.").await;

    bob.send("!name bob").await;
    bob.expect("Note: Changed their name to [bob].").await;
    bob.send("!enter general").await;
    bob.expect("================BEGIN LOG================").await;
    bob.expect("Note: [alice] has joined the room.").await;
    bob.expect("================END LOG================").await;
    bob.expect("Note: [bob] has joined the room.").await;
    alice.expect("Note: [bob] has joined the room.").await;

    bob.send("hello alice").await;
    let line = alice.recv().await.unwrap();
    assert!(line.ends_with(" [bob] hello alice"), "got {line:?}");
    let echo = bob.recv().await.unwrap();
    assert_eq!(echo, line);

    let snap = lobby.snapshot().await.unwrap();
    assert_eq!(snap.room_names(), vec!["general"]);
    assert_eq!(snap.members("general").len(), 2);
    assert!(snap.is_consistent());
}

#[tokio::test]
async fn test_parse_error_reported_to_sender() {
    let (addr, _lobby) = start_server(12).await;
    let mut client = Client::join_server(&addr).await;

    client.send("!create").await;
    client.expect("Error: The create command needs an argument.").await;

    client.send("!list").await;
    client.expect("Chat Rooms:").await;
}

#[tokio::test]
async fn test_quit_closes_connection() {
    let (addr, lobby) = start_server(12).await;
    let mut client = Client::join_server(&addr).await;

    client.send("!quit").await;

    assert_eq!(client.recv().await, None);
    // The handler's own quit arrives after the lobby already dropped us.
    let snap = lobby.snapshot().await.unwrap();
    assert!(snap.clients.is_empty());
}

#[tokio::test]
async fn test_disconnect_leaves_room() {
    let (addr, lobby) = start_server(12).await;
    let mut alice = Client::join_server(&addr).await;
    let mut bob = Client::join_server(&addr).await;

    alice.send("!create general").await;
    alice.recv().await;
    alice.recv().await;

    bob.send("!join general").await;
    for _ in 0..4 {
        bob.recv().await;
    }
    alice.expect("Note: [Anon] has joined the room.").await;

    drop(bob);
    alice.expect("Note: [Anon] has left the room.").await;

    let snap = lobby.snapshot().await.unwrap();
    assert_eq!(snap.clients.len(), 1);
    assert_eq!(snap.members("general").len(), 1);
}

#[tokio::test]
async fn test_over_capacity_connection_is_closed() {
    let (addr, lobby) = start_server(1).await;
    let _first = Client::join_server(&addr).await;

    let mut second = Client::connect(&addr).await;
    assert_eq!(second.recv().await, None, "no welcome, just a close");

    let snap = lobby.snapshot().await.unwrap();
    assert_eq!(snap.clients.len(), 1);
}

#[tokio::test]
async fn test_websocket_client_gets_text_frames() {
    let server = ChatServerBuilder::new()
        .bind("127.0.0.1:0")
        .build_websocket()
        .await
        .expect("server should build");
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.run().await;
    });

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");

    assert_eq!(text_frame(ws.next().await), WELCOME);

    ws.send(Message::Text("!list".into())).await.unwrap();
    assert_eq!(text_frame(ws.next().await), "Chat Rooms:");
}

#[tokio::test]
async fn test_run_until_closes_clients() {
    let server = ChatServerBuilder::new()
        .bind("127.0.0.1:0")
        .build_tcp()
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let running = tokio::spawn(server.run_until(async {
        let _ = stop_rx.await;
    }));

    let mut client = Client::join_server(&addr).await;
    stop_tx.send(()).unwrap();

    running.await.unwrap().unwrap();
    assert_eq!(client.recv().await, None);
}

#[tokio::test]
async fn test_idle_socket_does_not_block_websocket_clients() {
    let server = ChatServerBuilder::new()
        .bind("127.0.0.1:0")
        .build_websocket()
        .await
        .expect("server should build");
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Opens a socket and never sends the upgrade request.
    let _idle = TcpStream::connect(addr).await.expect("should connect");

    let (mut ws, _) = tokio::time::timeout(
        Duration::from_secs(3),
        tokio_tungstenite::connect_async(format!("ws://{addr}")),
    )
    .await
    .expect("second client should not wait on the idle socket")
    .expect("should connect");

    assert_eq!(text_frame(ws.next().await), WELCOME);
}
