//! Per-connection handler: admission, then a reader and a writer.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   0. Finish the transport handshake, bounded by [`HANDSHAKE_TIMEOUT`]
//!   1. Admit the client to the lobby (rejected at capacity)
//!   2. Reader: receive lines → parse → dispatch intents
//!   3. Writer: drain the outbox → send lines, close on request
//!   4. Whichever side stops first ends the connection → synthesized quit

use std::time::Duration;

use lobbychat_protocol::{ClientId, CommandGrammar, Intent, text};
use lobbychat_room::{LobbyHandle, Outbound, Outbox, OutboxReceiver};
use lobbychat_transport::{Connection, Transport, TransportError};

use crate::ChatError;

/// How long a freshly accepted socket gets to finish its handshake.
pub(crate) const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Completes the transport handshake for an accepted socket.
pub(crate) async fn establish<T: Transport>(
    pending: T::Pending,
) -> Result<T::Connection, TransportError> {
    match tokio::time::timeout(HANDSHAKE_TIMEOUT, T::establish(pending)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::AcceptFailed(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "handshake timed out",
        ))),
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C, G>(
    conn: C,
    lobby: LobbyHandle,
    grammar: &G,
) -> Result<(), ChatError>
where
    C: Connection,
    G: CommandGrammar,
{
    let conn_id = conn.id();
    let client_id = ClientId::from(conn_id);
    let (outbox, mut outbox_rx) = lobbychat_room::outbox();

    if let Err(e) = lobby.admit(client_id, outbox.clone()).await {
        tracing::info!(%conn_id, error = %e, "connection not admitted");
        let _ = conn.close().await;
        return Err(e.into());
    }
    tracing::info!(%conn_id, %client_id, "client connected");

    let result = tokio::select! {
        r = read_loop(&conn, &lobby, grammar, client_id, &outbox) => r,
        r = write_loop(&conn, &mut outbox_rx) => r.map_err(ChatError::from),
    };

    // No-op if the client already quit.
    if let Err(e) = lobby.dispatch(Intent::quit(client_id)).await {
        tracing::debug!(%client_id, error = %e, "lobby gone before disconnect");
    }
    let _ = conn.close().await;

    tracing::info!(%client_id, "client disconnected");
    result
}

/// Turns inbound lines into intents until the peer goes away.
///
/// Parse errors are answered straight from here; they never reach the lobby.
async fn read_loop<C, G>(
    conn: &C,
    lobby: &LobbyHandle,
    grammar: &G,
    client_id: ClientId,
    outbox: &Outbox,
) -> Result<(), ChatError>
where
    C: Connection,
    G: CommandGrammar,
{
    while let Some(line) = conn.recv_line().await? {
        match grammar.parse(&line) {
            Ok(kind) => lobby.dispatch(Intent::new(client_id, kind)).await?,
            Err(e) => {
                tracing::debug!(%client_id, error = %e, "unparsable line");
                let _ = outbox.send(Outbound::Line(text::error(&e)));
            }
        }
    }
    tracing::debug!(%client_id, "connection closed by peer");
    Ok(())
}

/// Writes queued lines in order. Stops after [`Outbound::Close`] or on the
/// first failed write.
async fn write_loop<C: Connection>(
    conn: &C,
    outbox_rx: &mut OutboxReceiver,
) -> Result<(), TransportError> {
    while let Some(item) = outbox_rx.recv().await {
        match item {
            Outbound::Line(line) => conn.send_line(&line).await?,
            Outbound::Close => {
                conn.close().await?;
                return Ok(());
            }
        }
    }
    Ok(())
}
