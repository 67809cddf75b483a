//! What happens to one accepted connection, from registration to cleanup.

use std::sync::Arc;

use chatroom_core::{ChatMessage, TransportError, Username};
use futures::Stream;
use tracing::{info, warn};

use crate::connection::{ChatSink, Connection};
use crate::reader::{self, ReadOutcome};
use crate::room::ChatRoom;

/// How a connection ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// Another connection claimed the name between check and registration.
    NameTaken,
    /// Shutdown began before the connection could register.
    ShuttingDown,
    /// The connection was registered and its read loop has ended.
    Finished(ReadOutcome),
}

/// Register a freshly upgraded transport and read from it until it ends.
///
/// 1. Register under `username`; on a lost race close the transport and stop
/// 2. Start the broadcaster if this is the first connection ever
/// 3. Run the read loop, which unsubscribes the connection on exit
pub async fn serve_connection<K, S>(
    room: &ChatRoom,
    username: Username,
    sink: K,
    inbound: S,
) -> SessionEnd
where
    K: ChatSink + 'static,
    S: Stream<Item = Result<ChatMessage, TransportError>> + Unpin,
{
    let conn = Arc::new(Connection::new(username, sink, room.config().write_timeout()));

    if room.is_shutting_down() {
        let _ = conn.close().await;
        return SessionEnd::ShuttingDown;
    }
    if !room.registry().register(Arc::clone(&conn)) {
        warn!(username = %conn.username(), "username claimed during upgrade, closing");
        let _ = conn.close().await;
        return SessionEnd::NameTaken;
    }
    if room.ensure_broadcaster() {
        info!("broadcaster activated by first connection");
    }
    info!(
        username = %conn.username(),
        conn_id = %conn.id(),
        members = room.registry().len(),
        "client connected"
    );

    let cancel = room.cancel_token();
    let outcome = reader::run_reader(
        inbound,
        Arc::clone(&conn),
        room.registry(),
        room.dispatcher(),
        &cancel,
    )
    .await;

    info!(
        username = %conn.username(),
        conn_id = %conn.id(),
        reason = outcome.as_str(),
        age_ms = u64::try_from(conn.age().as_millis()).unwrap_or(u64::MAX),
        "client disconnected"
    );
    SessionEnd::Finished(outcome)
}
