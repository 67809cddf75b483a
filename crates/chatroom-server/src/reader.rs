//! Per-connection read loop.

use std::sync::Arc;

use chatroom_core::{ChatMessage, TransportError};
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::connection::Connection;
use crate::dispatcher::Dispatcher;
use crate::registry::Registry;

/// Why a read loop ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The peer closed or the stream ended.
    Closed,
    /// A read or decode failed.
    Failed(TransportError),
    /// The server closed this connection, e.g. after a failed write.
    Evicted,
    /// The server is shutting down.
    Cancelled,
    /// The broadcaster is gone.
    QueueClosed,
}

impl ReadOutcome {
    /// Short label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Failed(e) => e.error_kind(),
            Self::Evicted => "evicted",
            Self::Cancelled => "cancelled",
            Self::QueueClosed => "queue_closed",
        }
    }
}

/// Read decoded messages from `inbound`, stamp them with the connection's
/// identity and hand them to `dispatcher`, in arrival order.
///
/// The loop ends on the first close, read error, decode error, cancellation
/// or closed queue, and as soon as `conn` itself is closed: an evicted
/// connection never dispatches again. On exit the connection is unsubscribed
/// (if it is still the registered holder of its name).
pub async fn run_reader<S>(
    mut inbound: S,
    conn: Arc<Connection>,
    registry: &Registry,
    dispatcher: &Dispatcher,
    cancel: &CancellationToken,
) -> ReadOutcome
where
    S: Stream<Item = Result<ChatMessage, TransportError>> + Unpin,
{
    let outcome = loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => break ReadOutcome::Cancelled,
            () = conn.closed() => break ReadOutcome::Evicted,
            next = inbound.next() => next,
        };

        let message = match next {
            Some(Ok(message)) => message.stamped(conn.username()),
            Some(Err(TransportError::Closed)) | None => break ReadOutcome::Closed,
            Some(Err(e)) => break ReadOutcome::Failed(e),
        };
        if conn.is_closed() {
            break ReadOutcome::Evicted;
        }
        info!(
            username = %message.username,
            text = %message.text,
            queued = dispatcher.pending(),
            "received message"
        );

        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => break ReadOutcome::Cancelled,
            () = conn.closed() => break ReadOutcome::Evicted,
            sent = dispatcher.dispatch(message) => sent,
        };
        if sent.is_err() {
            break ReadOutcome::QueueClosed;
        }
    };

    debug!(
        username = %conn.username(),
        conn_id = %conn.id(),
        reason = outcome.as_str(),
        "read loop ended"
    );
    let _ = registry.unsubscribe_connection(&conn).await;
    outcome
}
