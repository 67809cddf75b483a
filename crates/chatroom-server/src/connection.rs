//! One registered client: its identity plus the write half of its transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chatroom_core::{ConnectionId, TransportError, Username};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Write half of a client transport.
///
/// The WebSocket implementation lives in [`crate::websocket::codec`]; tests
/// use in-memory sinks.
#[async_trait]
pub trait ChatSink: Send {
    /// Send one encoded text frame.
    async fn send_text(&mut self, text: &str) -> Result<(), TransportError>;

    /// Send a normal-closure frame and shut the write half.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// A connected client.
///
/// All writes and the close go through one async mutex, so a transport
/// never sees two concurrent writers.
pub struct Connection {
    id: ConnectionId,
    username: Username,
    sink: Mutex<Box<dyn ChatSink>>,
    closed: AtomicBool,
    closed_signal: CancellationToken,
    write_timeout: Duration,
    connected_at: Instant,
}

impl Connection {
    /// Wrap a sink for `username`. Each write (and the close) is bounded by
    /// `write_timeout`.
    pub fn new(username: Username, sink: impl ChatSink + 'static, write_timeout: Duration) -> Self {
        Self {
            id: ConnectionId::new(),
            username,
            sink: Mutex::new(Box::new(sink)),
            closed: AtomicBool::new(false),
            closed_signal: CancellationToken::new(),
            write_timeout,
            connected_at: Instant::now(),
        }
    }

    /// Unique id for this transport.
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// The identity this connection registered under.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Whether [`Connection::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Resolves once [`Connection::close`] has been called.
    pub async fn closed(&self) {
        self.closed_signal.cancelled().await;
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Send one encoded frame.
    pub async fn send_text(&self, text: &str) -> Result<(), TransportError> {
        let mut sink = self.sink.lock().await;
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        match tokio::time::timeout(self.write_timeout, sink.send_text(text)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.write_timeout)),
        }
    }

    /// Close the transport with a normal-closure status.
    ///
    /// Only the first call touches the transport; returns whether this call
    /// was the one that closed it. Close failures are logged and swallowed.
    pub async fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.closed_signal.cancel();
        let mut sink = self.sink.lock().await;
        match tokio::time::timeout(self.write_timeout, sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(conn_id = %self.id, username = %self.username, error = %e, "close failed");
            }
            Err(_) => {
                debug!(conn_id = %self.id, username = %self.username, "close timed out");
            }
        }
        true
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
