//! In-memory sinks and helpers shared by unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chatroom_core::{ChatMessage, TransportError, Username};
use tokio::sync::{Notify, mpsc};

use crate::connection::{ChatSink, Connection};

pub(crate) const TIMEOUT: Duration = Duration::from_secs(2);

pub(crate) fn name(s: &str) -> Username {
    Username::parse(s).unwrap()
}

#[derive(Default)]
struct TapState {
    fail_writes: AtomicBool,
    closes: AtomicUsize,
}

/// Sink that forwards every frame into an unbounded channel.
pub(crate) struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
    state: Arc<TapState>,
}

/// Test-side view of a [`ChannelSink`].
pub(crate) struct SinkTap {
    rx: mpsc::UnboundedReceiver<String>,
    state: Arc<TapState>,
}

pub(crate) fn channel_sink() -> (ChannelSink, SinkTap) {
    let (tx, rx) = mpsc::unbounded_channel();
    let state = Arc::new(TapState::default());
    (
        ChannelSink {
            tx,
            state: Arc::clone(&state),
        },
        SinkTap { rx, state },
    )
}

#[async_trait]
impl ChatSink for ChannelSink {
    async fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        if self.state.fail_writes.load(Ordering::Acquire) {
            return Err(TransportError::Io("broken pipe".into()));
        }
        self.tx
            .send(text.to_owned())
            .map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let _ = self.state.closes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

impl SinkTap {
    /// Make every later write fail.
    pub(crate) fn fail_writes(&self) {
        self.state.fail_writes.store(true, Ordering::Release);
    }

    pub(crate) fn close_count(&self) -> usize {
        self.state.closes.load(Ordering::Acquire)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.close_count() > 0
    }

    /// Next delivered message, or `None` after [`TIMEOUT`].
    pub(crate) async fn recv(&mut self) -> Option<ChatMessage> {
        let raw = tokio::time::timeout(TIMEOUT, self.rx.recv()).await.ok()??;
        Some(ChatMessage::from_json(&raw).unwrap())
    }

    /// A message already delivered, without waiting.
    pub(crate) fn try_recv(&mut self) -> Option<ChatMessage> {
        let raw = self.rx.try_recv().ok()?;
        Some(ChatMessage::from_json(&raw).unwrap())
    }
}

/// Sink whose writes and close never complete.
pub(crate) struct StallingSink;

#[async_trait]
impl ChatSink for StallingSink {
    async fn send_text(&mut self, _text: &str) -> Result<(), TransportError> {
        std::future::pending().await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        std::future::pending().await
    }
}

/// Sink that signals `entered` on each write, then waits for `release`.
pub(crate) struct GatedSink {
    inner: ChannelSink,
    pub(crate) entered: Arc<Notify>,
    pub(crate) release: Arc<Notify>,
}

pub(crate) fn gated_sink() -> (GatedSink, SinkTap) {
    let (inner, tap) = channel_sink();
    (
        GatedSink {
            inner,
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        },
        tap,
    )
}

#[async_trait]
impl ChatSink for GatedSink {
    async fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.send_text(text).await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.inner.close().await
    }
}

/// A registered-ready connection backed by a [`ChannelSink`].
pub(crate) fn connection(username: &str) -> (Arc<Connection>, SinkTap) {
    let (sink, tap) = channel_sink();
    (
        Arc::new(Connection::new(name(username), sink, TIMEOUT)),
        tap,
    )
}
