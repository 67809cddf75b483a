//! The single writer: drains the fan-out queue and delivers each message to
//! every member except its sender.
//!
//! The task is started lazily by the first successful connection and runs
//! until shutdown. A recipient whose write fails or times out is
//! unsubscribed; the round continues with the remaining members.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chatroom_core::ChatMessage;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::Registry;

/// Outcome of one fan-out round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Recipients the message was written to.
    pub delivered: usize,
    /// Recipients whose write failed.
    pub failed: usize,
}

struct State {
    queue: Option<mpsc::Receiver<ChatMessage>>,
    handle: Option<JoinHandle<()>>,
}

/// Owns the receiving end of the queue until the task is started.
pub struct Broadcaster {
    registry: Arc<Registry>,
    state: Mutex<State>,
    active: Arc<AtomicBool>,
    cancel: CancellationToken,
}

/// Clears the active flag however the task ends.
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Broadcaster {
    /// Create an idle broadcaster over `queue`.
    pub fn new(
        registry: Arc<Registry>,
        queue: mpsc::Receiver<ChatMessage>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            registry,
            state: Mutex::new(State {
                queue: Some(queue),
                handle: None,
            }),
            active: Arc::new(AtomicBool::new(false)),
            cancel,
        }
    }

    /// Start the task if it has never run.
    ///
    /// Returns `true` only for the call that started it. Once started, the
    /// task is never relaunched, even after it stops.
    pub fn ensure_running(&self) -> bool {
        let mut state = self.state.lock();
        if self.cancel.is_cancelled() {
            return false;
        }
        let Some(queue) = state.queue.take() else {
            return false;
        };
        self.active.store(true, Ordering::Release);
        let guard = ActiveGuard(Arc::clone(&self.active));
        state.handle = Some(tokio::spawn(run(
            Arc::clone(&self.registry),
            queue,
            self.cancel.clone(),
            guard,
        )));
        true
    }

    /// Whether the task is currently running.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Take the task handle so shutdown can await it.
    pub fn take_handle(&self) -> Option<JoinHandle<()>> {
        self.state.lock().handle.take()
    }
}

async fn run(
    registry: Arc<Registry>,
    mut queue: mpsc::Receiver<ChatMessage>,
    cancel: CancellationToken,
    _guard: ActiveGuard,
) {
    info!("broadcaster started");
    loop {
        let message = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = queue.recv() => match next {
                Some(message) => message,
                None => break,
            },
        };
        let _ = fan_out(&registry, &message).await;
    }
    info!("broadcaster stopped");
}

/// Deliver `message` to every current member except its sender.
///
/// Works on a snapshot taken at the start of the round; members that join
/// mid-round wait for the next message.
pub async fn fan_out(registry: &Registry, message: &ChatMessage) -> FanOut {
    let mut report = FanOut::default();
    let payload = match message.to_json() {
        Ok(payload) => payload,
        Err(e) => {
            warn!(username = %message.username, error = %e, "failed to encode message");
            return report;
        }
    };

    for conn in registry.snapshot() {
        if message.is_from(conn.username()) {
            continue;
        }
        match conn.send_text(&payload).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                report.failed += 1;
                warn!(
                    username = %conn.username(),
                    conn_id = %conn.id(),
                    error_kind = e.error_kind(),
                    error = %e,
                    "write failed, dropping recipient"
                );
                let _ = registry.unsubscribe_connection(&conn).await;
            }
        }
    }

    debug!(
        sender = %message.username,
        recipients = report.delivered + report.failed,
        delivered = report.delivered,
        failed = report.failed,
        "fan-out complete"
    );
    report
}
