//! Shared chat state: registry, fan-out queue, broadcaster and shutdown.

use std::sync::Arc;
use std::time::Duration;

use chatroom_core::{ConnectError, Username};
use tokio_util::sync::CancellationToken;
use tokio_util::task::task_tracker::TrackedFuture;
use tracing::info;

use crate::broadcaster::Broadcaster;
use crate::config::ServerConfig;
use crate::dispatcher::{self, Dispatcher};
use crate::registry::Registry;
use crate::shutdown::ShutdownCoordinator;

/// The one chat room served by this process.
pub struct ChatRoom {
    config: ServerConfig,
    registry: Arc<Registry>,
    dispatcher: Dispatcher,
    broadcaster: Broadcaster,
    shutdown: ShutdownCoordinator,
}

impl ChatRoom {
    /// Create an empty room. The broadcaster stays idle until the first
    /// connection registers.
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(Registry::new());
        let shutdown = ShutdownCoordinator::new();
        let (dispatcher, queue) = dispatcher::channel(config.queue_capacity);
        let broadcaster = Broadcaster::new(Arc::clone(&registry), queue, shutdown.token());
        Self {
            config,
            registry,
            dispatcher,
            broadcaster,
            shutdown,
        }
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Connected clients.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Sending half of the fan-out queue.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Check a connect request before upgrading.
    ///
    /// The name check is advisory: registration after the upgrade makes the
    /// final decision.
    pub fn admit(&self, raw: Option<String>) -> Result<Username, ConnectError> {
        let username = Username::from_query(raw)?;
        if self.is_shutting_down() {
            return Err(ConnectError::ShuttingDown);
        }
        if self.registry.contains(username.as_str()) {
            return Err(ConnectError::UsernameTaken(username.into()));
        }
        Ok(username)
    }

    /// Start the broadcaster if it has never run. Returns whether this call
    /// started it.
    pub fn ensure_broadcaster(&self) -> bool {
        self.broadcaster.ensure_running()
    }

    /// Whether the broadcaster task is running.
    pub fn is_broadcasting(&self) -> bool {
        self.broadcaster.is_active()
    }

    /// Whether shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_shutting_down()
    }

    /// Token cancelled when shutdown begins.
    pub fn cancel_token(&self) -> CancellationToken {
        self.shutdown.token()
    }

    /// Track a connection task so shutdown waits for it.
    pub fn track<F: Future>(&self, future: F) -> TrackedFuture<F> {
        self.shutdown.track(future)
    }

    /// Stop accepting work, close every connection and wait up to `timeout`
    /// for the broadcaster and connection tasks to finish.
    ///
    /// Returns `false` if the timeout elapsed first.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.shutdown.shutdown();
        let closed = self.registry.close_all().await;
        info!(closed, "closed all connections");
        let handles = self.broadcaster.take_handle().into_iter().collect();
        self.shutdown.graceful_shutdown(handles, timeout).await
    }
}
