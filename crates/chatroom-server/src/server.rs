//! `ChatServer`: axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::room::ChatRoom;
use crate::websocket::handler::ws_handler;

/// The chat server.
pub struct ChatServer {
    config: ServerConfig,
    room: Arc<ChatRoom>,
}

impl ChatServer {
    /// Create a new server with an empty room.
    pub fn new(config: ServerConfig) -> Self {
        let room = Arc::new(ChatRoom::new(config.clone()));
        Self { config, room }
    }

    /// Build the Axum router. Every path except `/ws` is a 404.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/ws", get(ws_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::clone(&self.room))
    }

    /// Bind the listener and serve in the background.
    ///
    /// Returns the bound address and the serve task, which finishes once
    /// [`ChatServer::shutdown`] has been called.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr()).await?;
        let local_addr = listener.local_addr()?;
        let router = self.router();
        let cancel = self.room.cancel_token();

        info!(%local_addr, "chat server listening");
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(cancel.cancelled_owned())
                .await
            {
                error!(error = %e, "server error");
            }
        });
        Ok((local_addr, handle))
    }

    /// The shared room.
    pub fn room(&self) -> &Arc<ChatRoom> {
        &self.room
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Stop accepting connections and drain the room within the configured
    /// shutdown timeout. Returns `false` if the timeout elapsed.
    pub async fn shutdown(&self) -> bool {
        info!("shutting down");
        self.room.shutdown(self.config.shutdown_timeout()).await
    }
}
