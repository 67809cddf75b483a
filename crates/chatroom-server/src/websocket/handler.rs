//! `GET /ws?username=<name>`: validate, upgrade, hand off to the lifecycle.

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chatroom_core::{ConnectError, Username};
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, warn};

use super::codec::{self, WsSink};
use crate::lifecycle;
use crate::room::ChatRoom;

/// Query string of a connect request.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    /// Identity the client claims.
    pub username: Option<String>,
}

/// HTTP status for a rejected connect request.
pub fn rejection_status(err: &ConnectError) -> StatusCode {
    match err {
        ConnectError::MissingUsername | ConnectError::UsernameTaken(_) => StatusCode::BAD_REQUEST,
        ConnectError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// WebSocket upgrade handler.
///
/// The identity is checked before the upgrade so a bad request gets a plain
/// HTTP error. A request that passes the checks but is not a WebSocket
/// handshake gets the extractor's rejection: 400 when the `Connection` or
/// `Upgrade` headers are missing, 426 when the connection cannot be upgraded.
pub async fn ws_handler(
    State(room): State<Arc<ChatRoom>>,
    Query(query): Query<ConnectQuery>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let username = match room.admit(query.username) {
        Ok(username) => username,
        Err(e) => {
            warn!(error_kind = e.error_kind(), error = %e, "connect rejected");
            return (rejection_status(&e), e.to_string()).into_response();
        }
    };

    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => {
            debug!(username = %username, error = %rejection, "not a websocket handshake");
            return rejection.into_response();
        }
    };

    let max_message_size = room.config().max_message_size;
    upgrade
        .max_message_size(max_message_size)
        .on_failed_upgrade(|e: axum::Error| warn!(error = %e, "websocket upgrade failed"))
        .on_upgrade(move |socket| {
            let session = handle_socket(socket, username, Arc::clone(&room));
            room.track(session)
        })
}

/// Run one upgraded socket through the connection lifecycle.
async fn handle_socket(socket: WebSocket, username: Username, room: Arc<ChatRoom>) {
    let (sink, stream) = socket.split();
    let _ = lifecycle::serve_connection(&room, username, WsSink::new(sink), codec::inbound(stream)).await;
}
