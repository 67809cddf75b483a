//! Frame ↔ [`ChatMessage`] translation over an axum [`WebSocket`].

use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message as WsMessage, WebSocket, close_code};
use chatroom_core::{ChatMessage, TransportError};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, Stream, StreamExt, future};

use crate::connection::ChatSink;

/// Decode one inbound frame.
///
/// Text frames carry one JSON message. Ping and pong are handled by the
/// transport and yield `None`. A close frame becomes
/// [`TransportError::Closed`]; binary frames are a protocol error.
pub fn decode_frame(frame: WsMessage) -> Option<Result<ChatMessage, TransportError>> {
    match frame {
        WsMessage::Text(text) => Some(ChatMessage::from_json(text.as_str()).map_err(Into::into)),
        WsMessage::Binary(_) => Some(Err(TransportError::UnexpectedFrame("binary"))),
        WsMessage::Close(_) => Some(Err(TransportError::Closed)),
        WsMessage::Ping(_) | WsMessage::Pong(_) => None,
    }
}

/// Turn the read half of a socket into a stream of decoded messages.
pub fn inbound(
    stream: SplitStream<WebSocket>,
) -> impl Stream<Item = Result<ChatMessage, TransportError>> + Unpin + Send {
    stream.filter_map(|frame| {
        future::ready(match frame {
            Ok(frame) => decode_frame(frame),
            Err(e) => Some(Err(TransportError::Io(e.to_string()))),
        })
    })
}

/// Write half of an axum WebSocket.
pub struct WsSink {
    inner: SplitSink<WebSocket, WsMessage>,
}

impl WsSink {
    /// Wrap the write half of a split socket.
    pub fn new(inner: SplitSink<WebSocket, WsMessage>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ChatSink for WsSink {
    async fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.inner
            .send(WsMessage::Text(text.to_owned().into()))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let frame = CloseFrame {
            code: close_code::NORMAL,
            reason: "".into(),
        };
        self.inner
            .send(WsMessage::Close(Some(frame)))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }
}
