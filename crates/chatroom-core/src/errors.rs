use std::time::Duration;

/// Reasons a connect request is rejected before the WebSocket upgrade.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    #[error("username is required")]
    MissingUsername,
    #[error("username already taken: {0}")]
    UsernameTaken(String),
    #[error("server is shutting down")]
    ShuttingDown,
}

impl ConnectError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::MissingUsername => "missing_username",
            Self::UsernameTaken(_) => "username_taken",
            Self::ShuttingDown => "shutting_down",
        }
    }
}

/// Failures reading from or writing to one client's transport.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,
    #[error("transport error: {0}")]
    Io(String),
    #[error("malformed payload: {0}")]
    Decode(String),
    #[error("unexpected {0} frame")]
    UnexpectedFrame(&'static str),
    #[error("write timed out after {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Io(_) => "io",
            Self::Decode(_) => "decode",
            Self::UnexpectedFrame(_) => "unexpected_frame",
            Self::Timeout(_) => "timeout",
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        TransportError::Decode(e.to_string())
    }
}

/// The fan-out queue has no consumer left.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("dispatch queue closed")]
    Closed,
}
