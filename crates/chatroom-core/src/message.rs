//! The chat payload exchanged with clients.

use serde::{Deserialize, Serialize};

use crate::identity::Username;

/// One chat message.
///
/// On the wire this is `{"username": "...", "text": "..."}`. Both fields may
/// be omitted by clients; unknown fields are ignored. The `username` a client
/// sends is never trusted: readers overwrite it via [`ChatMessage::stamped`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender identity.
    #[serde(default)]
    pub username: String,
    /// Message body.
    #[serde(default)]
    pub text: String,
}

impl ChatMessage {
    /// Build a message from a known sender.
    pub fn new(sender: &Username, text: impl Into<String>) -> Self {
        Self {
            username: sender.as_str().to_owned(),
            text: text.into(),
        }
    }

    /// Replace the claimed sender with the authenticated one.
    #[must_use]
    pub fn stamped(mut self, sender: &Username) -> Self {
        sender.as_str().clone_into(&mut self.username);
        self
    }

    /// Whether `name` sent this message.
    pub fn is_from(&self, name: &Username) -> bool {
        self.username == name.as_str()
    }

    /// Decode a JSON text frame.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Encode as a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
