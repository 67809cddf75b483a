//! Server configuration.

use std::time::Duration;

use chatroom_settings::ServerSettings;
use serde::{Deserialize, Serialize};

/// Runtime configuration for the chat server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Capacity of the fan-out queue shared by all readers.
    pub queue_capacity: usize,
    /// Per-recipient write (and close) timeout in milliseconds.
    pub write_timeout_ms: u64,
    /// Max inbound WebSocket message size in bytes.
    pub max_message_size: usize,
    /// How long shutdown waits for tasks to finish, in milliseconds.
    pub shutdown_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            queue_capacity: 256,
            write_timeout_ms: 10_000,
            max_message_size: 64 * 1024,
            shutdown_timeout_ms: 5_000,
        }
    }
}

impl ServerConfig {
    /// Write timeout as a `Duration`.
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Shutdown timeout as a `Duration`.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl From<&ServerSettings> for ServerConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            queue_capacity: settings.queue_capacity,
            write_timeout_ms: settings.write_timeout_ms,
            max_message_size: settings.max_message_size,
            shutdown_timeout_ms: settings.shutdown_timeout_ms,
        }
    }
}
