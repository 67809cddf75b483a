//! # chatroom-server
//!
//! Single-room WebSocket chat: every message a client sends is fanned out to
//! every other connected client.
//!
//! - [`registry::Registry`]: username → connection map behind one `RwLock`
//! - [`reader`]: one loop per connection feeding the shared queue
//! - [`dispatcher::Dispatcher`]: the bounded queue between readers and the writer
//! - [`broadcaster::Broadcaster`]: the single task that writes to clients
//! - [`lifecycle`]: register → activate broadcaster → read → clean up
//! - [`server::ChatServer`]: axum router, listener and graceful shutdown

#![deny(unsafe_code)]

pub mod broadcaster;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod lifecycle;
pub mod reader;
pub mod registry;
pub mod room;
pub mod server;
pub mod shutdown;
pub mod websocket;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::ServerConfig;
pub use room::ChatRoom;
pub use server::ChatServer;
