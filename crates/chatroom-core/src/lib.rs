//! # chatroom-core
//!
//! Types shared by every chatroom crate:
//!
//! - [`Username`]: the validated identity a client claims on connect
//! - [`ChatMessage`]: the `{username, text}` payload carried on the wire
//! - [`ConnectionId`]: server-side id telling apart successive connections
//! - error enums for connect validation, transport and dispatch failures

#![deny(unsafe_code)]

pub mod errors;
pub mod identity;
pub mod ids;
pub mod message;

pub use errors::{ConnectError, DispatchError, TransportError};
pub use identity::Username;
pub use ids::ConnectionId;
pub use message::ChatMessage;
