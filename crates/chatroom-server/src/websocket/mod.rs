//! WebSocket transport: the upgrade handler and the frame codec.

pub mod codec;
pub mod handler;
