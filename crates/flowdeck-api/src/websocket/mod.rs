//! WebSocket interface module.
//!
//! Streams workflow lifecycle events to connected clients and accepts
//! subscription control frames.

mod handler;
mod message;

pub use handler::ws_handler;
pub use message::WsMessage;
