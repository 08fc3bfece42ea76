//! # FlowDeck API
//!
//! External interface of the FlowDeck workflow service.
//!
//! - **HTTP**: REST endpoints to start, inspect, pause, resume and stop workflows
//! - **WebSocket**: real-time lifecycle events and subscription control
//!
//! Handlers are thin: every operation is a call into
//! [`flowdeck_engine::WorkflowEngine`], and engine errors are mapped to HTTP
//! statuses by [`InterfaceError`].

pub mod error;
pub mod http;
pub mod server;
pub mod state;
pub mod websocket;

pub use error::InterfaceError;
pub use http::{
    create_router,
    handlers::{ExecuteRequest, HistoryQuery},
};
pub use server::{InterfaceConfig, InterfaceServer};
pub use state::AppState;
pub use websocket::WsMessage;
