//! The `transport` module is responsible for network communication with
//! clients over WebSockets.
//!
//! It defines the JSON protocol spoken between clients and the server and
//! implements the WebSocket server, which hands every connection's events to
//! the presence gateway.

pub mod message;
pub mod websocket;

pub use message::{ClientMessage, ServerMessage};
pub use websocket::start_websocket_server;
