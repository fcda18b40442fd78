//! # PresenceHub
//!
//! `presencehub` is an in-memory, real-time viewer-count service. Clients
//! connect over WebSockets, announce which topic (for example a dish) they
//! are looking at, and every viewer of that topic receives the live number
//! of viewers as people arrive and leave.
//!
//! State lives only in process memory and resets on restart.
//!
//! ## Core Modules
//!
//! - `presence`: the `PresenceTracker`, topic <-> connection indexes behind one lock.
//! - `gateway`: broadcast groups and the adapter from client events to tracker calls.
//! - `client`: a connected client's id and outbound channel.
//! - `transport`: the JSON protocol and the WebSocket server.
//! - `config`: loading server configuration from file and environment.
//! - `utils`: error type and logging setup.

pub mod client;
pub mod config;
pub mod gateway;
pub mod presence;
pub mod transport;
pub mod utils;

pub use gateway::PresenceGateway;
pub use presence::PresenceTracker;
pub use utils::{Error, Result};
