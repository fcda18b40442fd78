//! The `gateway` module connects the presence tracker to live clients.
//!
//! It owns the broadcast-group registry (which connections receive updates
//! for which topic) and the `PresenceGateway`, which turns client events into
//! tracker calls and tracker results into broadcasts.

pub mod engine;
pub mod group;

pub use engine::PresenceGateway;
pub use group::{Group, GroupRegistry};
