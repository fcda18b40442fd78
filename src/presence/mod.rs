//! The `presence` module tracks which connections are viewing which topics.
//!
//! It is a plain lock-protected data structure with no knowledge of sockets
//! or broadcasting; the `gateway` module drives it and fans results out to
//! clients.

pub mod tracker;

pub use tracker::{ConnectionId, PresenceTracker, TopicId};

#[cfg(test)]
mod tests;
