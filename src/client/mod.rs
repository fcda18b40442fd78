//! The `client` module defines the representation of a connected client.
//!
//! It provides the `Client` struct, which pairs a connection's unique
//! identifier with the channel used to push frames to it.

pub mod connection;
pub use connection::Client;
