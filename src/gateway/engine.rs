//! Presence gateway
//!
//! Bridges the `PresenceTracker` to connected clients:
//! - a start-viewing event joins the topic's broadcast group, records the
//!   viewer and sends the new count to every member, the caller included
//! - a disconnect removes the connection from every topic it viewed, leaves
//!   those groups and sends each topic's new count to the members left
//!
//! Locking:
//! - the registry lock is the gateway's ordering lock; each start or
//!   disconnect runs registration check, tracker update, group change and
//!   frame queueing as one unit under it
//! - lock order is always registry, then tracker; the tracker lock is
//!   released before any frame is queued
//! - queueing a frame is a non-blocking push onto the connection's unbounded
//!   channel; socket writes happen in the connection's own task
//!
//! Because counts are queued in the order the tracker produced them, the last
//! frame each member receives for a topic matches the tracker. Delivery is
//! best-effort per recipient: a member whose channel is gone is logged and
//! skipped.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::client::Client;
use crate::gateway::group::GroupRegistry;
use crate::presence::{ConnectionId, PresenceTracker, TopicId};
use crate::transport::message::{ClientMessage, ServerMessage, now_millis};

#[derive(Debug, Clone)]
pub struct PresenceGateway {
    tracker: Arc<PresenceTracker>,
    registry: Arc<Mutex<GroupRegistry>>,
}

impl PresenceGateway {
    pub fn new(tracker: Arc<PresenceTracker>) -> Self {
        Self {
            tracker,
            registry: Arc::new(Mutex::new(GroupRegistry::new())),
        }
    }

    pub fn tracker(&self) -> &Arc<PresenceTracker> {
        &self.tracker
    }

    /// Register a new connection and return its id.
    pub fn connect(&self, sender: UnboundedSender<WsMessage>) -> ConnectionId {
        let client = Client::new(sender);
        let id = client.id.clone();
        self.registry.lock().register_client(client);
        info!(connection = %id, "client connected");
        id
    }

    /// Register a new connection unless `max_connections` are already live.
    ///
    /// The capacity check and the registration happen under one lock, so a
    /// burst of connections cannot overshoot the limit.
    pub fn try_connect(
        &self,
        sender: UnboundedSender<WsMessage>,
        max_connections: usize,
    ) -> Option<ConnectionId> {
        let client = Client::new(sender);
        let id = client.id.clone();
        {
            let mut registry = self.registry.lock();
            if registry.connection_count() >= max_connections {
                return None;
            }
            registry.register_client(client);
        }
        info!(connection = %id, "client connected");
        Some(id)
    }

    pub fn connection_count(&self) -> usize {
        self.registry.lock().connection_count()
    }

    /// Number of topics with at least one subscribed connection.
    pub fn group_count(&self) -> usize {
        self.registry.lock().groups.len()
    }

    /// Handle "start viewing `topic`" from `connection`.
    ///
    /// Returns the topic's new viewer count, or `None` when the connection is
    /// not registered (already disconnected), in which case nothing is
    /// recorded.
    pub fn start_viewing(&self, connection: &ConnectionId, topic: &str) -> Option<usize> {
        let mut registry = self.registry.lock();
        if !registry.is_registered(connection) {
            drop(registry);
            warn!(connection = %connection, topic, "start_viewing from unknown connection ignored");
            return None;
        }

        registry.join(topic, connection.clone());
        let count = self
            .tracker
            .start_viewing(topic.to_string(), connection.clone());
        let read_at = now_millis();

        push_count(&registry, topic, count, read_at);
        drop(registry);

        debug!(connection = %connection, topic, count, "started viewing");
        Some(count)
    }

    /// Tear down everything `connection` holds and notify the remaining
    /// viewers of each topic it was viewing.
    ///
    /// This is the only cleanup path for a connection. Calling it again for
    /// the same id finds nothing and returns an empty map.
    pub fn disconnect(&self, connection: &ConnectionId) -> HashMap<TopicId, usize> {
        let mut registry = self.registry.lock();

        let counts = self.tracker.stop_viewing_all_topics(connection);
        let read_at = now_millis();

        for topic in counts.keys() {
            registry.leave(topic, connection);
        }
        let removed = registry.remove_client(connection);

        for (topic, count) in &counts {
            push_count(&registry, topic, *count, read_at);
        }
        drop(registry);

        if removed.is_some() {
            info!(connection = %connection, topics = counts.len(), "client disconnected");
        }
        counts
    }

    pub fn viewer_count(&self, topic: &str) -> usize {
        self.tracker.viewer_count(&topic.to_string())
    }

    /// Send `topic`'s current count to every member of its group.
    ///
    /// Returns how many members the frame was handed to.
    pub fn broadcast(&self, topic: &str) -> usize {
        let registry = self.registry.lock();
        let count = self.viewer_count(topic);
        push_count(&registry, topic, count, now_millis())
    }

    /// Send a message to a single connection.
    pub fn reply(&self, connection: &ConnectionId, msg: &ServerMessage) -> bool {
        let Some(sender) = self.registry.lock().sender_of(connection) else {
            return false;
        };

        match msg.to_json() {
            Ok(json) => sender.send(WsMessage::text(json)).is_ok(),
            Err(e) => {
                error!(connection = %connection, error = %e, "failed to serialize reply");
                false
            }
        }
    }

    /// Decode one text frame from `connection` and act on it.
    pub fn handle_text(&self, connection: &ConnectionId, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(ClientMessage::StartViewing { topic }) => {
                self.start_viewing(connection, &topic);
            }
            Ok(ClientMessage::GetViewerCount { topic }) => {
                let count = self.viewer_count(&topic);
                let msg = ServerMessage::viewer_count(topic, count, now_millis());
                self.reply(connection, &msg);
            }
            Err(err) => {
                warn!(
                    connection = %connection,
                    error = %err,
                    frame = %text.chars().take(100).collect::<String>(),
                    "invalid client message"
                );
                self.reply(connection, &ServerMessage::error(format!("invalid message: {err}")));
            }
        }
    }
}

// Queue `topic`'s count for every member of its group. Runs under the
// registry lock so counts leave in the order the tracker produced them.
fn push_count(registry: &GroupRegistry, topic: &str, count: usize, read_at: i64) -> usize {
    let text = match ServerMessage::viewer_count(topic, count, read_at).to_json() {
        Ok(json) => json,
        Err(e) => {
            error!(topic, error = %e, "failed to serialize viewer count");
            return 0;
        }
    };
    let frame = WsMessage::text(text);

    let mut delivered = 0;
    for (id, sender) in registry.recipients(topic) {
        if sender.send(frame.clone()).is_err() {
            warn!(connection = %id, topic, "failed to deliver viewer count");
        } else {
            delivered += 1;
        }
    }
    delivered
}

impl Default for PresenceGateway {
    fn default() -> Self {
        Self::new(Arc::new(PresenceTracker::new()))
    }
}
