//! Broadcast groups
//!
//! A `Group` is the set of connections that receive count updates for one
//! topic. `GroupRegistry` owns every live `Client` plus the topic groups,
//! and is the only connection state the gateway keeps.
//!
//! Callers synchronize access to the registry (the gateway holds it behind
//! a mutex). Frames are only queued onto each client's unbounded channel;
//! nothing here touches a socket.

use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc::UnboundedSender;
use tungstenite::protocol::Message as WsMessage;

use crate::client::Client;
use crate::presence::{ConnectionId, TopicId};

#[derive(Debug, Default)]
pub struct Group {
    pub members: HashSet<ConnectionId>,
}

impl Group {
    /// Add a member to the group. Duplicate adds are ignored.
    pub fn join(&mut self, id: ConnectionId) {
        self.members.insert(id);
    }

    pub fn leave(&mut self, id: &ConnectionId) {
        self.members.remove(id);
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct GroupRegistry {
    pub groups: HashMap<TopicId, Group>,
    pub clients: HashMap<ConnectionId, Client>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_client(&mut self, client: Client) {
        self.clients.insert(client.id.clone(), client);
    }

    pub fn is_registered(&self, id: &ConnectionId) -> bool {
        self.clients.contains_key(id)
    }

    /// Subscribe a connection to a topic's group, creating the group if needed.
    pub fn join(&mut self, topic: &str, id: ConnectionId) {
        self.groups.entry(topic.to_string()).or_default().join(id);
    }

    /// Unsubscribe a connection from a topic's group; an emptied group is dropped.
    pub fn leave(&mut self, topic: &str, id: &ConnectionId) {
        if let Some(group) = self.groups.get_mut(topic) {
            group.leave(id);
            if group.is_empty() {
                self.groups.remove(topic);
            }
        }
    }

    /// Remove a client from the registry. Group membership is left to the
    /// caller, which knows the client's topics from the tracker.
    ///
    /// Dropping the client drops its sender, which ends the connection's
    /// forwarding loop once nothing else holds a clone.
    pub fn remove_client(&mut self, id: &ConnectionId) -> Option<Client> {
        self.clients.remove(id)
    }

    /// Senders of every registered member of `topic`'s group.
    pub fn recipients(&self, topic: &str) -> Vec<(ConnectionId, UnboundedSender<WsMessage>)> {
        let Some(group) = self.groups.get(topic) else {
            return Vec::new();
        };

        group
            .members
            .iter()
            .filter_map(|id| {
                self.clients
                    .get(id)
                    .map(|client| (id.clone(), client.sender.clone()))
            })
            .collect()
    }

    pub fn sender_of(&self, id: &ConnectionId) -> Option<UnboundedSender<WsMessage>> {
        self.clients.get(id).map(|client| client.sender.clone())
    }

    pub fn connection_count(&self) -> usize {
        self.clients.len()
    }
}
