//! Presence tracker
//!
//! Holds two inverse indexes behind a single lock:
//! - topic -> connections currently viewing it
//! - connection -> topics it is currently viewing
//!
//! Both maps are updated together under one `Mutex`, so for every pair
//! `(topic, conn)` membership in one map implies membership in the other.
//! Keys only exist while their set is non-empty.
//!
//! Concurrency notes:
//! - Every operation is pure in-memory work; the lock is never held across
//!   I/O. Callers that broadcast results (the gateway) do so after the call
//!   returns.
//! - Per-topic locking would need a second lock for the reverse index, so a
//!   single coarse lock is used for both.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use parking_lot::Mutex;

pub type TopicId = String;
pub type ConnectionId = String;

struct PresenceState<T, C> {
    viewers: HashMap<T, HashSet<C>>,
    watching: HashMap<C, HashSet<T>>,
}

pub struct PresenceTracker<T = TopicId, C = ConnectionId> {
    state: Mutex<PresenceState<T, C>>,
}

impl<T, C> PresenceTracker<T, C>
where
    T: Eq + Hash + Clone,
    C: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PresenceState {
                viewers: HashMap::new(),
                watching: HashMap::new(),
            }),
        }
    }

    /// Record `connection` as viewing `topic` and return the topic's viewer
    /// count after the insert. Repeating the call for a pair that is already
    /// recorded leaves the sets untouched and returns the unchanged count.
    pub fn start_viewing(&self, topic: T, connection: C) -> usize {
        let mut state = self.state.lock();

        state
            .watching
            .entry(connection.clone())
            .or_default()
            .insert(topic.clone());

        let viewers = state.viewers.entry(topic).or_default();
        viewers.insert(connection);
        viewers.len()
    }

    /// Remove `connection` from every topic it views.
    ///
    /// Returns the new viewer count of each affected topic. Topics that
    /// dropped to zero are reported with `0` and no longer exist in the
    /// tracker once this returns. A connection with nothing recorded yields
    /// an empty map.
    pub fn stop_viewing_all_topics(&self, connection: &C) -> HashMap<T, usize> {
        let mut state = self.state.lock();

        let Some(topics) = state.watching.remove(connection) else {
            return HashMap::new();
        };

        let mut counts = HashMap::with_capacity(topics.len());
        for topic in topics {
            let remaining = match state.viewers.get_mut(&topic) {
                Some(viewers) => {
                    viewers.remove(connection);
                    viewers.len()
                }
                None => 0,
            };

            if remaining == 0 {
                state.viewers.remove(&topic);
            }
            counts.insert(topic, remaining);
        }

        counts
    }

    /// Current number of viewers of `topic`, `0` if nobody is viewing it.
    pub fn viewer_count(&self, topic: &T) -> usize {
        self.state
            .lock()
            .viewers
            .get(topic)
            .map_or(0, HashSet::len)
    }

    pub fn is_viewing(&self, topic: &T, connection: &C) -> bool {
        self.state
            .lock()
            .viewers
            .get(topic)
            .is_some_and(|viewers| viewers.contains(connection))
    }

    pub fn viewers_of(&self, topic: &T) -> Vec<C> {
        self.state
            .lock()
            .viewers
            .get(topic)
            .map(|viewers| viewers.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn topics_of(&self, connection: &C) -> Vec<T> {
        self.state
            .lock()
            .watching
            .get(connection)
            .map(|topics| topics.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Topics with at least one viewer.
    pub fn active_topics(&self) -> Vec<T> {
        self.state.lock().viewers.keys().cloned().collect()
    }

    /// Connections viewing at least one topic.
    pub fn active_connections(&self) -> Vec<C> {
        self.state.lock().watching.keys().cloned().collect()
    }

    /// Viewer count of every active topic, read as one snapshot.
    pub fn counts(&self) -> HashMap<T, usize> {
        self.state
            .lock()
            .viewers
            .iter()
            .map(|(topic, viewers)| (topic.clone(), viewers.len()))
            .collect()
    }
}

impl<T, C> Default for PresenceTracker<T, C>
where
    T: Eq + Hash + Clone,
    C: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> fmt::Debug for PresenceTracker<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PresenceTracker")
            .field("topics", &state.viewers.len())
            .field("connections", &state.watching.len())
            .finish()
    }
}
