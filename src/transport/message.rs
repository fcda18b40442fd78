//! JSON wire protocol
//!
//! Every frame is a text frame holding one object tagged by `type`.
//! The server uses a single payload shape for count updates, whether they
//! stem from a viewer joining, a viewer disconnecting, or a direct query.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "start_viewing")]
    StartViewing { topic: String },

    #[serde(rename = "get_viewer_count")]
    GetViewerCount { topic: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "viewer_count")]
    ViewerCount {
        topic: String,
        count: usize,
        /// Milliseconds since UNIX epoch at which the count was read.
        timestamp: i64,
    },

    #[serde(rename = "error")]
    Error { message: String },
}

/// Milliseconds since UNIX epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl ServerMessage {
    /// `read_at` is when `count` was read from the tracker, see `now_millis`.
    pub fn viewer_count(topic: impl Into<String>, count: usize, read_at: i64) -> Self {
        Self::ViewerCount {
            topic: topic.into(),
            count,
            timestamp: read_at,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
