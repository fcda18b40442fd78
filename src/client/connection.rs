use tokio::sync::mpsc::UnboundedSender;
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

use crate::presence::ConnectionId;

/// One live client connection as seen by the gateway.
///
/// The gateway never writes to the socket directly; it pushes frames into
/// `sender` and the connection's own task forwards them.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for the connection (`client-<uuid>`).
    pub id: ConnectionId,

    /// Channel to send WebSocket messages to the client.
    pub sender: UnboundedSender<WsMessage>,
}

impl Client {
    pub fn new(sender: UnboundedSender<WsMessage>) -> Self {
        Self {
            id: format!("client-{}", Uuid::new_v4()),
            sender,
        }
    }
}
