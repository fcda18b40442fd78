//! WebSocket transport
//!
//! Accepts TCP/WebSocket connections and drives one `PresenceGateway`
//! session per connection:
//! - register the connection with the gateway and get its outbound channel
//! - forward queued frames to the socket and inbound text frames to the
//!   gateway from a single loop
//! - when the loop ends (close frame, end of stream, read or write error)
//!   run the gateway's disconnect cleanup exactly once
//!
//! Liveness of half-open sockets is left to TCP and the WebSocket layer;
//! there is no sweep of idle connections here.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{WebSocketStream, accept_async};
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::config::Settings;
use crate::gateway::PresenceGateway;
use crate::transport::message::ServerMessage;
use crate::utils::Result;

pub async fn start_websocket_server(
    addr: String,
    gateway: PresenceGateway,
    settings: Settings,
) -> Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    let max_connections = settings.gateway.max_connections;

    info!("WebSocket server listening on ws://{addr}");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "TCP accept error");
                continue;
            }
        };
        let gateway = gateway.clone();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    warn!(peer = %peer, error = %e, "WebSocket handshake error");
                    return;
                }
            };
            handle_connection(ws_stream, peer, gateway, max_connections).await;
        });
    }
}

async fn handle_connection(
    ws_stream: WebSocketStream<TcpStream>,
    peer: SocketAddr,
    gateway: PresenceGateway,
    max_connections: usize,
) {
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let Some(client_id) = gateway.try_connect(tx, max_connections) else {
        warn!(peer = %peer, max_connections, "connection refused, server at capacity");
        match ServerMessage::error("server at capacity").to_json() {
            Ok(json) => {
                if let Err(e) = ws_sender.send(WsMessage::text(json)).await {
                    debug!(peer = %peer, error = %e, "failed to send capacity error");
                }
            }
            Err(e) => debug!(peer = %peer, error = %e, "failed to serialize capacity error"),
        }
        if let Err(e) = ws_sender.close().await {
            debug!(peer = %peer, error = %e, "failed to close refused connection");
        }
        return;
    };
    debug!(connection = %client_id, peer = %peer, "session started");

    loop {
        tokio::select! {
            Some(msg) = rx.recv() => {
                if let Err(e) = ws_sender.send(msg).await {
                    debug!(connection = %client_id, error = %e, "failed to send frame");
                    break;
                }
            }

            frame = ws_receiver.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => gateway.handle_text(&client_id, &text),
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(connection = %client_id, error = %e, "read error");
                        break;
                    }
                }
            }
        }
    }

    gateway.disconnect(&client_id);
    debug!(connection = %client_id, peer = %peer, "session closed");
}
