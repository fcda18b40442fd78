//! CLI for PresenceHub
//!
//! Subcommands:
//! - `server`: run the WebSocket server
//! - `watch`: view a topic and print viewer-count updates (useful for smoke tests)

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use presencehub::config::{Settings, load_config};
use presencehub::transport::{ServerMessage, start_websocket_server};
use presencehub::utils::logging;
use presencehub::{PresenceGateway, PresenceTracker};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "presencehub", about = "Real-time viewer counts over WebSockets")]
enum Command {
    /// Start the WebSocket server
    Server,
    /// Start viewing a topic and print every viewer-count update
    Watch {
        /// WebSocket server URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:8080")]
        url: String,

        /// Topic to view
        #[arg(long)]
        topic: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cmd = Command::parse();

    let result = match cmd {
        Command::Server => match load_config() {
            Ok(config) => {
                logging::init(&config.log.level);
                run_server(config).await
            }
            Err(e) => {
                logging::init("info");
                Err(e.into())
            }
        },
        Command::Watch { url, topic } => {
            logging::init("info");
            run_watch(&url, &topic).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_server(config: Settings) -> presencehub::Result<()> {
    let tracker = Arc::new(PresenceTracker::new());
    let gateway = PresenceGateway::new(tracker);

    tokio::select! {
        res = start_websocket_server(config.bind_addr(), gateway, config.clone()) => res?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

async fn run_watch(url: &str, topic: &str) -> presencehub::Result<()> {
    use futures_util::{SinkExt, StreamExt};
    use serde_json::json;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    let (mut ws_stream, _response) = connect_async(url).await?;

    let start = json!({ "type": "start_viewing", "topic": topic });
    ws_stream
        .send(WsMessage::text(start.to_string()))
        .await?;

    while let Some(frame) = ws_stream.next().await {
        let WsMessage::Text(text) = frame? else {
            continue;
        };
        match serde_json::from_str::<ServerMessage>(&text)? {
            ServerMessage::ViewerCount { topic, count, .. } => {
                println!("{topic}: {count} viewing");
            }
            ServerMessage::Error { message } => {
                error!("server error: {message}");
            }
        }
    }

    info!("Server closed the connection");
    Ok(())
}
