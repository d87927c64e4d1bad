use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::models::{ClientMessage, ServerMessage};

use super::registry::ChannelRegistry;

/// WebSocket handler for `/ws/:channel_id`
pub async fn ws_handler(
    Path(channel_id): Path<String>,
    ws: WebSocketUpgrade,
    State(registry): State<Arc<ChannelRegistry>>,
) -> Response {
    info!("New WebSocket connection attempt for channel {}", channel_id);
    ws.on_upgrade(move |socket| handle_socket(socket, channel_id, registry))
}

/// Session coordinator for one connection: join, relay until the transport
/// closes, then leave. Leave always runs, whichever side ended first.
async fn handle_socket(socket: WebSocket, channel_id: String, registry: Arc<ChannelRegistry>) {

    // Generate unique connection ID to identify this client
    let connection_id = Uuid::new_v4();
    info!(
        "WebSocket connection established for channel {} with connection_id {}",
        channel_id, connection_id
    );

    // Split the socket into sender and receiver
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Outbound messages are queued on an unbounded channel so broadcasts
    // never hold a channel lock across a socket write.
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Registering emits the init snapshot to us and user_joined to peers.
    let channel = registry.join(&channel_id, connection_id, tx).await;

    // Writer task: drain the outbound queue into the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(server_msg) = rx.recv().await {
            let text = match serde_json::to_string(&server_msg) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize outbound message: {}", e);
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Reader task: apply inbound content messages to the channel
    let recv_channel_id = channel_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = ws_rx.next().await {
            let msg = match result {
                Ok(Message::Text(msg)) => msg,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue, // ignore binary and control frames
                Err(e) => {
                    debug!("Transport error on channel {}: {}", recv_channel_id, e);
                    break;
                }
            };

            // Malformed or unrecognized messages are dropped; the session
            // stays active.
            let client_msg: ClientMessage = match serde_json::from_str(&msg) {
                Ok(client_msg) => client_msg,
                Err(e) => {
                    error!(
                        "Ignoring malformed message on channel {}: {}",
                        recv_channel_id, e
                    );
                    continue;
                }
            };

            match client_msg {
                ClientMessage::Content(content_msg) => {
                    debug!(
                        "Content update on channel {} from {}",
                        recv_channel_id, connection_id
                    );
                    channel
                        .lock()
                        .await
                        .update_content(connection_id, content_msg.content);
                }
            }
        }
    });

    // Wait for either task to finish (and finish the other)
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    registry.leave(&channel_id, connection_id).await;
    info!(
        "WebSocket connection {} on channel {} terminated",
        connection_id, channel_id
    );
}
