mod canvas;
mod chat;
pub mod handlers;
mod room;
mod signaling;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;

use crate::protocol::ServerEvent;
use crate::state::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection from accept to teardown
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (conn_id, mut outbox) = state.connect().await;

    let greeting = ServerEvent::Connected {
        id: conn_id.clone(),
        server_now: chrono::Utc::now().to_rfc3339(),
    };

    if let Ok(json) = serde_json::to_string(&greeting) {
        if sender.send(Message::Text(json.into())).await.is_err() {
            tracing::error!(conn_id = %conn_id, "Failed to send greeting");
            handlers::handle_disconnect(&conn_id, &state).await;
            return;
        }
    }

    loop {
        tokio::select! {
            // Events routed to this connection
            outbound = outbox.recv() => {
                let Some(event) = outbound else { break };
                match serde_json::to_string(&event) {
                    Ok(json) => {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::error!("Failed to encode outbound event: {}", e),
                }
            }

            // Events from the client
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::trace!(conn_id = %conn_id, "Received: {}", text.as_str());
                        // Failures are logged by the dispatcher and never end the session
                        let _ = handlers::handle_text(text.as_str(), &conn_id, &state).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!(conn_id = %conn_id, "WebSocket closed by client");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(conn_id = %conn_id, "WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    handlers::handle_disconnect(&conn_id, &state).await;
}
