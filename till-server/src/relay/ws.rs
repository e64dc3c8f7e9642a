//! WebSocket handler for scan/bill duplex sessions
//!
//! Each staff member keeps two independent long-lived connections: the
//! handheld scan session and the billing-terminal session. Both arrive
//! here; a `register` message binds the connection to a staff slot, and
//! scan events are relayed through the [`SessionRegistry`].

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use shared::message::{BillingPush, RelayMessage};

use crate::core::ServerState;
use crate::relay::registry::ClientHandle;
use crate::relay::router;

/// GET /ws — upgrade to WebSocket
pub async fn handle_relay_ws(
    State(state): State<ServerState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: ServerState) {
    let conn_id = Uuid::new_v4();
    tracing::info!(conn_id = %conn_id, "WebSocket client connected");

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Channel for pushes to this connection (only bill sessions receive any)
    let (push_tx, mut push_rx) = mpsc::channel::<BillingPush>(32);

    // Main select loop
    loop {
        tokio::select! {
            // Incoming message from the client
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_message(&text, &state, conn_id, &push_tx).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = ws_sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(conn_id = %conn_id, "WebSocket error: {e}");
                        break;
                    }
                    _ => {} // Binary, Pong — ignore
                }
            }

            // Relayed event to push to this (bill) connection
            push = push_rx.recv() => {
                match push {
                    Some(event) => {
                        if let Ok(json) = serde_json::to_string(&event)
                            && ws_sink.send(Message::Text(json.into())).await.is_err()
                        {
                            tracing::warn!(conn_id = %conn_id, "Failed to push relay event");
                            break;
                        }
                    }
                    None => break, // channel closed
                }
            }
        }
    }

    // Send Close frame (best-effort)
    let _ = ws_sink.close().await;

    // Cleanup: clear any slot this connection held. If it was superseded
    // earlier, no slot matches and this is a no-op.
    state.registry.clear_connection(conn_id);

    tracing::info!(conn_id = %conn_id, "WebSocket session cleaned up");
}

async fn handle_client_message(
    text: &str,
    state: &ServerState,
    conn_id: Uuid,
    push_tx: &mpsc::Sender<BillingPush>,
) {
    let msg: RelayMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(conn_id = %conn_id, "Invalid relay message: {e}");
            return;
        }
    };

    match msg {
        RelayMessage::Register {
            staff_id,
            client_type,
        } => {
            state.registry.register(
                &staff_id,
                client_type,
                ClientHandle {
                    conn_id,
                    tx: push_tx.clone(),
                },
            );
        }

        RelayMessage::BarcodeScanned {
            staff_id,
            barcode,
            action,
        } => {
            router::forward_scan(&state.registry, &staff_id, &barcode, action).await;
        }
    }
}
