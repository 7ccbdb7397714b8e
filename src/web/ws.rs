use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};

use crate::telemetry::Subscription;

use super::server::AppState;

/// Push-only telemetry channel. The latest snapshot is sent on connect, then
/// every published snapshot after it.
pub async fn telemetry_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_subscriber(socket, state))
}

async fn serve_subscriber(socket: WebSocket, state: AppState) {
    let Subscription { id, mut receiver } = state.registry.connect();
    let (mut sink, mut stream) = socket.split();
    let send_timeout = state.send_timeout;

    let mut forward = tokio::spawn(async move {
        while let Some(payload) = receiver.recv().await {
            let message = Message::Text(payload.as_ref().into());
            match tokio::time::timeout(send_timeout, sink.send(message)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    log::debug!("subscriber {} send failed: {}", id, e);
                    break;
                }
                Err(_) => {
                    log::warn!("subscriber {} send timed out", id);
                    break;
                }
            }
        }
        let _ = sink.close().await;
    });

    // Consumers send nothing meaningful; read only to notice the close.
    let mut drain = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            if let Message::Close(_) = message {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut forward => drain.abort(),
        _ = &mut drain => forward.abort(),
    }

    state.registry.disconnect(id);
}
