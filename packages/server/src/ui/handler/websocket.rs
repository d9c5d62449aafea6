//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use futures_util::stream::StreamExt;

use crate::{
    domain::UserId,
    hub::Client,
    ui::state::{AppState, ConnectionSlot},
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let Some(user_id) = state.authenticator.authenticate(&headers) else {
        tracing::warn!("Rejecting WebSocket upgrade without a valid identity");
        return Err(StatusCode::UNAUTHORIZED);
    };

    if !state.hub.is_running() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let Some(slot) = state.connections.try_acquire() else {
        tracing::warn!(
            user_id = %user_id,
            open = state.connections.open(),
            "Connection limit reached, rejecting upgrade"
        );
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    // Transport-level cap; the actor enforces the exact limit and closes with 1009.
    let transport_limit = state.client_config.max_message_size.saturating_mul(2);
    Ok(ws
        .max_message_size(transport_limit)
        .max_frame_size(transport_limit)
        .on_upgrade(move |socket| handle_socket(socket, state, user_id, slot)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: UserId, _slot: ConnectionSlot) {
    let client = Client::new(user_id, state.client_config.clone());

    if let Err(e) = state.hub.register(&client).await {
        tracing::warn!(user_id = %client.user_id(), error = %e, "Failed to register connection");
        return;
    }

    let (sink, stream) = socket.split();
    client.start(sink, stream, Arc::clone(&state.hub));
    client.wait().await;

    tracing::info!(
        user_id = %client.user_id(),
        connection_id = %client.id(),
        reason = ?client.close_reason(),
        "Connection closed"
    );
}
