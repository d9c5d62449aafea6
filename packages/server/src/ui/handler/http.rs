//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use yoriai_shared::time::{now_millis, timestamp_to_rfc3339};

use crate::{
    domain::UserId,
    infrastructure::dto::{
        http::{HealthDto, OnlineUsersDto, PresenceDto},
        websocket::PROTOCOL_VERSION,
    },
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok",
        protocol_version: PROTOCOL_VERSION,
    })
}

/// Get presence of a user
pub async fn get_presence(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<PresenceDto>, StatusCode> {
    let user_id = match UserId::try_from(user_id) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Invalid user_id in presence query: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    let connections = state.hub.connections_of(&user_id).await;
    Ok(Json(PresenceDto {
        user_id: user_id.into_string(),
        online: connections > 0,
        connections,
        checked_at: timestamp_to_rfc3339(now_millis()),
    }))
}

/// List users with at least one open connection
pub async fn list_online_users(State(state): State<Arc<AppState>>) -> Json<OnlineUsersDto> {
    let users = state
        .hub
        .online_users()
        .await
        .into_iter()
        .map(UserId::into_string)
        .collect();
    Json(OnlineUsersDto {
        users,
        connections: state.hub.connection_count().await,
    })
}
