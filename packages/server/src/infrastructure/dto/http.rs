//! HTTP API response DTOs.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub protocol_version: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresenceDto {
    pub user_id: String,
    pub online: bool,
    pub connections: usize,
    pub checked_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OnlineUsersDto {
    pub users: Vec<String>,
    pub connections: usize,
}
