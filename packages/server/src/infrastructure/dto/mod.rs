//! Data Transfer Objects (DTOs) for the chat backend.
//!
//! DTOs are organized by protocol:
//! - `websocket`: live-connection event protocol
//! - `http`: HTTP API response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
