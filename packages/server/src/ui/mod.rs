//! UI layer: the HTTP surface and the WebSocket upgrade.

mod auth;
mod handler;
mod server;
mod signal;
pub mod state;

pub use auth::{Authenticator, DEFAULT_IDENTITY_HEADER, TrustedHeaderAuthenticator};
pub use server::{DEFAULT_MAX_CONNECTIONS, Server, ServerConfig, router};
