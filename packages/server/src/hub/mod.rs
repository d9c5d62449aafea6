//! Hub layer
//!
//! 接続アクター（[`Client`]）と、プレゼンスレジストリを所有してイベントを配信する [`Hub`]。

mod client;
mod dispatch;
mod presence;
mod registry;

use thiserror::Error;

pub use client::{
    Client, ClientConfig, ClientState, CloseReason, DEFAULT_IDLE_TIMEOUT,
    DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_QUEUE_CAPACITY, DEFAULT_WRITE_TIMEOUT,
};
pub use presence::{Departure, Presence};
pub use registry::{FanOut, Hub, Repositories, SHUTDOWN_GRACE_PERIOD};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("hub is stopped")]
    Stopped,
}
