//! Shared application state.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use crate::hub::{ClientConfig, Hub};

use super::auth::Authenticator;

/// Shared application state
pub struct AppState {
    /// Hub（プレゼンスレジストリとイベント配信）
    pub hub: Arc<Hub>,
    /// 接続ごとの上限値
    pub client_config: ClientConfig,
    /// 接続ユーザーの識別
    pub authenticator: Arc<dyn Authenticator>,
    /// 同時接続数の上限管理
    pub connections: ConnectionLimiter,
}

impl AppState {
    pub fn new(
        hub: Arc<Hub>,
        client_config: ClientConfig,
        authenticator: Arc<dyn Authenticator>,
        max_connections: usize,
    ) -> Self {
        Self {
            hub,
            client_config,
            authenticator,
            connections: ConnectionLimiter::new(max_connections),
        }
    }
}

/// Ceiling on concurrently open live connections.
#[derive(Debug)]
pub struct ConnectionLimiter {
    open: Arc<AtomicUsize>,
    max: usize,
}

impl ConnectionLimiter {
    pub fn new(max: usize) -> Self {
        Self {
            open: Arc::new(AtomicUsize::new(0)),
            max,
        }
    }

    /// Reserve a slot, or `None` when the ceiling is reached.
    pub fn try_acquire(&self) -> Option<ConnectionSlot> {
        self.open
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |open| {
                (open < self.max).then_some(open + 1)
            })
            .ok()?;
        Some(ConnectionSlot {
            open: Arc::clone(&self.open),
        })
    }

    pub fn open(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

/// Held for the life of one connection; releases its slot on drop.
#[derive(Debug)]
pub struct ConnectionSlot {
    open: Arc<AtomicUsize>,
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}
