//! Connection actor
//!
//! 1 本のライブ接続を担当するアクター。読み取りループと書き込みループの 2 つのタスクが
//! 有界キューとキャンセルトークンを共有して動作します。
//!
//! - 送信は `enqueue()` によるノンブロッキングの試行のみ（キューが満杯ならそのイベントを破棄）
//! - 終了処理は何度呼ばれても 1 回だけ実行される（最初の `close_with()` の理由が採用される）
//! - `wait()` は両方のループが終了するまで待機する

use std::{
    fmt::{self, Display},
    sync::{Arc, Mutex, OnceLock, PoisonError},
    time::Duration,
};

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    time::{Instant, MissedTickBehavior, interval_at, timeout},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{
    domain::{ConnectionId, UserId},
    infrastructure::dto::websocket::{InboundEvent, OutboundEvent},
};

use super::Hub;

/// 送信キューの容量
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
/// 受信がない状態で接続を維持する時間
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
/// 1 フレームの書き込みに許される時間
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);
/// 受信フレームの最大バイト数
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 4096;
/// 終了時の close フレームの書き込みに許される時間
const CLOSE_FRAME_TIMEOUT: Duration = Duration::from_secs(1);

type Outbox = mpsc::Receiver<Arc<OutboundEvent>>;

/// Per-connection limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub queue_capacity: usize,
    pub idle_timeout: Duration,
    pub write_timeout: Duration,
    pub max_message_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl ClientConfig {
    /// Keepalive ping period, 90% of the idle timeout.
    pub fn ping_interval(&self) -> Duration {
        // 先に割ることで巨大なタイムアウトでもオーバーフローしない
        self.idle_timeout / 10 * 9
    }
}

/// Why a connection was torn down. Selects the close frame code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// `close()` was called locally
    Requested,
    /// The peer sent a close frame or ended the stream
    PeerClosed,
    /// Nothing was received within the idle timeout
    ReadTimeout,
    /// An inbound frame exceeded the size limit
    Oversized,
    /// Read or write failed, or a write missed its deadline
    Transport,
    /// The hub is shutting down
    Shutdown,
}

impl CloseReason {
    pub fn code(&self) -> u16 {
        match self {
            CloseReason::Requested | CloseReason::PeerClosed => 1000,
            CloseReason::ReadTimeout | CloseReason::Shutdown => 1001,
            CloseReason::Oversized => 1009,
            CloseReason::Transport => 1011,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::Requested => "closed",
            CloseReason::PeerClosed => "peer closed",
            CloseReason::ReadTimeout => "idle timeout",
            CloseReason::Oversized => "message too large",
            CloseReason::Transport => "transport error",
            CloseReason::Shutdown => "server shutting down",
        }
    }
}

impl Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Active,
    Closing,
    Closed,
}

/// Connection actor for one authenticated user device.
pub struct Client {
    id: ConnectionId,
    user_id: UserId,
    config: ClientConfig,
    tx: mpsc::Sender<Arc<OutboundEvent>>,
    rx: Mutex<Option<Outbox>>,
    close_reason: OnceLock<CloseReason>,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("state", &self.state())
            .finish()
    }
}

impl Client {
    pub fn new(user_id: UserId, config: ClientConfig) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        Arc::new(Self {
            id: ConnectionId::generate(),
            user_id,
            config,
            tx,
            rx: Mutex::new(Some(rx)),
            close_reason: OnceLock::new(),
            cancel: CancellationToken::new(),
            tasks: TaskTracker::new(),
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason.get().copied()
    }

    pub fn state(&self) -> ClientState {
        match self.close_reason.get() {
            None => ClientState::Active,
            Some(_) if self.tasks.is_closed() && self.tasks.is_empty() => ClientState::Closed,
            Some(_) => ClientState::Closing,
        }
    }

    /// Try to queue an event for delivery without waiting.
    ///
    /// Returns `false` when the event was not queued: the queue is full (the event
    /// is dropped for this connection only) or the actor is closing.
    pub fn enqueue(&self, event: Arc<OutboundEvent>) -> bool {
        if self.close_reason.get().is_some() {
            return false;
        }
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!(
                    connection_id = %self.id,
                    user_id = %self.user_id,
                    kind = event.kind(),
                    "Send queue full, dropping event"
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Begin teardown. Only the first call has any effect and returns `true`.
    pub fn close_with(&self, reason: CloseReason) -> bool {
        if self.close_reason.set(reason).is_err() {
            return false;
        }
        tracing::debug!(
            connection_id = %self.id,
            user_id = %self.user_id,
            reason = %reason,
            "Closing connection"
        );
        self.cancel.cancel();
        self.tasks.close();
        true
    }

    pub fn close(&self) -> bool {
        self.close_with(CloseReason::Requested)
    }

    /// Wait until both loops have exited.
    ///
    /// Returns immediately for an actor that was closed without being started.
    pub async fn wait(&self) {
        self.tasks.wait().await;
    }

    /// Spawn the read and write loops over the given transport halves.
    pub fn start<W, R, E>(self: &Arc<Self>, sink: W, stream: R, hub: Arc<Hub>)
    where
        W: Sink<Message> + Unpin + Send + 'static,
        W::Error: Display,
        R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
        E: Display + Send + 'static,
    {
        let Some(outbox) = self.take_receiver() else {
            tracing::warn!(connection_id = %self.id, "Connection already started");
            return;
        };
        self.tasks.spawn(Arc::clone(self).write_loop(sink, outbox));
        self.tasks.spawn(Arc::clone(self).read_loop(stream, hub));
        self.tasks.close();
    }

    pub(crate) fn take_receiver(&self) -> Option<Outbox> {
        self.rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    async fn read_loop<R, E>(self: Arc<Self>, mut stream: R, hub: Arc<Hub>)
    where
        R: Stream<Item = Result<Message, E>> + Unpin,
        E: Display + Send,
    {
        let reason = loop {
            let frame = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break None,
                frame = timeout(self.config.idle_timeout, stream.next()) => frame,
            };

            let message = match frame {
                Err(_) => break Some(CloseReason::ReadTimeout),
                Ok(None) => break Some(CloseReason::PeerClosed),
                Ok(Some(Err(e))) => {
                    tracing::warn!(connection_id = %self.id, error = %e, "WebSocket read failed");
                    break Some(CloseReason::Transport);
                }
                Ok(Some(Ok(message))) => message,
            };

            match message {
                Message::Text(text) => {
                    if text.as_str().len() > self.config.max_message_size {
                        tracing::warn!(
                            connection_id = %self.id,
                            size = text.as_str().len(),
                            "Inbound frame exceeds size limit"
                        );
                        break Some(CloseReason::Oversized);
                    }
                    match serde_json::from_str::<InboundEvent>(text.as_str()) {
                        Ok(event) => hub.dispatch(&self, event).await,
                        Err(e) => {
                            tracing::warn!(
                                connection_id = %self.id,
                                user_id = %self.user_id,
                                error = %e,
                                "Malformed frame, skipping"
                            );
                        }
                    }
                }
                Message::Binary(data) => {
                    if data.len() > self.config.max_message_size {
                        break Some(CloseReason::Oversized);
                    }
                    tracing::debug!(connection_id = %self.id, "Binary frames are not supported, skipping");
                }
                Message::Close(_) => break Some(CloseReason::PeerClosed),
                Message::Ping(_) | Message::Pong(_) => {}
            }
        };

        hub.unregister(&self).await;
        if let Some(reason) = reason {
            self.close_with(reason);
        }
    }

    async fn write_loop<W>(self: Arc<Self>, mut sink: W, mut outbox: Outbox)
    where
        W: Sink<Message> + Unpin,
        W::Error: Display,
    {
        let period = self.config.ping_interval();
        let mut keepalive = interval_at(Instant::now() + period, period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sent_since_tick = false;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                event = outbox.recv() => {
                    let Some(event) = event else { break };
                    let text = match serde_json::to_string(event.as_ref()) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(
                                connection_id = %self.id,
                                kind = event.kind(),
                                error = %e,
                                "Failed to serialize event"
                            );
                            continue;
                        }
                    };
                    if let Err(reason) = self.send_frame(&mut sink, Message::Text(text.into())).await {
                        self.close_with(reason);
                        break;
                    }
                    sent_since_tick = true;
                }
                _ = keepalive.tick() => {
                    // Only ping a connection that has been quiet for a whole period.
                    if std::mem::take(&mut sent_since_tick) {
                        continue;
                    }
                    if let Err(reason) = self.send_frame(&mut sink, Message::Ping(Default::default())).await {
                        self.close_with(reason);
                        break;
                    }
                }
            }
        }

        let reason = self.close_reason().unwrap_or(CloseReason::Transport);
        let frame = Message::Close(Some(CloseFrame {
            code: reason.code(),
            reason: Utf8Bytes::from_static(reason.as_str()),
        }));
        let limit = self.config.write_timeout.min(CLOSE_FRAME_TIMEOUT);
        let _ = timeout(limit, sink.send(frame)).await;
    }

    async fn send_frame<W>(&self, sink: &mut W, message: Message) -> Result<(), CloseReason>
    where
        W: Sink<Message> + Unpin,
        W::Error: Display,
    {
        // close() は書き込み中のフレームも中断する
        let sent = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(self.close_reason().unwrap_or(CloseReason::Requested));
            }
            sent = timeout(self.config.write_timeout, sink.send(message)) => sent,
        };
        match sent {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                tracing::warn!(connection_id = %self.id, error = %e, "WebSocket write failed");
                Err(CloseReason::Transport)
            }
            Err(_) => {
                tracing::warn!(connection_id = %self.id, "Write deadline exceeded");
                Err(CloseReason::Transport)
            }
        }
    }
}
