//! Hub
//!
//! プレゼンスレジストリの唯一の所有者であり、受信イベントの解釈とファンアウトを担当します。
//!
//! ## ロックの方針
//! - register / unregister / shutdown のみ書き込みロックを取る
//! - ファンアウトは読み取りロックで配信先をスナップショットし、ロック解放後にキューへ積む
//! - メンバーシップの取得（永続化コラボレーターへの問い合わせ）はロック外で行う
//! - プレゼンス通知のみ、読み取りロックを保持したまま現在の状態を再確認してキューへ積む
//!   （古い user_offline が新しい user_online を追い越さないため）

use std::{
    collections::BTreeSet,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use futures_util::future::join_all;
use tokio::sync::RwLock;
use yoriai_shared::time::Clock;

use crate::{
    domain::{
        ChatId, ChatRepository, MessageRepository, PinRepository, PushNotifier,
        ReactionRepository, RepositoryError, Timestamp, UserId,
    },
    infrastructure::dto::websocket::{OutboundEvent, PresencePayload},
    usecase::{
        DeleteMessageUseCase, EditMessageUseCase, MarkReadUseCase, PinMessageUseCase,
        ReactToMessageUseCase, SendMessageUseCase,
    },
};

use super::{
    Client, CloseReason, HubError,
    presence::{Departure, Presence},
};

/// How long shutdown waits for each connection to finish its teardown.
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Persistence collaborators used by the hub.
#[derive(Clone)]
pub struct Repositories {
    pub chats: Arc<dyn ChatRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub reactions: Arc<dyn ReactionRepository>,
    pub pins: Arc<dyn PinRepository>,
}

/// Outcome of a fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOut {
    /// Members of the chat at the time of the broadcast
    pub members: Vec<UserId>,
    /// Number of connections the event was queued on
    pub delivered: usize,
}

pub struct Hub {
    presence: RwLock<Presence>,
    running: AtomicBool,
    pub(super) chats: Arc<dyn ChatRepository>,
    pub(super) notifier: Arc<dyn PushNotifier>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) send_message: SendMessageUseCase,
    pub(super) edit_message: EditMessageUseCase,
    pub(super) delete_message: DeleteMessageUseCase,
    pub(super) react: ReactToMessageUseCase,
    pub(super) mark_read: MarkReadUseCase,
    pub(super) pin_message: PinMessageUseCase,
}

impl Hub {
    pub fn new(
        repositories: Repositories,
        notifier: Arc<dyn PushNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let Repositories {
            chats,
            messages,
            reactions,
            pins,
        } = repositories;

        Self {
            presence: RwLock::new(Presence::new()),
            running: AtomicBool::new(true),
            send_message: SendMessageUseCase::new(chats.clone(), messages.clone()),
            edit_message: EditMessageUseCase::new(chats.clone(), messages.clone()),
            delete_message: DeleteMessageUseCase::new(chats.clone(), messages.clone()),
            react: ReactToMessageUseCase::new(chats.clone(), messages.clone(), reactions),
            mark_read: MarkReadUseCase::new(chats.clone(), messages.clone()),
            pin_message: PinMessageUseCase::new(chats.clone(), messages, pins),
            chats,
            notifier,
            clock,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(super) fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// Add a connection to the registry.
    ///
    /// On the user's first connection, `user_online` is sent to everyone who
    /// shares a chat with them.
    pub async fn register(&self, client: &Arc<Client>) -> Result<(), HubError> {
        let first = {
            let mut presence = self.presence.write().await;
            if !self.is_running() {
                return Err(HubError::Stopped);
            }
            presence.insert(Arc::clone(client))
        };

        tracing::info!(
            user_id = %client.user_id(),
            connection_id = %client.id(),
            first_connection = first,
            "Connection registered"
        );

        if first {
            let event = OutboundEvent::UserOnline(PresencePayload {
                user_id: client.user_id().clone(),
                last_seen: None,
            });
            self.announce_presence(client.user_id(), true, Arc::new(event))
                .await;
        }
        Ok(())
    }

    /// Remove a connection from the registry. Safe to call more than once.
    ///
    /// On the user's last disconnect, `user_offline` with the last-seen time is
    /// sent to everyone who shares a chat with them.
    pub async fn unregister(&self, client: &Arc<Client>) {
        let departure = {
            let mut presence = self.presence.write().await;
            presence.remove(client.user_id(), client.id())
        };

        match departure {
            Departure::NotRegistered => {}
            Departure::StillOnline => {
                tracing::info!(
                    user_id = %client.user_id(),
                    connection_id = %client.id(),
                    "Connection unregistered"
                );
            }
            Departure::WentOffline => {
                tracing::info!(
                    user_id = %client.user_id(),
                    connection_id = %client.id(),
                    "Connection unregistered, user is offline"
                );
                if self.is_running() {
                    let event = OutboundEvent::UserOffline(PresencePayload {
                        user_id: client.user_id().clone(),
                        last_seen: Some(self.now().value()),
                    });
                    self.announce_presence(client.user_id(), false, Arc::new(event))
                        .await;
                }
            }
        }
    }

    /// Queue an event on every connection of every member of the chat.
    ///
    /// Offline members are skipped. The `exclude` connection (usually the
    /// sender) does not receive the event, but the sender's other devices do.
    pub async fn broadcast(
        &self,
        chat_id: ChatId,
        event: Arc<OutboundEvent>,
        exclude: Option<&Arc<Client>>,
    ) -> Result<FanOut, RepositoryError> {
        let members = self.chats.member_ids(chat_id).await?;
        let targets = self.presence.read().await.clients_of_users(&members);

        let delivered = targets
            .iter()
            .filter(|client| exclude.is_none_or(|excluded| excluded.id() != client.id()))
            .filter(|client| client.enqueue(Arc::clone(&event)))
            .count();

        tracing::debug!(
            chat_id = %chat_id,
            kind = event.kind(),
            members = members.len(),
            delivered,
            "Broadcast"
        );
        Ok(FanOut { members, delivered })
    }

    /// Queue an event on every connection of one user. Returns how many accepted it.
    pub async fn send_to_user(&self, user_id: &UserId, event: Arc<OutboundEvent>) -> usize {
        let targets = self.presence.read().await.clients_of(user_id);
        targets
            .iter()
            .filter(|client| client.enqueue(Arc::clone(&event)))
            .count()
    }

    pub async fn is_online(&self, user_id: &UserId) -> bool {
        self.presence.read().await.is_online(user_id)
    }

    pub async fn connections_of(&self, user_id: &UserId) -> usize {
        self.presence.read().await.connections_of(user_id)
    }

    pub async fn online_users(&self) -> Vec<UserId> {
        self.presence.read().await.online_users()
    }

    pub async fn connection_count(&self) -> usize {
        self.presence.read().await.connection_count()
    }

    /// Of the given users, those with no registered connection.
    pub(super) async fn offline_among(&self, users: &[UserId]) -> Vec<UserId> {
        let presence = self.presence.read().await;
        users
            .iter()
            .filter(|user_id| !presence.is_online(user_id))
            .cloned()
            .collect()
    }

    /// Stop accepting work and close every connection.
    ///
    /// Idempotent. Each connection gets [`SHUTDOWN_GRACE_PERIOD`] to finish.
    pub async fn shutdown(&self) {
        let clients = {
            let mut presence = self.presence.write().await;
            if !self.running.swap(false, Ordering::SeqCst) {
                return;
            }
            presence.drain()
        };

        tracing::info!(connections = clients.len(), "Shutting down hub");

        for client in &clients {
            client.close_with(CloseReason::Shutdown);
        }
        join_all(clients.iter().map(|client| async move {
            if tokio::time::timeout(SHUTDOWN_GRACE_PERIOD, client.wait())
                .await
                .is_err()
            {
                tracing::warn!(
                    user_id = %client.user_id(),
                    connection_id = %client.id(),
                    "Connection did not finish within the grace period"
                );
            }
        }))
        .await;

        tracing::info!("Hub stopped");
    }

    /// Send a presence change to every user sharing a chat with `user_id`.
    ///
    /// `online` is the state the event announces. The announcement is dropped
    /// if the user's presence changed while contacts were being resolved; the
    /// newer change sends its own.
    async fn announce_presence(&self, user_id: &UserId, online: bool, event: Arc<OutboundEvent>) {
        let chat_ids = match self.chats.chat_ids_for_user(user_id).await {
            Ok(chat_ids) => chat_ids,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to resolve chats for presence");
                return;
            }
        };

        let mut contacts = BTreeSet::new();
        for chat_id in chat_ids {
            match self.chats.member_ids(chat_id).await {
                Ok(members) => contacts.extend(members),
                Err(e) => {
                    tracing::warn!(chat_id = %chat_id, error = %e, "Failed to resolve members for presence");
                }
            }
        }
        contacts.remove(user_id);

        // enqueue はブロックしないので、ロックを保持したまま積める
        let presence = self.presence.read().await;
        if presence.is_online(user_id) != online {
            tracing::debug!(
                user_id = %user_id,
                kind = event.kind(),
                "Presence changed while resolving contacts, skipping announcement"
            );
            return;
        }
        let delivered = presence
            .clients_of_users(&contacts)
            .iter()
            .filter(|client| client.enqueue(Arc::clone(&event)))
            .count();
        tracing::debug!(user_id = %user_id, kind = event.kind(), delivered, "Presence announced");
    }
}
