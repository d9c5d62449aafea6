//! Fixtures shared by the use case and hub tests.

use std::sync::Arc;

use yoriai_shared::time::FixedClock;

use crate::{
    domain::{Chat, ChatId, ChatMember, MemberRole, MessageId, MessageRepository, NewMessage, UserId},
    hub::{Hub, Repositories},
    infrastructure::{
        notifier::LoggingPushNotifier,
        repository::{
            InMemoryChatRepository, InMemoryMessageRepository, InMemoryPinRepository,
            InMemoryReactionRepository,
        },
    },
};

pub const NOW: i64 = 1_700_000_000_000;

pub fn user(id: &str) -> UserId {
    UserId::new(id.to_string()).unwrap()
}

pub fn chat_id(id: i64) -> ChatId {
    ChatId::new(id).unwrap()
}

pub fn message_id(id: i64) -> MessageId {
    MessageId::new(id).unwrap()
}

pub fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(NOW))
}

/// In-memory collaborators seeded with two chats:
///
/// - chat 1: alice (owner), bob (member)
/// - chat 2: alice (member), carol (admin)
pub struct Fixture {
    pub chats: Arc<InMemoryChatRepository>,
    pub messages: Arc<InMemoryMessageRepository>,
    pub reactions: Arc<InMemoryReactionRepository>,
    pub pins: Arc<InMemoryPinRepository>,
}

impl Fixture {
    pub fn new() -> Self {
        let chats = vec![
            Chat {
                id: chat_id(1),
                name: "general".to_string(),
                members: vec![
                    ChatMember {
                        user_id: user("alice"),
                        role: MemberRole::Owner,
                    },
                    ChatMember {
                        user_id: user("bob"),
                        role: MemberRole::Member,
                    },
                ],
            },
            Chat {
                id: chat_id(2),
                name: "random".to_string(),
                members: vec![
                    ChatMember {
                        user_id: user("alice"),
                        role: MemberRole::Member,
                    },
                    ChatMember {
                        user_id: user("carol"),
                        role: MemberRole::Admin,
                    },
                ],
            },
        ];
        Self {
            chats: Arc::new(InMemoryChatRepository::with_chats(chats)),
            messages: Arc::new(InMemoryMessageRepository::new(clock())),
            reactions: Arc::new(InMemoryReactionRepository::new(clock())),
            pins: Arc::new(InMemoryPinRepository::new(clock())),
        }
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            chats: self.chats.clone(),
            messages: self.messages.clone(),
            reactions: self.reactions.clone(),
            pins: self.pins.clone(),
        }
    }

    /// A running hub over these repositories with a fixed clock.
    pub fn hub(&self) -> Arc<Hub> {
        Arc::new(Hub::new(
            self.repositories(),
            Arc::new(LoggingPushNotifier),
            clock(),
        ))
    }

    /// Persist a plain text message directly, bypassing validation.
    pub async fn seed_message(&self, chat: i64, sender: &str, content: &str) -> MessageId {
        self.messages
            .create(NewMessage {
                chat_id: chat_id(chat),
                sender_id: user(sender),
                content: content.to_string(),
                content_type: "text".to_string(),
                attachment: None,
                reply_to_id: None,
                forwarded_from_id: None,
            })
            .await
            .unwrap()
            .id
    }
}
