//! InMemory Message Repository 実装

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;
use yoriai_shared::time::Clock;

use crate::domain::{
    ChatId, Message, MessageId, MessageRepository, NewMessage, RepositoryError, Timestamp,
};

struct MessageStore {
    next_id: i64,
    messages: HashMap<MessageId, Message>,
}

/// インメモリ Message Repository 実装
pub struct InMemoryMessageRepository {
    store: Mutex<MessageStore>,
    clock: Arc<dyn Clock>,
}

impl InMemoryMessageRepository {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Mutex::new(MessageStore {
                next_id: 1,
                messages: HashMap::new(),
            }),
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        let created_at = self.now();
        let mut store = self.store.lock().await;
        let id = MessageId::new(store.next_id)
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;
        store.next_id += 1;

        let message = Message {
            id,
            chat_id: message.chat_id,
            sender_id: message.sender_id,
            content: message.content,
            content_type: message.content_type,
            attachment: message.attachment,
            reply_to_id: message.reply_to_id,
            forwarded_from_id: message.forwarded_from_id,
            created_at,
            edited_at: None,
            deleted_at: None,
        };
        store.messages.insert(id, message.clone());
        Ok(message)
    }

    async fn get(&self, message_id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store.messages.get(&message_id).cloned())
    }

    async fn edit(
        &self,
        message_id: MessageId,
        content: String,
    ) -> Result<Message, RepositoryError> {
        let edited_at = self.now();
        let mut store = self.store.lock().await;
        let message = store
            .messages
            .get_mut(&message_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("message {message_id}")))?;
        message.content = content;
        message.edited_at = Some(edited_at);
        Ok(message.clone())
    }

    async fn soft_delete(&self, message_id: MessageId) -> Result<Message, RepositoryError> {
        let deleted_at = self.now();
        let mut store = self.store.lock().await;
        let message = store
            .messages
            .get_mut(&message_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("message {message_id}")))?;
        if message.deleted_at.is_none() {
            message.deleted_at = Some(deleted_at);
        }
        Ok(message.clone())
    }

    async fn list_by_chat(
        &self,
        chat_id: ChatId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let store = self.store.lock().await;
        let mut messages: Vec<Message> = store
            .messages
            .values()
            .filter(|m| m.chat_id == chat_id && !m.is_deleted())
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.id.cmp(&a.id));
        messages.truncate(limit);
        Ok(messages)
    }
}
