//! InMemory Pin Repository 実装

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use yoriai_shared::time::Clock;

use crate::domain::{ChatId, MessageId, Pin, PinRepository, RepositoryError, Timestamp, UserId};

/// インメモリ Pin Repository 実装
pub struct InMemoryPinRepository {
    pins: Mutex<Vec<Pin>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryPinRepository {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            pins: Mutex::new(Vec::new()),
            clock,
        }
    }
}

#[async_trait]
impl PinRepository for InMemoryPinRepository {
    async fn add(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        pinned_by: &UserId,
    ) -> Result<Pin, RepositoryError> {
        let mut pins = self.pins.lock().await;
        if pins
            .iter()
            .any(|p| p.chat_id == chat_id && p.message_id == message_id)
        {
            return Err(RepositoryError::Conflict(format!(
                "message {message_id} is already pinned in chat {chat_id}"
            )));
        }
        let pin = Pin {
            chat_id,
            message_id,
            pinned_by: pinned_by.clone(),
            pinned_at: Timestamp::new(self.clock.now_millis()),
        };
        pins.push(pin.clone());
        Ok(pin)
    }

    async fn remove(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), RepositoryError> {
        let mut pins = self.pins.lock().await;
        let before = pins.len();
        pins.retain(|p| !(p.chat_id == chat_id && p.message_id == message_id));
        if pins.len() == before {
            return Err(RepositoryError::NotFound(format!(
                "pin of message {message_id} in chat {chat_id}"
            )));
        }
        Ok(())
    }

    async fn list_by_chat(&self, chat_id: ChatId) -> Result<Vec<Pin>, RepositoryError> {
        let pins = self.pins.lock().await;
        Ok(pins.iter().filter(|p| p.chat_id == chat_id).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yoriai_shared::time::FixedClock;

    #[tokio::test]
    async fn test_pin_twice_conflicts() {
        // テスト項目: 同じメッセージを二重にピン留めすると Conflict になる
        // given (前提条件):
        let repository = InMemoryPinRepository::new(Arc::new(FixedClock::new(7)));
        let chat_id = ChatId::new(1).unwrap();
        let message_id = MessageId::new(2).unwrap();
        let alice = UserId::new("alice".to_string()).unwrap();
        repository.add(chat_id, message_id, &alice).await.unwrap();

        // when (操作):
        let result = repository.add(chat_id, message_id, &alice).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        assert_eq!(repository.list_by_chat(chat_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unpin_removes_row() {
        // テスト項目: ピン留め解除で一覧から消える
        // given (前提条件):
        let repository = InMemoryPinRepository::new(Arc::new(FixedClock::new(7)));
        let chat_id = ChatId::new(1).unwrap();
        let message_id = MessageId::new(2).unwrap();
        let alice = UserId::new("alice".to_string()).unwrap();
        repository.add(chat_id, message_id, &alice).await.unwrap();

        // when (操作):
        repository.remove(chat_id, message_id).await.unwrap();

        // then (期待する結果):
        assert!(repository.list_by_chat(chat_id).await.unwrap().is_empty());
    }
}
