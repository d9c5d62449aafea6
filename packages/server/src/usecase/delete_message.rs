//! UseCase: メッセージ削除処理
//!
//! 送信者本人、またはチャットのオーナー・管理者が削除できます（論理削除）。

use std::sync::Arc;

use crate::domain::{ChatRepository, Message, MessageId, MessageRepository, UserId};

use super::{
    access::{load_live_message, require_member},
    error::UseCaseError,
};

pub struct DeleteMessageUseCase {
    chats: Arc<dyn ChatRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl DeleteMessageUseCase {
    pub fn new(chats: Arc<dyn ChatRepository>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { chats, messages }
    }

    pub async fn execute(
        &self,
        actor: &UserId,
        message_id: MessageId,
    ) -> Result<Message, UseCaseError> {
        let message = load_live_message(self.messages.as_ref(), message_id).await?;
        let role = require_member(self.chats.as_ref(), message.chat_id, actor).await?;

        if &message.sender_id != actor && !role.can_moderate() {
            return Err(UseCaseError::Forbidden(
                "only the sender or a moderator can delete a message".to_string(),
            ));
        }

        let deleted = self.messages.soft_delete(message_id).await?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fixture, user};

    #[tokio::test]
    async fn test_owner_can_delete_others_message() {
        // テスト項目: オーナーは他人のメッセージを削除できる
        // given (前提条件):
        let fixture = Fixture::new();
        let id = fixture.seed_message(1, "bob", "spam").await;
        let usecase = DeleteMessageUseCase::new(fixture.chats.clone(), fixture.messages.clone());

        // when (操作):
        let deleted = usecase.execute(&user("alice"), id).await.unwrap();

        // then (期待する結果):
        assert!(deleted.is_deleted());
    }

    #[tokio::test]
    async fn test_plain_member_cannot_delete_others_message() {
        // テスト項目: 一般メンバーは他人のメッセージを削除できない
        // given (前提条件):
        let fixture = Fixture::new();
        let id = fixture.seed_message(1, "alice", "keep").await;
        let usecase = DeleteMessageUseCase::new(fixture.chats.clone(), fixture.messages.clone());

        // when (操作):
        let result = usecase.execute(&user("bob"), id).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err().code(), "forbidden");
    }

    #[tokio::test]
    async fn test_deleting_twice_is_not_found() {
        // テスト項目: 削除済みメッセージの再削除は not_found になる
        // given (前提条件):
        let fixture = Fixture::new();
        let id = fixture.seed_message(1, "bob", "bye").await;
        let usecase = DeleteMessageUseCase::new(fixture.chats.clone(), fixture.messages.clone());
        usecase.execute(&user("bob"), id).await.unwrap();

        // when (操作):
        let result = usecase.execute(&user("bob"), id).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), UseCaseError::MessageNotFound(id));
    }
}
