//! UseCase: 既読位置の更新

use std::sync::Arc;

use crate::domain::{ChatId, ChatRepository, MessageId, MessageRepository, Timestamp, UserId};

use super::{
    access::{load_live_message, require_member},
    error::UseCaseError,
};

pub struct MarkReadUseCase {
    chats: Arc<dyn ChatRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl MarkReadUseCase {
    pub fn new(chats: Arc<dyn ChatRepository>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { chats, messages }
    }

    /// 既読位置を更新
    ///
    /// `message_id` が省略された場合はチャットの最新メッセージを既読にします。
    ///
    /// # Returns
    ///
    /// * `Ok(Some(MessageId))` - 既読にしたメッセージ
    /// * `Ok(None)` - チャットにメッセージがなく何もしなかった
    pub async fn execute(
        &self,
        user_id: &UserId,
        chat_id: ChatId,
        message_id: Option<MessageId>,
        read_at: Timestamp,
    ) -> Result<Option<MessageId>, UseCaseError> {
        require_member(self.chats.as_ref(), chat_id, user_id).await?;

        let message_id = match message_id {
            Some(id) => {
                let message = load_live_message(self.messages.as_ref(), id).await?;
                if message.chat_id != chat_id {
                    return Err(UseCaseError::InvalidInput(format!(
                        "message {id} belongs to another chat"
                    )));
                }
                id
            }
            None => match self.messages.list_by_chat(chat_id, 1).await?.first() {
                Some(latest) => latest.id,
                None => return Ok(None),
            },
        };

        self.chats
            .update_last_read(chat_id, user_id, message_id, read_at)
            .await?;
        Ok(Some(message_id))
    }
}
