//! UseCase: メッセージ編集処理

use std::sync::Arc;

use crate::domain::{ChatRepository, Message, MessageId, MessageRepository, UserId};

use super::{
    access::{load_live_message, require_member},
    error::UseCaseError,
    send_message::validate_content,
};

/// メッセージ編集のユースケース（送信者本人のみ編集可能）
pub struct EditMessageUseCase {
    chats: Arc<dyn ChatRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl EditMessageUseCase {
    pub fn new(chats: Arc<dyn ChatRepository>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { chats, messages }
    }

    pub async fn execute(
        &self,
        editor: &UserId,
        message_id: MessageId,
        content: String,
    ) -> Result<Message, UseCaseError> {
        let message = load_live_message(self.messages.as_ref(), message_id).await?;
        require_member(self.chats.as_ref(), message.chat_id, editor).await?;

        if &message.sender_id != editor {
            return Err(UseCaseError::Forbidden(
                "only the sender can edit a message".to_string(),
            ));
        }
        validate_content(&content, message.attachment.is_some())?;

        let edited = self.messages.edit(message_id, content).await?;
        Ok(edited)
    }
}
