//! UseCase: メッセージのピン留め・解除
//!
//! オーナー・管理者のみが操作できます。二重のピン留めや、ピン留めされていない
//! メッセージの解除は invalid_request になります。

use std::sync::Arc;

use crate::domain::{
    ChatId, ChatRepository, MessageId, MessageRepository, Pin, PinRepository, RepositoryError,
    UserId,
};

use super::{
    access::{load_live_message, require_member},
    error::UseCaseError,
};

pub struct PinMessageUseCase {
    chats: Arc<dyn ChatRepository>,
    messages: Arc<dyn MessageRepository>,
    pins: Arc<dyn PinRepository>,
}

impl PinMessageUseCase {
    pub fn new(
        chats: Arc<dyn ChatRepository>,
        messages: Arc<dyn MessageRepository>,
        pins: Arc<dyn PinRepository>,
    ) -> Self {
        Self {
            chats,
            messages,
            pins,
        }
    }

    pub async fn pin(
        &self,
        user_id: &UserId,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<Pin, UseCaseError> {
        self.require_moderator(user_id, chat_id).await?;

        let message = load_live_message(self.messages.as_ref(), message_id).await?;
        if message.chat_id != chat_id {
            return Err(UseCaseError::InvalidInput(format!(
                "message {message_id} belongs to another chat"
            )));
        }
        if self.is_pinned(chat_id, message_id).await? {
            return Err(UseCaseError::InvalidInput(format!(
                "message {message_id} is already pinned"
            )));
        }

        // 並行したピン留めは重複チェックをすり抜けてストアで衝突する
        match self.pins.add(chat_id, message_id, user_id).await {
            Ok(pin) => Ok(pin),
            Err(RepositoryError::Conflict(_)) => Err(UseCaseError::InvalidInput(format!(
                "message {message_id} is already pinned"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn unpin(
        &self,
        user_id: &UserId,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), UseCaseError> {
        self.require_moderator(user_id, chat_id).await?;

        if !self.is_pinned(chat_id, message_id).await? {
            return Err(UseCaseError::InvalidInput(format!(
                "message {message_id} is not pinned"
            )));
        }

        self.pins.remove(chat_id, message_id).await?;
        Ok(())
    }

    async fn require_moderator(&self, user_id: &UserId, chat_id: ChatId) -> Result<(), UseCaseError> {
        let role = require_member(self.chats.as_ref(), chat_id, user_id).await?;
        if !role.can_moderate() {
            return Err(UseCaseError::Forbidden(
                "only owners and admins can pin messages".to_string(),
            ));
        }
        Ok(())
    }

    async fn is_pinned(&self, chat_id: ChatId, message_id: MessageId) -> Result<bool, UseCaseError> {
        let pins = self.pins.list_by_chat(chat_id).await?;
        Ok(pins.iter().any(|pin| pin.message_id == message_id))
    }
}
