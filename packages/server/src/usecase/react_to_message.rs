//! UseCase: リアクションの追加・削除
//!
//! 操作後のリアクション一覧を返し、ハブはそれをサマリーとして配信します。

use std::sync::Arc;

use crate::domain::{
    ChatId, ChatRepository, MessageId, MessageRepository, Reaction, ReactionRepository, UserId,
};

use super::{
    access::{load_live_message, require_member},
    error::UseCaseError,
};

/// 絵文字の最大文字数
pub const MAX_EMOJI_LENGTH: usize = 32;

/// リアクション操作の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionChange {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    /// 操作後のメッセージの全リアクション
    pub reactions: Vec<Reaction>,
}

pub struct ReactToMessageUseCase {
    chats: Arc<dyn ChatRepository>,
    messages: Arc<dyn MessageRepository>,
    reactions: Arc<dyn ReactionRepository>,
}

impl ReactToMessageUseCase {
    pub fn new(
        chats: Arc<dyn ChatRepository>,
        messages: Arc<dyn MessageRepository>,
        reactions: Arc<dyn ReactionRepository>,
    ) -> Self {
        Self {
            chats,
            messages,
            reactions,
        }
    }

    pub async fn add(
        &self,
        user_id: &UserId,
        message_id: MessageId,
        emoji: &str,
    ) -> Result<ReactionChange, UseCaseError> {
        let chat_id = self.authorize(user_id, message_id, emoji).await?;
        self.reactions.add(message_id, user_id, emoji).await?;
        self.summarize(chat_id, message_id).await
    }

    pub async fn remove(
        &self,
        user_id: &UserId,
        message_id: MessageId,
        emoji: &str,
    ) -> Result<ReactionChange, UseCaseError> {
        let chat_id = self.authorize(user_id, message_id, emoji).await?;
        self.reactions.remove(message_id, user_id, emoji).await?;
        self.summarize(chat_id, message_id).await
    }

    async fn authorize(
        &self,
        user_id: &UserId,
        message_id: MessageId,
        emoji: &str,
    ) -> Result<ChatId, UseCaseError> {
        validate_emoji(emoji)?;
        let message = load_live_message(self.messages.as_ref(), message_id).await?;
        require_member(self.chats.as_ref(), message.chat_id, user_id).await?;
        Ok(message.chat_id)
    }

    async fn summarize(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<ReactionChange, UseCaseError> {
        let reactions = self.reactions.list_by_message(message_id).await?;
        Ok(ReactionChange {
            chat_id,
            message_id,
            reactions,
        })
    }
}

fn validate_emoji(emoji: &str) -> Result<(), UseCaseError> {
    let length = emoji.chars().count();
    if emoji.trim().is_empty() || length > MAX_EMOJI_LENGTH {
        return Err(UseCaseError::InvalidInput(format!(
            "emoji must be 1 to {MAX_EMOJI_LENGTH} characters (got {length})"
        )));
    }
    Ok(())
}
