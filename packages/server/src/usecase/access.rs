//! Membership and message lookups shared by the use cases.

use crate::domain::{
    ChatId, ChatRepository, MemberRole, Message, MessageId, MessageRepository, UserId,
};

use super::error::UseCaseError;

/// Resolve the caller's role in the chat, failing when they are not a member.
pub async fn require_member(
    chats: &dyn ChatRepository,
    chat_id: ChatId,
    user_id: &UserId,
) -> Result<MemberRole, UseCaseError> {
    chats
        .member_role(chat_id, user_id)
        .await?
        .ok_or_else(|| UseCaseError::NotMember {
            chat_id,
            user_id: user_id.clone(),
        })
}

/// Load a message that has not been deleted.
pub(crate) async fn load_live_message(
    messages: &dyn MessageRepository,
    message_id: MessageId,
) -> Result<Message, UseCaseError> {
    match messages.get(message_id).await? {
        Some(message) if !message.is_deleted() => Ok(message),
        _ => Err(UseCaseError::MessageNotFound(message_id)),
    }
}
