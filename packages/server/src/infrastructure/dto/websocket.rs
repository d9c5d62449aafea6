//! WebSocket event protocol.
//!
//! Inbound events are client actions, tagged by `type` with flat fields:
//!
//! ```text
//! { "type": "new_message", "chat_id": 1, "content": "hi" }
//! ```
//!
//! Outbound events are `{ "type": <discriminator>, "payload": { ... } }`
//! envelopes whose payload shape is fixed per discriminator.

use serde::{Deserialize, Serialize};

use crate::domain::{ChatId, MessageId, UserId};

/// Protocol version reported to clients.
pub const PROTOCOL_VERSION: u32 = 1;

// ========================================
// Inbound
// ========================================

/// Client action received over the live connection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    NewMessage(NewMessageRequest),
    EditMessage {
        message_id: MessageId,
        content: String,
    },
    DeleteMessage {
        message_id: MessageId,
    },
    AddReaction {
        message_id: MessageId,
        emoji: String,
    },
    RemoveReaction {
        message_id: MessageId,
        emoji: String,
    },
    Typing {
        chat_id: ChatId,
    },
    MarkRead {
        chat_id: ChatId,
        #[serde(default)]
        message_id: Option<MessageId>,
    },
    PinMessage {
        chat_id: ChatId,
        message_id: MessageId,
    },
    UnpinMessage {
        chat_id: ChatId,
        message_id: MessageId,
    },
    ForwardMessage {
        message_id: MessageId,
        forward_chat_id: ChatId,
    },
}

impl InboundEvent {
    /// Discriminator as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::NewMessage(_) => "new_message",
            InboundEvent::EditMessage { .. } => "edit_message",
            InboundEvent::DeleteMessage { .. } => "delete_message",
            InboundEvent::AddReaction { .. } => "add_reaction",
            InboundEvent::RemoveReaction { .. } => "remove_reaction",
            InboundEvent::Typing { .. } => "typing",
            InboundEvent::MarkRead { .. } => "mark_read",
            InboundEvent::PinMessage { .. } => "pin_message",
            InboundEvent::UnpinMessage { .. } => "unpin_message",
            InboundEvent::ForwardMessage { .. } => "forward_message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewMessageRequest {
    pub chat_id: ChatId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default)]
    pub reply_to_id: Option<MessageId>,
}

// ========================================
// Outbound
// ========================================

/// Server event pushed to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum OutboundEvent {
    NewMessage(MessagePayload),
    MessageRead(MessageReadPayload),
    MessageEdited(MessagePayload),
    MessageDeleted(MessageDeletedPayload),
    Typing(TypingPayload),
    UserOnline(PresencePayload),
    UserOffline(PresencePayload),
    ChatCreated(ChatPayload),
    ReactionAdded(ReactionPayload),
    ReactionRemoved(ReactionPayload),
    MessagePinned(PinPayload),
    MessageUnpinned(PinPayload),
    MemberAdded(MemberPayload),
    MemberRemoved(MemberPayload),
    ChatUpdated(ChatPayload),
    Error(ErrorPayload),
}

impl OutboundEvent {
    /// Discriminator as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundEvent::NewMessage(_) => "new_message",
            OutboundEvent::MessageRead(_) => "message_read",
            OutboundEvent::MessageEdited(_) => "message_edited",
            OutboundEvent::MessageDeleted(_) => "message_deleted",
            OutboundEvent::Typing(_) => "typing",
            OutboundEvent::UserOnline(_) => "user_online",
            OutboundEvent::UserOffline(_) => "user_offline",
            OutboundEvent::ChatCreated(_) => "chat_created",
            OutboundEvent::ReactionAdded(_) => "reaction_added",
            OutboundEvent::ReactionRemoved(_) => "reaction_removed",
            OutboundEvent::MessagePinned(_) => "message_pinned",
            OutboundEvent::MessageUnpinned(_) => "message_unpinned",
            OutboundEvent::MemberAdded(_) => "member_added",
            OutboundEvent::MemberRemoved(_) => "member_removed",
            OutboundEvent::ChatUpdated(_) => "chat_updated",
            OutboundEvent::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagePayload {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub content: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<MessageId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forwarded_from_id: Option<MessageId>,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageDeletedPayload {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub deleted_by: UserId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageReadPayload {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub message_id: MessageId,
    pub read_at: i64,
}

/// Typing indicators intentionally carry no message id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypingPayload {
    pub chat_id: ChatId,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresencePayload {
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatPayload {
    pub chat_id: ChatId,
    pub name: String,
    pub member_ids: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReactionSummary {
    pub emoji: String,
    pub count: usize,
    pub user_ids: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReactionPayload {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub user_id: UserId,
    pub emoji: String,
    pub reactions: Vec<ReactionSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PinPayload {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberPayload {
    pub chat_id: ChatId,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_type: Option<String>,
}
