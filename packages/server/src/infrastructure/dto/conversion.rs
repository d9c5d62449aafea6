//! Conversion logic from domain entities to outbound payloads.

use std::collections::BTreeMap;

use crate::domain::{Attachment, Chat, Message, Pin, Reaction};
use crate::infrastructure::dto::websocket::{
    ChatPayload, MessagePayload, NewMessageRequest, PinPayload, ReactionSummary,
};
use crate::usecase::SendMessageInput;

impl From<NewMessageRequest> for SendMessageInput {
    fn from(request: NewMessageRequest) -> Self {
        let attachment = request.file_url.map(|url| Attachment {
            url,
            name: request.file_name,
            size: request.file_size,
        });
        Self {
            chat_id: request.chat_id,
            content: request.content,
            content_type: request.content_type,
            attachment,
            reply_to_id: request.reply_to_id,
        }
    }
}

impl From<Message> for MessagePayload {
    fn from(message: Message) -> Self {
        let (file_url, file_name, file_size) = match message.attachment {
            Some(attachment) => (Some(attachment.url), attachment.name, attachment.size),
            None => (None, None, None),
        };
        Self {
            id: message.id,
            chat_id: message.chat_id,
            sender_id: message.sender_id,
            content: message.content,
            content_type: message.content_type,
            file_url,
            file_name,
            file_size,
            reply_to_id: message.reply_to_id,
            forwarded_from_id: message.forwarded_from_id,
            created_at: message.created_at.value(),
            edited_at: message.edited_at.map(|t| t.value()),
        }
    }
}

impl From<Pin> for PinPayload {
    fn from(pin: Pin) -> Self {
        Self {
            chat_id: pin.chat_id,
            message_id: pin.message_id,
            user_id: pin.pinned_by,
            pinned_at: Some(pin.pinned_at.value()),
        }
    }
}

impl From<Chat> for ChatPayload {
    fn from(chat: Chat) -> Self {
        let member_ids = chat.member_ids();
        Self {
            chat_id: chat.id,
            name: chat.name,
            member_ids,
        }
    }
}

/// Group a message's reactions per emoji, ordered by emoji.
pub fn summarize_reactions(reactions: Vec<Reaction>) -> Vec<ReactionSummary> {
    let mut grouped: BTreeMap<String, ReactionSummary> = BTreeMap::new();
    for reaction in reactions {
        let summary = grouped
            .entry(reaction.emoji.clone())
            .or_insert_with(|| ReactionSummary {
                emoji: reaction.emoji,
                count: 0,
                user_ids: Vec::new(),
            });
        summary.count += 1;
        summary.user_ids.push(reaction.user_id);
    }
    grouped.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, ChatMember, MemberRole, MessageId, Timestamp, UserId};

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn reaction(user_id: &str, emoji: &str) -> Reaction {
        Reaction {
            message_id: MessageId::new(1).unwrap(),
            user_id: user(user_id),
            emoji: emoji.to_string(),
            created_at: Timestamp::new(1000),
        }
    }

    #[test]
    fn test_message_with_attachment_to_payload() {
        // テスト項目: 添付ファイル付きメッセージがフラットなペイロードに変換される
        // given (前提条件):
        let message = Message {
            id: MessageId::new(10).unwrap(),
            chat_id: ChatId::new(2).unwrap(),
            sender_id: user("alice"),
            content: String::new(),
            content_type: "file".to_string(),
            attachment: Some(Attachment {
                url: "https://files.example/report.pdf".to_string(),
                name: Some("report.pdf".to_string()),
                size: Some(4096),
            }),
            reply_to_id: None,
            forwarded_from_id: None,
            created_at: Timestamp::new(1000),
            edited_at: Some(Timestamp::new(2000)),
            deleted_at: None,
        };

        // when (操作):
        let payload: MessagePayload = message.into();

        // then (期待する結果):
        assert_eq!(payload.id, MessageId::new(10).unwrap());
        assert_eq!(
            payload.file_url.as_deref(),
            Some("https://files.example/report.pdf")
        );
        assert_eq!(payload.file_name.as_deref(), Some("report.pdf"));
        assert_eq!(payload.file_size, Some(4096));
        assert_eq!(payload.created_at, 1000);
        assert_eq!(payload.edited_at, Some(2000));
    }

    #[test]
    fn test_chat_to_payload_lists_member_ids() {
        // テスト項目: チャットのペイロードにメンバー ID が含まれる
        // given (前提条件):
        let chat = Chat {
            id: ChatId::new(4).unwrap(),
            name: "team".to_string(),
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
        };

        // when (操作):
        let payload: ChatPayload = chat.into();

        // then (期待する結果):
        assert_eq!(payload.member_ids, vec![user("alice"), user("bob")]);
    }

    #[test]
    fn test_summarize_reactions_groups_by_emoji() {
        // テスト項目: リアクションが絵文字ごとに集計される
        // given (前提条件):
        let reactions = vec![
            reaction("alice", "👍"),
            reaction("bob", "🎉"),
            reaction("carol", "👍"),
        ];

        // when (操作):
        let summary = summarize_reactions(reactions);

        // then (期待する結果):
        assert_eq!(summary.len(), 2);
        let thumbs = summary.iter().find(|s| s.emoji == "👍").unwrap();
        assert_eq!(thumbs.count, 2);
        assert_eq!(thumbs.user_ids, vec![user("alice"), user("carol")]);
    }

    #[test]
    fn test_summarize_reactions_empty() {
        // テスト項目: リアクションがなければ空の集計になる
        // given (前提条件):

        // when (操作):
        let summary = summarize_reactions(Vec::new());

        // then (期待する結果):
        assert!(summary.is_empty());
    }
}
