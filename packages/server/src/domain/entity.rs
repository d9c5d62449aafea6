//! Entities
//!
//! 永続化コラボレーターが所有するチャットの状態。ハブはこれらを読み取り、
//! 送信イベントのペイロードを組み立てます。

use std::collections::BTreeMap;

use serde::Deserialize;

use super::value_object::{ChatId, MessageId, Timestamp, UserId};

/// チャット内での権限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
}

impl MemberRole {
    /// 他人のメッセージ削除・ピン留めができるか
    pub fn can_moderate(&self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatMember {
    pub user_id: UserId,
    pub role: MemberRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub name: String,
    pub members: Vec<ChatMember>,
}

impl Chat {
    pub fn member_ids(&self) -> Vec<UserId> {
        self.members.iter().map(|m| m.user_id.clone()).collect()
    }

    pub fn role_of(&self, user_id: &UserId) -> Option<MemberRole> {
        self.members
            .iter()
            .find(|m| &m.user_id == user_id)
            .map(|m| m.role)
    }
}

/// 添付ファイル（アップロード自体は外部のファイルサーバーが担当）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub url: String,
    pub name: Option<String>,
    pub size: Option<i64>,
}

/// メッセージ作成コマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub content: String,
    pub content_type: String,
    pub attachment: Option<Attachment>,
    pub reply_to_id: Option<MessageId>,
    pub forwarded_from_id: Option<MessageId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub content: String,
    pub content_type: String,
    pub attachment: Option<Attachment>,
    pub reply_to_id: Option<MessageId>,
    pub forwarded_from_id: Option<MessageId>,
    pub created_at: Timestamp,
    pub edited_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
}

impl Message {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub message_id: MessageId,
    pub user_id: UserId,
    pub emoji: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub pinned_by: UserId,
    pub pinned_at: Timestamp,
}

/// デバイスへの Push 通知の内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
}
