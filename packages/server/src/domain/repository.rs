//! Repository trait 定義
//!
//! ハブが必要とする永続化コラボレーターのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層（またはこのコアの外側）が提供します（依存性の逆転）。
//!
//! 実装は並行に呼び出されても安全でなければなりません（`Send + Sync`）。

use async_trait::async_trait;

use super::{
    ChatId, MemberRole, MessageId, RepositoryError, Timestamp, UserId,
    entity::{Message, NewMessage, Pin, Reaction},
};

/// チャットとメンバーシップ
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// チャットのメンバー ID 一覧
    async fn member_ids(&self, chat_id: ChatId) -> Result<Vec<UserId>, RepositoryError>;

    /// メンバーの権限（メンバーでなければ `None`）
    async fn member_role(
        &self,
        chat_id: ChatId,
        user_id: &UserId,
    ) -> Result<Option<MemberRole>, RepositoryError>;

    /// ユーザーが所属する全チャットの ID
    async fn chat_ids_for_user(&self, user_id: &UserId) -> Result<Vec<ChatId>, RepositoryError>;

    /// (chat, user) の既読位置を更新
    async fn update_last_read(
        &self,
        chat_id: ChatId,
        user_id: &UserId,
        message_id: MessageId,
        read_at: Timestamp,
    ) -> Result<(), RepositoryError>;
}

/// メッセージ
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: NewMessage) -> Result<Message, RepositoryError>;

    async fn get(&self, message_id: MessageId) -> Result<Option<Message>, RepositoryError>;

    async fn edit(&self, message_id: MessageId, content: String)
    -> Result<Message, RepositoryError>;

    /// 論理削除
    async fn soft_delete(&self, message_id: MessageId) -> Result<Message, RepositoryError>;

    /// 新しい順に最大 `limit` 件
    async fn list_by_chat(
        &self,
        chat_id: ChatId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError>;
}

/// リアクション
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReactionRepository: Send + Sync {
    async fn add(
        &self,
        message_id: MessageId,
        user_id: &UserId,
        emoji: &str,
    ) -> Result<Reaction, RepositoryError>;

    async fn remove(
        &self,
        message_id: MessageId,
        user_id: &UserId,
        emoji: &str,
    ) -> Result<(), RepositoryError>;

    async fn list_by_message(&self, message_id: MessageId)
    -> Result<Vec<Reaction>, RepositoryError>;
}

/// ピン留め
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PinRepository: Send + Sync {
    async fn add(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        pinned_by: &UserId,
    ) -> Result<Pin, RepositoryError>;

    async fn remove(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), RepositoryError>;

    async fn list_by_chat(&self, chat_id: ChatId) -> Result<Vec<Pin>, RepositoryError>;
}
