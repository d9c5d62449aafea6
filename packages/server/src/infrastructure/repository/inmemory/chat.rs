//! InMemory Chat Repository 実装

use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::{
    Chat, ChatId, ChatRepository, MemberRole, MessageId, RepositoryError, Timestamp, UserId,
};

/// シードファイルの読み込みエラー
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse seed file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// シードファイルの形式
///
/// ```json
/// { "chats": [ { "id": 1, "name": "general",
///                "members": [ { "user_id": "alice", "role": "owner" } ] } ] }
/// ```
#[derive(Debug, Deserialize)]
struct Seed {
    chats: Vec<Chat>,
}

#[derive(Debug, Default)]
struct ChatStore {
    chats: HashMap<ChatId, Chat>,
    /// (chat, user) -> 既読位置
    last_read: HashMap<(ChatId, UserId), (MessageId, Timestamp)>,
}

/// インメモリ Chat Repository 実装
#[derive(Debug, Default)]
pub struct InMemoryChatRepository {
    store: Mutex<ChatStore>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chats(chats: Vec<Chat>) -> Self {
        let chats = chats.into_iter().map(|chat| (chat.id, chat)).collect();
        Self {
            store: Mutex::new(ChatStore {
                chats,
                last_read: HashMap::new(),
            }),
        }
    }

    /// JSON のシードファイルからチャットを読み込む
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path)?;
        let seed: Seed = serde_json::from_str(&raw)?;
        Ok(Self::with_chats(seed.chats))
    }

    /// 既読位置を取得
    pub async fn last_read(&self, chat_id: ChatId, user_id: &UserId) -> Option<MessageId> {
        let store = self.store.lock().await;
        store
            .last_read
            .get(&(chat_id, user_id.clone()))
            .map(|(message_id, _)| *message_id)
    }

    pub async fn count_chats(&self) -> usize {
        self.store.lock().await.chats.len()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn member_ids(&self, chat_id: ChatId) -> Result<Vec<UserId>, RepositoryError> {
        let store = self.store.lock().await;
        store
            .chats
            .get(&chat_id)
            .map(Chat::member_ids)
            .ok_or_else(|| RepositoryError::NotFound(format!("chat {chat_id}")))
    }

    async fn member_role(
        &self,
        chat_id: ChatId,
        user_id: &UserId,
    ) -> Result<Option<MemberRole>, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store
            .chats
            .get(&chat_id)
            .and_then(|chat| chat.role_of(user_id)))
    }

    async fn chat_ids_for_user(&self, user_id: &UserId) -> Result<Vec<ChatId>, RepositoryError> {
        let store = self.store.lock().await;
        let mut chat_ids: Vec<ChatId> = store
            .chats
            .values()
            .filter(|chat| chat.role_of(user_id).is_some())
            .map(|chat| chat.id)
            .collect();
        chat_ids.sort();
        Ok(chat_ids)
    }

    async fn update_last_read(
        &self,
        chat_id: ChatId,
        user_id: &UserId,
        message_id: MessageId,
        read_at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().await;
        if !store.chats.contains_key(&chat_id) {
            return Err(RepositoryError::NotFound(format!("chat {chat_id}")));
        }
        let entry = store
            .last_read
            .entry((chat_id, user_id.clone()))
            .or_insert((message_id, read_at));
        // 既読位置は後退しない
        if message_id >= entry.0 {
            *entry = (message_id, read_at);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChatMember;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn chat(id: i64, members: &[(&str, MemberRole)]) -> Chat {
        Chat {
            id: ChatId::new(id).unwrap(),
            name: format!("chat-{id}"),
            members: members
                .iter()
                .map(|(user_id, role)| ChatMember {
                    user_id: user(user_id),
                    role: *role,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_member_ids_of_existing_chat() {
        // テスト項目: 既存チャットのメンバー ID を取得できる
        // given (前提条件):
        let repository = InMemoryChatRepository::with_chats(vec![chat(
            1,
            &[("alice", MemberRole::Owner), ("bob", MemberRole::Member)],
        )]);

        // when (操作):
        let result = repository.member_ids(ChatId::new(1).unwrap()).await;

        // then (期待する結果):
        assert_eq!(result, Ok(vec![user("alice"), user("bob")]));
    }

    #[tokio::test]
    async fn test_member_ids_of_missing_chat() {
        // テスト項目: 存在しないチャットは NotFound になる
        // given (前提条件):
        let repository = InMemoryChatRepository::new();

        // when (操作):
        let result = repository.member_ids(ChatId::new(9).unwrap()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_chat_ids_for_user_sorted() {
        // テスト項目: ユーザーが所属するチャットだけが ID 順に返される
        // given (前提条件):
        let repository = InMemoryChatRepository::with_chats(vec![
            chat(3, &[("alice", MemberRole::Member)]),
            chat(1, &[("alice", MemberRole::Admin), ("bob", MemberRole::Member)]),
            chat(2, &[("bob", MemberRole::Owner)]),
        ]);

        // when (操作):
        let result = repository.chat_ids_for_user(&user("alice")).await.unwrap();

        // then (期待する結果):
        assert_eq!(result, vec![ChatId::new(1).unwrap(), ChatId::new(3).unwrap()]);
    }

    #[tokio::test]
    async fn test_last_read_never_moves_backwards() {
        // テスト項目: 既読位置は古いメッセージで上書きされない
        // given (前提条件):
        let repository =
            InMemoryChatRepository::with_chats(vec![chat(1, &[("alice", MemberRole::Member)])]);
        let chat_id = ChatId::new(1).unwrap();
        let alice = user("alice");
        repository
            .update_last_read(chat_id, &alice, MessageId::new(5).unwrap(), Timestamp::new(10))
            .await
            .unwrap();

        // when (操作):
        repository
            .update_last_read(chat_id, &alice, MessageId::new(3).unwrap(), Timestamp::new(20))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            repository.last_read(chat_id, &alice).await,
            Some(MessageId::new(5).unwrap())
        );
    }

    #[test]
    fn test_seed_parsing() {
        // テスト項目: シード JSON からチャットを読み込める
        // given (前提条件):
        let raw = r#"{"chats":[{"id":1,"name":"general","members":[
            {"user_id":"alice","role":"owner"},{"user_id":"bob","role":"member"}]}]}"#;

        // when (操作):
        let seed: Seed = serde_json::from_str(raw).unwrap();

        // then (期待する結果):
        assert_eq!(seed.chats.len(), 1);
        assert_eq!(seed.chats[0].role_of(&user("alice")), Some(MemberRole::Owner));
    }
}
