//! UseCase: メッセージ送信・転送処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() / forward() メソッド
//!
//! ### なぜこのテストが必要か
//! - 非メンバーのチャットには書き込めないことを保証
//! - 本文・添付のバリデーションと返信先の整合性を確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：テキスト送信、添付のみの送信、返信、転送
//! - 異常系：非メンバー、空メッセージ、長すぎる本文、別チャットへの返信、削除済みメッセージの転送

use std::sync::Arc;

use crate::domain::{
    Attachment, ChatId, ChatRepository, Message, MessageId, MessageRepository, NewMessage, UserId,
};

use super::{
    access::{load_live_message, require_member},
    error::UseCaseError,
};

/// 本文の最大文字数
pub const MAX_CONTENT_LENGTH: usize = 4000;

const TEXT_CONTENT_TYPE: &str = "text";
const FILE_CONTENT_TYPE: &str = "file";

/// 新規メッセージの入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageInput {
    pub chat_id: ChatId,
    pub content: String,
    pub content_type: Option<String>,
    pub attachment: Option<Attachment>,
    pub reply_to_id: Option<MessageId>,
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    chats: Arc<dyn ChatRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl SendMessageUseCase {
    pub fn new(chats: Arc<dyn ChatRepository>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { chats, messages }
    }

    /// メッセージを検証して永続化
    ///
    /// # Returns
    ///
    /// * `Ok(Message)` - 永続化されたメッセージ（ID とタイムスタンプが確定済み）
    /// * `Err(UseCaseError)` - 検証または永続化の失敗
    pub async fn execute(
        &self,
        sender: &UserId,
        input: SendMessageInput,
    ) -> Result<Message, UseCaseError> {
        require_member(self.chats.as_ref(), input.chat_id, sender).await?;
        validate_content(&input.content, input.attachment.is_some())?;

        if let Some(reply_to_id) = input.reply_to_id {
            let parent = load_live_message(self.messages.as_ref(), reply_to_id).await?;
            if parent.chat_id != input.chat_id {
                return Err(UseCaseError::InvalidInput(format!(
                    "reply target {reply_to_id} belongs to another chat"
                )));
            }
        }

        let content_type = input.content_type.unwrap_or_else(|| {
            if input.content.is_empty() && input.attachment.is_some() {
                FILE_CONTENT_TYPE.to_string()
            } else {
                TEXT_CONTENT_TYPE.to_string()
            }
        });

        let message = self
            .messages
            .create(NewMessage {
                chat_id: input.chat_id,
                sender_id: sender.clone(),
                content: input.content,
                content_type,
                attachment: input.attachment,
                reply_to_id: input.reply_to_id,
                forwarded_from_id: None,
            })
            .await?;
        Ok(message)
    }

    /// 既存メッセージを別のチャットへ転送
    ///
    /// 転送元・転送先の両方のメンバーである必要があります。
    pub async fn forward(
        &self,
        sender: &UserId,
        message_id: MessageId,
        target_chat_id: ChatId,
    ) -> Result<Message, UseCaseError> {
        let source = load_live_message(self.messages.as_ref(), message_id).await?;
        require_member(self.chats.as_ref(), source.chat_id, sender).await?;
        require_member(self.chats.as_ref(), target_chat_id, sender).await?;

        let message = self
            .messages
            .create(NewMessage {
                chat_id: target_chat_id,
                sender_id: sender.clone(),
                content: source.content,
                content_type: source.content_type,
                attachment: source.attachment,
                reply_to_id: None,
                forwarded_from_id: Some(source.id),
            })
            .await?;
        Ok(message)
    }
}

/// 本文のバリデーション（添付があれば本文は空でもよい）
pub(crate) fn validate_content(content: &str, has_attachment: bool) -> Result<(), UseCaseError> {
    if content.trim().is_empty() && !has_attachment {
        return Err(UseCaseError::InvalidInput(
            "message must have content or an attachment".to_string(),
        ));
    }
    let length = content.chars().count();
    if length > MAX_CONTENT_LENGTH {
        return Err(UseCaseError::InvalidInput(format!(
            "content must be at most {MAX_CONTENT_LENGTH} characters (got {length})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fixture, chat_id, user};

    fn text(chat: i64, content: &str) -> SendMessageInput {
        SendMessageInput {
            chat_id: chat_id(chat),
            content: content.to_string(),
            content_type: None,
            attachment: None,
            reply_to_id: None,
        }
    }

    fn usecase(fixture: &Fixture) -> SendMessageUseCase {
        SendMessageUseCase::new(fixture.chats.clone(), fixture.messages.clone())
    }

    #[tokio::test]
    async fn test_member_can_send_text_message() {
        // テスト項目: メンバーはテキストメッセージを送信できる
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = usecase(&fixture);

        // when (操作):
        let message = usecase.execute(&user("alice"), text(1, "hi")).await.unwrap();

        // then (期待する結果):
        assert_eq!(message.chat_id, chat_id(1));
        assert_eq!(message.sender_id, user("alice"));
        assert_eq!(message.content, "hi");
        assert_eq!(message.content_type, "text");
    }

    #[tokio::test]
    async fn test_non_member_is_rejected() {
        // テスト項目: 非メンバーの送信は not_member で拒否される
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = usecase(&fixture);

        // when (操作):
        let result = usecase.execute(&user("bob"), text(2, "hi")).await;

        // then (期待する結果):
        let error = result.unwrap_err();
        assert_eq!(error.code(), "not_member");
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        // テスト項目: 本文も添付もないメッセージは拒否される
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = usecase(&fixture);

        // when (操作):
        let result = usecase.execute(&user("alice"), text(1, "   ")).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err().code(), "invalid_request");
    }

    #[tokio::test]
    async fn test_attachment_only_message_defaults_to_file_type() {
        // テスト項目: 添付のみのメッセージは content_type が file になる
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = usecase(&fixture);
        let mut input = text(1, "");
        input.attachment = Some(Attachment {
            url: "https://files.example.com/a.png".to_string(),
            name: Some("a.png".to_string()),
            size: Some(1024),
        });

        // when (操作):
        let message = usecase.execute(&user("alice"), input).await.unwrap();

        // then (期待する結果):
        assert_eq!(message.content_type, "file");
        assert_eq!(
            message.attachment.unwrap().url,
            "https://files.example.com/a.png"
        );
    }

    #[tokio::test]
    async fn test_content_over_limit_is_rejected() {
        // テスト項目: 上限を超える本文は拒否される
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = usecase(&fixture);
        let content = "あ".repeat(MAX_CONTENT_LENGTH + 1);

        // when (操作):
        let result = usecase.execute(&user("alice"), text(1, &content)).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err().code(), "invalid_request");
    }

    #[tokio::test]
    async fn test_reply_to_message_in_another_chat_is_rejected() {
        // テスト項目: 別チャットのメッセージへの返信は拒否される
        // given (前提条件):
        let fixture = Fixture::new();
        let other = fixture.seed_message(2, "carol", "elsewhere").await;
        let usecase = usecase(&fixture);
        let mut input = text(1, "reply");
        input.reply_to_id = Some(other);

        // when (操作):
        let result = usecase.execute(&user("alice"), input).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err().code(), "invalid_request");
    }

    #[tokio::test]
    async fn test_forward_copies_content_and_links_source() {
        // テスト項目: 転送は本文をコピーし、転送元 ID を記録する
        // given (前提条件):
        let fixture = Fixture::new();
        let source = fixture.seed_message(1, "bob", "original").await;
        let usecase = usecase(&fixture);

        // when (操作):
        let message = usecase
            .forward(&user("alice"), source, chat_id(2))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(message.chat_id, chat_id(2));
        assert_eq!(message.sender_id, user("alice"));
        assert_eq!(message.content, "original");
        assert_eq!(message.forwarded_from_id, Some(source));
    }

    #[tokio::test]
    async fn test_forward_requires_membership_in_target_chat() {
        // テスト項目: 転送先のメンバーでなければ転送できない
        // given (前提条件):
        let fixture = Fixture::new();
        let source = fixture.seed_message(1, "alice", "original").await;
        let usecase = usecase(&fixture);

        // when (操作):
        let result = usecase.forward(&user("bob"), source, chat_id(2)).await;

        // then (期待する結果):
        assert!(matches!(result, Err(UseCaseError::NotMember { .. })));
    }
}
