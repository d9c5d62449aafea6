//! Inbound event dispatch
//!
//! 受信イベントを UseCase で検証・永続化し、成功した場合のみ配信します。
//! 失敗は送信元の接続にだけ `error` イベントとして返し、ブロードキャストは行いません。
//!
//! ## 配信先
//! - 送信者自身の入力を返すイベント（new_message、転送、typing）は送信元の接続を除外
//! - 状態変更（編集、削除、リアクション、既読、ピン留め）は送信元を含む全メンバーに配信

use std::{collections::BTreeMap, sync::Arc};

use crate::{
    domain::{ChatId, Message, MessageId, PushNotification, UserId},
    infrastructure::dto::{
        conversion::summarize_reactions,
        websocket::{
            ErrorPayload, InboundEvent, MessageDeletedPayload, MessageReadPayload,
            OutboundEvent, PinPayload, ReactionPayload, TypingPayload,
        },
    },
    usecase::{ReactionChange, UseCaseError, require_member},
};

use super::{Client, Hub};

/// Characters of message content included in a push notification body.
const PUSH_PREVIEW_LENGTH: usize = 100;

impl Hub {
    /// Interpret one inbound event from `client`.
    ///
    /// Never fails: errors are reported to `client` as an `error` event.
    pub async fn dispatch(&self, client: &Arc<Client>, event: InboundEvent) {
        let kind = event.kind();
        if !self.is_running() {
            tracing::debug!(kind, connection_id = %client.id(), "Hub stopped, dropping event");
            return;
        }

        let user_id = client.user_id();
        let result = match event {
            InboundEvent::NewMessage(request) => {
                match self.send_message.execute(user_id, request.into()).await {
                    Ok(message) => self.deliver_new_message(client, message).await,
                    Err(e) => Err(e),
                }
            }
            InboundEvent::ForwardMessage {
                message_id,
                forward_chat_id,
            } => {
                match self
                    .send_message
                    .forward(user_id, message_id, forward_chat_id)
                    .await
                {
                    Ok(message) => self.deliver_new_message(client, message).await,
                    Err(e) => Err(e),
                }
            }
            InboundEvent::EditMessage {
                message_id,
                content,
            } => self.on_edit_message(user_id, message_id, content).await,
            InboundEvent::DeleteMessage { message_id } => {
                self.on_delete_message(user_id, message_id).await
            }
            InboundEvent::AddReaction { message_id, emoji } => {
                let change = self.react.add(user_id, message_id, &emoji).await;
                self.deliver_reaction(user_id, emoji, change, true).await
            }
            InboundEvent::RemoveReaction { message_id, emoji } => {
                let change = self.react.remove(user_id, message_id, &emoji).await;
                self.deliver_reaction(user_id, emoji, change, false).await
            }
            InboundEvent::Typing { chat_id } => self.on_typing(client, chat_id).await,
            InboundEvent::MarkRead {
                chat_id,
                message_id,
            } => self.on_mark_read(user_id, chat_id, message_id).await,
            InboundEvent::PinMessage {
                chat_id,
                message_id,
            } => self.on_pin(user_id, chat_id, message_id).await,
            InboundEvent::UnpinMessage {
                chat_id,
                message_id,
            } => self.on_unpin(user_id, chat_id, message_id).await,
        };

        if let Err(error) = result {
            tracing::warn!(
                user_id = %user_id,
                connection_id = %client.id(),
                kind,
                code = error.code(),
                error = %error,
                "Dispatch failed"
            );
            client.enqueue(Arc::new(OutboundEvent::Error(ErrorPayload {
                code: error.code().to_string(),
                message: error.to_string(),
                request_type: Some(kind.to_string()),
            })));
        }
    }

    /// Fan out a freshly created message and push-notify offline members.
    async fn deliver_new_message(
        &self,
        client: &Arc<Client>,
        message: Message,
    ) -> Result<(), UseCaseError> {
        let chat_id = message.chat_id;
        let sender_id = message.sender_id.clone();
        let notification = push_notification_for(&message);

        let event = Arc::new(OutboundEvent::NewMessage(message.into()));
        let fan_out = self.broadcast(chat_id, event, Some(client)).await?;

        let recipients: Vec<UserId> = fan_out
            .members
            .into_iter()
            .filter(|member| member != &sender_id)
            .collect();
        for user_id in self.offline_among(&recipients).await {
            let notifier = Arc::clone(&self.notifier);
            let notification = notification.clone();
            tokio::spawn(async move {
                if let Err(e) = notifier.notify(&user_id, notification).await {
                    tracing::warn!(user_id = %user_id, error = %e, "Push notification failed");
                }
            });
        }
        Ok(())
    }

    async fn on_edit_message(
        &self,
        user_id: &UserId,
        message_id: MessageId,
        content: String,
    ) -> Result<(), UseCaseError> {
        let message = self
            .edit_message
            .execute(user_id, message_id, content)
            .await?;
        let chat_id = message.chat_id;
        let event = OutboundEvent::MessageEdited(message.into());
        self.broadcast(chat_id, Arc::new(event), None).await?;
        Ok(())
    }

    async fn on_delete_message(
        &self,
        user_id: &UserId,
        message_id: MessageId,
    ) -> Result<(), UseCaseError> {
        let message = self.delete_message.execute(user_id, message_id).await?;
        let event = OutboundEvent::MessageDeleted(MessageDeletedPayload {
            chat_id: message.chat_id,
            message_id: message.id,
            deleted_by: user_id.clone(),
        });
        self.broadcast(message.chat_id, Arc::new(event), None).await?;
        Ok(())
    }

    async fn deliver_reaction(
        &self,
        user_id: &UserId,
        emoji: String,
        change: Result<ReactionChange, UseCaseError>,
        added: bool,
    ) -> Result<(), UseCaseError> {
        let change = change?;
        let payload = ReactionPayload {
            chat_id: change.chat_id,
            message_id: change.message_id,
            user_id: user_id.clone(),
            emoji,
            reactions: summarize_reactions(change.reactions),
        };
        let event = if added {
            OutboundEvent::ReactionAdded(payload)
        } else {
            OutboundEvent::ReactionRemoved(payload)
        };
        self.broadcast(change.chat_id, Arc::new(event), None).await?;
        Ok(())
    }

    async fn on_typing(&self, client: &Arc<Client>, chat_id: ChatId) -> Result<(), UseCaseError> {
        require_member(self.chats.as_ref(), chat_id, client.user_id()).await?;
        let event = OutboundEvent::Typing(TypingPayload {
            chat_id,
            user_id: client.user_id().clone(),
        });
        self.broadcast(chat_id, Arc::new(event), Some(client)).await?;
        Ok(())
    }

    async fn on_mark_read(
        &self,
        user_id: &UserId,
        chat_id: ChatId,
        message_id: Option<MessageId>,
    ) -> Result<(), UseCaseError> {
        let read_at = self.now();
        let Some(message_id) = self
            .mark_read
            .execute(user_id, chat_id, message_id, read_at)
            .await?
        else {
            return Ok(());
        };
        let event = OutboundEvent::MessageRead(MessageReadPayload {
            chat_id,
            user_id: user_id.clone(),
            message_id,
            read_at: read_at.value(),
        });
        self.broadcast(chat_id, Arc::new(event), None).await?;
        Ok(())
    }

    async fn on_pin(
        &self,
        user_id: &UserId,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), UseCaseError> {
        let pin = self.pin_message.pin(user_id, chat_id, message_id).await?;
        let event = OutboundEvent::MessagePinned(pin.into());
        self.broadcast(chat_id, Arc::new(event), None).await?;
        Ok(())
    }

    async fn on_unpin(
        &self,
        user_id: &UserId,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), UseCaseError> {
        self.pin_message.unpin(user_id, chat_id, message_id).await?;
        let event = OutboundEvent::MessageUnpinned(PinPayload {
            chat_id,
            message_id,
            user_id: user_id.clone(),
            pinned_at: None,
        });
        self.broadcast(chat_id, Arc::new(event), None).await?;
        Ok(())
    }
}

fn push_notification_for(message: &Message) -> PushNotification {
    let body = if message.content.is_empty() {
        message
            .attachment
            .as_ref()
            .and_then(|attachment| attachment.name.clone())
            .unwrap_or_else(|| "Sent an attachment".to_string())
    } else {
        message.content.chars().take(PUSH_PREVIEW_LENGTH).collect()
    };

    let mut data = BTreeMap::new();
    data.insert("type".to_string(), "new_message".to_string());
    data.insert("chat_id".to_string(), message.chat_id.to_string());
    data.insert("message_id".to_string(), message.id.to_string());

    PushNotification {
        title: message.sender_id.to_string(),
        body,
        data,
    }
}
