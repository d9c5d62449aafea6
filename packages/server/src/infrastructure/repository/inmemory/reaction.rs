//! InMemory Reaction Repository 実装

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use yoriai_shared::time::Clock;

use crate::domain::{MessageId, Reaction, ReactionRepository, RepositoryError, Timestamp, UserId};

/// インメモリ Reaction Repository 実装
///
/// (message, user, emoji) の組は一意です。
pub struct InMemoryReactionRepository {
    reactions: Mutex<Vec<Reaction>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryReactionRepository {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            reactions: Mutex::new(Vec::new()),
            clock,
        }
    }
}

fn same_row(reaction: &Reaction, message_id: MessageId, user_id: &UserId, emoji: &str) -> bool {
    reaction.message_id == message_id && &reaction.user_id == user_id && reaction.emoji == emoji
}

#[async_trait]
impl ReactionRepository for InMemoryReactionRepository {
    async fn add(
        &self,
        message_id: MessageId,
        user_id: &UserId,
        emoji: &str,
    ) -> Result<Reaction, RepositoryError> {
        let mut reactions = self.reactions.lock().await;
        if let Some(existing) = reactions
            .iter()
            .find(|r| same_row(r, message_id, user_id, emoji))
        {
            return Ok(existing.clone());
        }
        let reaction = Reaction {
            message_id,
            user_id: user_id.clone(),
            emoji: emoji.to_string(),
            created_at: Timestamp::new(self.clock.now_millis()),
        };
        reactions.push(reaction.clone());
        Ok(reaction)
    }

    async fn remove(
        &self,
        message_id: MessageId,
        user_id: &UserId,
        emoji: &str,
    ) -> Result<(), RepositoryError> {
        let mut reactions = self.reactions.lock().await;
        let before = reactions.len();
        reactions.retain(|r| !same_row(r, message_id, user_id, emoji));
        if reactions.len() == before {
            return Err(RepositoryError::NotFound(format!(
                "reaction {emoji} by {user_id} on message {message_id}"
            )));
        }
        Ok(())
    }

    async fn list_by_message(
        &self,
        message_id: MessageId,
    ) -> Result<Vec<Reaction>, RepositoryError> {
        let reactions = self.reactions.lock().await;
        Ok(reactions
            .iter()
            .filter(|r| r.message_id == message_id)
            .cloned()
            .collect())
    }
}
