//! UseCase errors.

use thiserror::Error;

use crate::domain::{ChatId, MessageId, RepositoryError, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UseCaseError {
    #[error("user '{user_id}' is not a member of chat {chat_id}")]
    NotMember { chat_id: ChatId, user_id: UserId },

    #[error("message {0} not found")]
    MessageNotFound(MessageId),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid request: {0}")]
    InvalidInput(String),

    #[error("persistence failed: {0}")]
    Repository(#[from] RepositoryError),
}

impl UseCaseError {
    /// Error code sent to the client in the `error` event.
    pub fn code(&self) -> &'static str {
        match self {
            UseCaseError::NotMember { .. } => "not_member",
            UseCaseError::MessageNotFound(_) => "not_found",
            UseCaseError::Forbidden(_) => "forbidden",
            UseCaseError::InvalidInput(_) => "invalid_request",
            UseCaseError::Repository(_) => "persistence_failed",
        }
    }
}
