//! Domain errors.

use thiserror::Error;

/// Value Object の生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("user id must not be empty")]
    EmptyUserId,

    #[error("user id must be at most {max} characters (got {actual})")]
    UserIdTooLong { max: usize, actual: usize },

    #[error("user id must not contain whitespace")]
    InvalidUserId,

    #[error("id must be positive (got {0})")]
    NonPositiveId(i64),
}

/// 永続化コラボレーターのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// 対象のレコードが存在しない
    #[error("{0} not found")]
    NotFound(String),

    /// 一意制約などの競合
    #[error("conflict: {0}")]
    Conflict(String),

    /// ストアに到達できない、またはクエリが失敗した
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Push 通知コラボレーターのエラー
#[derive(Debug, Error, PartialEq)]
pub enum NotifyError {
    #[error("push gateway rejected notification: {0}")]
    Rejected(String),

    #[error("push gateway unreachable: {0}")]
    Transport(String),
}
