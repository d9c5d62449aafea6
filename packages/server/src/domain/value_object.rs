//! Value Objects
//!
//! 生成時に検証を行い、不正な値がドメインに入り込まないようにします。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// UserId の最大長
pub const MAX_USER_ID_LENGTH: usize = 64;

/// 上流の認証コラボレーターが検証済みのユーザー ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::EmptyUserId);
        }
        let length = value.chars().count();
        if length > MAX_USER_ID_LENGTH {
            return Err(ValueObjectError::UserIdTooLong {
                max: MAX_USER_ID_LENGTH,
                actual: length,
            });
        }
        if value.chars().any(char::is_whitespace) {
            return Err(ValueObjectError::InvalidUserId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! positive_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub struct $name(i64);

        impl $name {
            pub fn new(value: i64) -> Result<Self, ValueObjectError> {
                if value <= 0 {
                    return Err(ValueObjectError::NonPositiveId(value));
                }
                Ok(Self(value))
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = ValueObjectError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

positive_id!(
    /// チャット ID
    ChatId
);

positive_id!(
    /// メッセージ ID
    MessageId
);

/// 物理接続ごとに払い出される ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_accepts_valid_value() {
        // テスト項目: 有効な文字列から UserId を生成できる
        // given (前提条件):
        let raw = "alice".to_string();

        // when (操作):
        let result = UserId::new(raw);

        // then (期待する結果):
        assert_eq!(result.unwrap().as_str(), "alice");
    }

    #[test]
    fn test_user_id_rejects_empty_value() {
        // テスト項目: 空文字列は UserId として拒否される
        // given (前提条件):
        let raw = String::new();

        // when (操作):
        let result = UserId::new(raw);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::EmptyUserId));
    }

    #[test]
    fn test_user_id_rejects_too_long_value() {
        // テスト項目: 最大長を超える UserId は拒否される
        // given (前提条件):
        let raw = "a".repeat(MAX_USER_ID_LENGTH + 1);

        // when (操作):
        let result = UserId::new(raw);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValueObjectError::UserIdTooLong {
                max: MAX_USER_ID_LENGTH,
                actual: MAX_USER_ID_LENGTH + 1,
            })
        );
    }

    #[test]
    fn test_user_id_rejects_whitespace() {
        // テスト項目: 空白を含む UserId は拒否される
        // given (前提条件):
        let raw = "alice smith".to_string();

        // when (操作):
        let result = UserId::new(raw);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::InvalidUserId));
    }

    #[test]
    fn test_chat_id_rejects_non_positive_value() {
        // テスト項目: 0 以下の ChatId は拒否される
        // given (前提条件):

        // when (操作):
        let zero = ChatId::new(0);
        let negative = ChatId::new(-3);

        // then (期待する結果):
        assert_eq!(zero, Err(ValueObjectError::NonPositiveId(0)));
        assert_eq!(negative, Err(ValueObjectError::NonPositiveId(-3)));
    }

    #[test]
    fn test_connection_ids_are_unique() {
        // テスト項目: ConnectionId は生成のたびに異なる値になる
        // given (前提条件):

        // when (操作):
        let first = ConnectionId::generate();
        let second = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(first, second);
    }
}
