//! Domain layer
//!
//! チャットのドメインモデルと、ハブが依存するコラボレーター（永続化・通知）の
//! インターフェースを定義します。具体的な実装は Infrastructure 層が提供します。

pub mod entity;
pub mod error;
pub mod notifier;
pub mod repository;
pub mod value_object;

pub use entity::{
    Attachment, Chat, ChatMember, MemberRole, Message, NewMessage, Pin, PushNotification, Reaction,
};
pub use error::{NotifyError, RepositoryError, ValueObjectError};
pub use notifier::PushNotifier;
pub use repository::{ChatRepository, MessageRepository, PinRepository, ReactionRepository};
pub use value_object::{ChatId, ConnectionId, MessageId, Timestamp, UserId};

#[cfg(test)]
pub use notifier::MockPushNotifier;
#[cfg(test)]
pub use repository::{MockPinRepository, MockReactionRepository};
