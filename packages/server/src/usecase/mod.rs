//! UseCase layer
//!
//! 受信イベントごとの検証と永続化を担当します。ブロードキャストは行わず、
//! 結果をハブに返します（ハブが配信先を計算して送信キューに積みます）。

mod access;
mod delete_message;
mod edit_message;
mod error;
mod mark_read;
mod pin_message;
mod react_to_message;
mod send_message;

pub use access::require_member;
pub use delete_message::DeleteMessageUseCase;
pub use edit_message::EditMessageUseCase;
pub use error::UseCaseError;
pub use mark_read::MarkReadUseCase;
pub use pin_message::PinMessageUseCase;
pub use react_to_message::{MAX_EMOJI_LENGTH, ReactToMessageUseCase, ReactionChange};
pub use send_message::{MAX_CONTENT_LENGTH, SendMessageInput, SendMessageUseCase};
