//! InMemory Repository 実装
//!
//! HashMap をインメモリ DB として使用します。各リポジトリは独立した
//! `tokio::sync::Mutex` を持つため、異なる集約への呼び出しは互いをブロックしません。

mod chat;
mod message;
mod pin;
mod reaction;

pub use chat::{InMemoryChatRepository, SeedError};
pub use message::InMemoryMessageRepository;
pub use pin::InMemoryPinRepository;
pub use reaction::InMemoryReactionRepository;
