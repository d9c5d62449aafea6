//! Repository implementations.
//!
//! 本番環境ではリレーショナルストアを持つ外部サービスが永続化を担当します。
//! ここではプロセス内で完結するインメモリ実装を提供します。

pub mod inmemory;

pub use inmemory::{
    InMemoryChatRepository, InMemoryMessageRepository, InMemoryPinRepository,
    InMemoryReactionRepository, SeedError,
};
