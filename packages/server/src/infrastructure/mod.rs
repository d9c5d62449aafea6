//! Infrastructure layer
//!
//! - `dto`: WebSocket プロトコルの DTO とドメインとの変換
//! - `repository`: 永続化コラボレーターの実装（インメモリ）
//! - `notifier`: Push 通知コラボレーターの実装

pub mod dto;
pub mod notifier;
pub mod repository;
