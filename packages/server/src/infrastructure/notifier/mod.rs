//! Push 通知コラボレーターの実装
//!
//! - `log`: 通知内容をログに出すだけの実装（開発用）
//! - `webhook`: Push ゲートウェイの HTTP エンドポイントへ転送する実装

pub mod log;
pub mod webhook;

pub use log::LoggingPushNotifier;
pub use webhook::WebhookPushNotifier;
