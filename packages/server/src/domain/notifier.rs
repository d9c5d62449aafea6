//! Push 通知コラボレーターのインターフェース
//!
//! ハブはオフラインのメンバーに対してのみ呼び出し、結果を待ちません（fire-and-forget）。

use async_trait::async_trait;

use super::{NotifyError, PushNotification, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn notify(
        &self,
        user_id: &UserId,
        notification: PushNotification,
    ) -> Result<(), NotifyError>;
}
