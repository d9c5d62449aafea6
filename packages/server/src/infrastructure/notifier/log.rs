//! ログ出力のみを行う PushNotifier

use async_trait::async_trait;

use crate::domain::{NotifyError, PushNotification, PushNotifier, UserId};

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPushNotifier;

#[async_trait]
impl PushNotifier for LoggingPushNotifier {
    async fn notify(
        &self,
        user_id: &UserId,
        notification: PushNotification,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            user_id = %user_id,
            title = %notification.title,
            data = ?notification.data,
            "Push notification (log only)"
        );
        Ok(())
    }
}
