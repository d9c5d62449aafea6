//! Push ゲートウェイへ HTTP で転送する PushNotifier
//!
//! ゲートウェイ側がデバイストークンの解決と APNs/FCM への配送を担当します。

use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{NotifyError, PushNotification, PushNotifier, UserId};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    user_id: &'a str,
    title: &'a str,
    body: &'a str,
    data: &'a BTreeMap<String, String>,
}

pub struct WebhookPushNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookPushNotifier {
    pub fn new(endpoint: String) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl PushNotifier for WebhookPushNotifier {
    async fn notify(
        &self,
        user_id: &UserId,
        notification: PushNotification,
    ) -> Result<(), NotifyError> {
        let request = PushRequest {
            user_id: user_id.as_str(),
            title: &notification.title,
            body: &notification.body,
            data: &notification.data,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(format!(
                "{} responded with {}",
                self.endpoint, status
            )));
        }
        tracing::debug!(user_id = %user_id, "Push notification forwarded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use crate::test_support::user;

    type Received = Arc<Mutex<Vec<Value>>>;

    /// Start a gateway on an ephemeral port that records request bodies and answers with `status`
    async fn start_gateway(status: StatusCode) -> (String, Received) {
        let received: Received = Arc::default();
        let app = Router::new()
            .route(
                "/push",
                post(
                    move |State(received): State<Received>, Json(body): Json<Value>| async move {
                        received.lock().unwrap().push(body);
                        status
                    },
                ),
            )
            .with_state(received.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/push"), received)
    }

    fn notification() -> PushNotification {
        PushNotification {
            title: "alice".to_string(),
            body: "hello bob".to_string(),
            data: BTreeMap::from([
                ("type".to_string(), "new_message".to_string()),
                ("chat_id".to_string(), "1".to_string()),
            ]),
        }
    }

    #[tokio::test]
    async fn test_notification_is_posted_as_json() {
        // テスト項目: 通知は宛先ユーザー付きの JSON としてゲートウェイに POST される
        // given (前提条件):
        let (endpoint, received) = start_gateway(StatusCode::ACCEPTED).await;
        let notifier = WebhookPushNotifier::new(endpoint).unwrap();

        // when (操作):
        let result = notifier.notify(&user("bob"), notification()).await;

        // then (期待する結果):
        assert_eq!(result, Ok(()));
        let bodies = received.lock().unwrap().clone();
        assert_eq!(
            bodies,
            vec![json!({
                "user_id": "bob",
                "title": "alice",
                "body": "hello bob",
                "data": { "chat_id": "1", "type": "new_message" },
            })]
        );
    }

    #[tokio::test]
    async fn test_error_status_is_rejected() {
        // テスト項目: 2xx 以外の応答は Rejected になる
        // given (前提条件):
        let (endpoint, received) = start_gateway(StatusCode::INTERNAL_SERVER_ERROR).await;
        let notifier = WebhookPushNotifier::new(endpoint).unwrap();

        // when (操作):
        let result = notifier.notify(&user("bob"), notification()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(NotifyError::Rejected(_))));
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_transport_error() {
        // テスト項目: 接続できないゲートウェイは Transport になる
        // given (前提条件): 一度確保したポートを解放して、誰も待ち受けていない宛先にする
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let notifier = WebhookPushNotifier::new(format!("http://{addr}/push")).unwrap();

        // when (操作):
        let result = notifier.notify(&user("bob"), notification()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(NotifyError::Transport(_))));
    }
}
