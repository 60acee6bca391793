use std::env;

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::WebhookAuth;

/// Lifecycle transitions the notification service is told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Created,
    Confirmed,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationEvent {
    pub appointment_id: Uuid,
    pub kind: NotificationKind,
    pub recipient_id: String,
}

/// Delivery seam for appointment notifications.
///
/// Dispatch is fire-and-forget: implementations must not block the caller
/// and must swallow delivery failures. A failed notification never rolls
/// back the state change it reports, and deliveries are not retried.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, event: NotificationEvent);
}

/// Delivers notification events to a remote webhook endpoint, signed with
/// the shared secret so the notification service can verify origin.
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
    secret_id: String,
    secret_key: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: String, secret_id: String, secret_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            secret_id,
            secret_key,
        }
    }

    /// Build a notifier from environment variables. Returns None when no
    /// endpoint is configured, in which case the caller should fall back to
    /// the no-op dispatcher.
    pub fn from_env() -> Option<Self> {
        let endpoint = env::var("NOTIFY_WEBHOOK_ENDPOINT").ok()?;
        let secret_id = env::var("NOTIFY_SECRET_ID").unwrap_or_default();
        let secret_key = env::var("NOTIFY_SECRET_KEY").unwrap_or_default();
        Some(Self::new(endpoint, secret_id, secret_key))
    }
}

impl NotificationDispatcher for WebhookNotifier {
    fn dispatch(&self, event: NotificationEvent) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let secret_id = self.secret_id.clone();
        let secret_key = self.secret_key.clone();

        tokio::spawn(async move {
            let body = match serde_json::to_string(&event) {
                Ok(body) => body,
                Err(err) => {
                    warn!("Failed to serialize notification event: {}", err);
                    return;
                }
            };

            let timestamp = WebhookAuth::get_timestamp();
            let nonce = WebhookAuth::generate_nonce();
            let signature = WebhookAuth::generate_signature(
                &secret_id, &secret_key, "POST", &endpoint, timestamp, &nonce, &body,
            );

            let result = client
                .post(&endpoint)
                .header("Content-Type", "application/json")
                .header("X-Notify-Key", &secret_id)
                .header("X-Notify-Timestamp", timestamp.to_string())
                .header("X-Notify-Nonce", &nonce)
                .header("X-Notify-Signature", signature)
                .body(body)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    debug!(
                        "Delivered {:?} notification for appointment {} to {}",
                        event.kind, event.appointment_id, event.recipient_id
                    );
                }
                Ok(response) => {
                    warn!(
                        "Notification delivery for appointment {} returned status {}",
                        event.appointment_id,
                        response.status()
                    );
                }
                Err(err) => {
                    warn!(
                        "Failed to deliver notification for appointment {}: {}",
                        event.appointment_id, err
                    );
                }
            }
        });
    }
}

/// Dispatcher for deployments without a notification endpoint; events are
/// logged and dropped.
pub struct NoopNotifier;

impl NotificationDispatcher for NoopNotifier {
    fn dispatch(&self, event: NotificationEvent) {
        debug!(
            "Notification endpoint not configured, dropping {:?} event for appointment {}",
            event.kind, event.appointment_id
        );
    }
}
