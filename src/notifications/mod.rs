use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::MailConfig;
use crate::entities::order;

/// Represents a customer-facing notification
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub order_id: Uuid,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
}

/// Types of notifications
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    OrderPlaced,
    PaymentConfirmed,
    PaymentFailed,
    StatusUpdate,
}

/// Notification service errors. These never convert into `ServiceError`:
/// dispatch is best-effort and call sites log-and-drop.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Mail provider error: {0}")]
    Provider(String),
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Trait for notification delivery
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError>;
}

impl Notification {
    fn build(order: &order::Model, kind: NotificationKind, subject: String, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id: order.id,
            recipient: order.customer_email.clone(),
            subject,
            body,
            kind,
            created_at: Utc::now(),
        }
    }

    pub fn order_placed(order: &order::Model) -> Self {
        Self::build(
            order,
            NotificationKind::OrderPlaced,
            format!("We received your order {}", order.order_number),
            format!(
                "Hi {}, your order {} for {} {} has been received.",
                order.customer_name, order.order_number, order.total_amount, order.currency
            ),
        )
    }

    pub fn payment_confirmed(order: &order::Model, payment_id: &str) -> Self {
        Self::build(
            order,
            NotificationKind::PaymentConfirmed,
            format!("Payment received for order {}", order.order_number),
            format!(
                "Hi {}, we confirmed your payment ({}) for order {}. We are preparing your items.",
                order.customer_name, payment_id, order.order_number
            ),
        )
    }

    pub fn payment_failed(order: &order::Model, error: &str) -> Self {
        Self::build(
            order,
            NotificationKind::PaymentFailed,
            format!("Payment problem with order {}", order.order_number),
            format!(
                "Hi {}, the payment for order {} did not go through ({}). No charge was made.",
                order.customer_name, order.order_number, error
            ),
        )
    }

    pub fn status_update(order: &order::Model, new_status: &str) -> Self {
        Self::build(
            order,
            NotificationKind::StatusUpdate,
            format!("Order {} update", order.order_number),
            format!(
                "Hi {}, your order {} is now {}.",
                order.customer_name, order.order_number, new_status
            ),
        )
    }
}

/// Mail-provider-backed notification service. Posts each notification to the
/// provider's HTTP API; when mail is disabled in config it only logs.
#[derive(Clone)]
pub struct HttpMailNotificationService {
    client: reqwest::Client,
    config: MailConfig,
}

impl HttpMailNotificationService {
    pub fn new(config: MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl NotificationService for HttpMailNotificationService {
    #[instrument(skip(self, notification), fields(order_id = %notification.order_id, kind = ?notification.kind))]
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        if !self.config.enabled {
            info!("Mail disabled; notification logged only");
            return Ok(());
        }

        let api_url = self
            .config
            .api_url
            .as_deref()
            .ok_or_else(|| NotificationError::Provider("mail.api_url is not configured".into()))?;

        let payload = json!({
            "from": self.config.from_address,
            "to": notification.recipient,
            "subject": notification.subject,
            "text": notification.body,
        });

        let mut request = self.client.post(api_url).json(&payload);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Provider(format!(
                "mail provider returned {}: {}",
                status, body
            )));
        }

        info!("Notification sent");
        Ok(())
    }
}

/// In-memory sink used by tests to assert on dispatched notifications.
#[derive(Default)]
pub struct InMemoryNotificationService {
    sent: Mutex<Vec<Notification>>,
}

impl InMemoryNotificationService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationService for InMemoryNotificationService {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        self.sent.lock().await.push(notification);
        Ok(())
    }
}
