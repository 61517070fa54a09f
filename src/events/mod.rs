use std::sync::Arc;

use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::order::Entity as OrderEntity,
    notifications::{Notification, NotificationService},
};

/// Domain events emitted after state commits. Consumed by the dispatcher
/// task, never inside a request transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderPlaced(Uuid),
    OrderPaid {
        order_id: Uuid,
        payment_id: String,
    },
    OrderPaymentFailed {
        order_id: Uuid,
        error: String,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderCancelled(Uuid),
}

impl Event {
    pub fn order_id(&self) -> Uuid {
        match self {
            Event::OrderPlaced(id) | Event::OrderCancelled(id) => *id,
            Event::OrderPaid { order_id, .. }
            | Event::OrderPaymentFailed { order_id, .. }
            | Event::OrderStatusChanged { order_id, .. } => *order_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously. A full or closed channel is reported to
    /// the caller; call sites log and continue, they never fail the request.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Background dispatcher: drains the event channel and turns each event into
/// a best-effort customer notification. Every failure is logged with the
/// order id for manual reconciliation; nothing is retried inline and nothing
/// propagates back to the request that emitted the event.
pub async fn process_events(
    mut receiver: mpsc::Receiver<Event>,
    db: Arc<DbPool>,
    notifier: Arc<dyn NotificationService>,
) {
    info!("Event dispatcher started");
    while let Some(event) = receiver.recv().await {
        let order_id = event.order_id();

        let order = match OrderEntity::find_by_id(order_id).one(&*db).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                warn!(order_id = %order_id, "Event references missing order; notification skipped");
                continue;
            }
            Err(e) => {
                error!(order_id = %order_id, error = %e, "Failed to load order for notification");
                continue;
            }
        };

        let notification = match &event {
            Event::OrderPlaced(_) => Notification::order_placed(&order),
            Event::OrderPaid { payment_id, .. } => Notification::payment_confirmed(&order, payment_id),
            Event::OrderPaymentFailed { error, .. } => Notification::payment_failed(&order, error),
            Event::OrderStatusChanged { new_status, .. } => {
                Notification::status_update(&order, new_status)
            }
            Event::OrderCancelled(_) => Notification::status_update(&order, "cancelled"),
        };

        if let Err(e) = notifier.send(notification).await {
            error!(order_id = %order_id, error = %e, "Notification dispatch failed");
        }
    }
    info!("Event dispatcher stopped: channel closed");
}
