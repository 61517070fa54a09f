use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tracing::{error, info, instrument, warn};
use url::Url;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    entities::order::{ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Order fulfillment status. `Cancelled`, `Delivered` and `PaymentFailed`
/// are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    PaymentFailed,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::PaymentFailed
        )
    }

    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        value.parse().map_err(|_| {
            ServiceError::ValidationError(format!("Unknown order status: {}", value))
        })
    }
}

/// Payment state tracked separately from fulfillment: a payment can fail
/// while the order record lives on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

/// Who is asking for a transition. The reconciliation engine never goes
/// through this service; it owns the conditional-update path instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Customer(Uuid),
    Admin(Uuid),
}

impl Actor {
    fn audit_name(&self) -> String {
        match self {
            Actor::Customer(id) => format!("customer:{}", id),
            Actor::Admin(id) => format!("admin:{}", id),
        }
    }
}

/// Tracking details an admin may attach when moving an order into `Shipped`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrackingInfo {
    pub tracking_number: String,
    pub tracking_url: Option<String>,
}

/// Allowed forward transitions. Requesting the current status is handled
/// before this table and is a no-op success.
fn is_transition_allowed(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (Pending, Processing)
            | (Pending, Cancelled)
            | (Processing, Shipped)
            | (Processing, Cancelled)
            | (Shipped, Delivered)
    )
}

#[derive(Clone)]
pub struct OrderStatusService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    carrier_domains: Vec<String>,
}

impl OrderStatusService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, carrier_domains: Vec<String>) -> Self {
        Self {
            db,
            event_sender,
            carrier_domains,
        }
    }

    /// Applies a customer- or admin-requested transition.
    ///
    /// Semantics:
    /// - requesting the current status is an idempotent no-op success;
    /// - customers may only cancel their own `pending`/`processing` orders;
    /// - admins may apply any transition in the forward table and attach
    ///   tracking when moving into `shipped`;
    /// - anything from a terminal state, and any jump not in the table, is a
    ///   `Conflict`;
    /// - `payment_failed` can only ever be set by reconciliation, so both
    ///   actors are refused here.
    #[instrument(skip(self, tracking, note), fields(order_id = %order_id, requested = %requested))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        requested: OrderStatus,
        actor: Actor,
        tracking: Option<TrackingInfo>,
        note: Option<String>,
    ) -> Result<OrderModel, ServiceError> {
        self.authorize_target(&actor, requested)?;

        let tracking = match (&tracking, requested) {
            (None, _) => None,
            (Some(t), OrderStatus::Shipped) => Some(self.validate_tracking(t)?),
            (Some(_), _) => {
                return Err(ServiceError::ValidationError(
                    "Tracking details can only be attached when moving an order to shipped"
                        .to_string(),
                ))
            }
        };

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to begin status transaction");
            ServiceError::DatabaseError(e)
        })?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if let Actor::Customer(customer_id) = actor {
            if order.customer_id != Some(customer_id) {
                warn!(order_id = %order_id, "Customer attempted to modify a foreign order");
                return Err(ServiceError::Forbidden(
                    "Order does not belong to the requesting customer".to_string(),
                ));
            }
        }

        let current = OrderStatus::parse(&order.status)?;

        // Re-delivery of the status an order already has is a success, not an
        // error; the payment callback path may hit this more than once.
        if current == requested {
            info!(order_id = %order_id, status = %current, "Status already applied; no-op");
            return Ok(order);
        }

        if current.is_terminal() {
            return Err(ServiceError::Conflict(format!(
                "Order is {} and accepts no further transitions",
                current
            )));
        }

        if !is_transition_allowed(current, requested) {
            return Err(ServiceError::Conflict(format!(
                "Cannot transition order from {} to {}",
                current, requested
            )));
        }

        let old_status = current.to_string();
        let mut active: OrderActiveModel = order.into();
        active.status = Set(requested.to_string());
        active.updated_at = Set(Some(Utc::now()));
        if let Some(tracking) = &tracking {
            active.tracking_number = Set(Some(tracking.tracking_number.clone()));
            active.tracking_url = Set(tracking.tracking_url.clone());
        }

        let updated = active.update(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update order status");
            ServiceError::DatabaseError(e)
        })?;

        let detail = tracking
            .as_ref()
            .map(|t| format!("tracking {}", t.tracking_number))
            .or(note);
        audit::record_transition(
            &txn,
            order_id,
            &actor.audit_name(),
            "status_update",
            &old_status,
            &updated.status,
            detail,
        )
        .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit status transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, old_status = %old_status, new_status = %requested, "Order status updated");

        let event = if requested == OrderStatus::Cancelled {
            Event::OrderCancelled(order_id)
        } else {
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status: requested.to_string(),
            }
        };
        if let Err(e) = self.event_sender.send(event).await {
            warn!(order_id = %order_id, error = %e, "Failed to emit status event");
        }

        Ok(updated)
    }

    fn authorize_target(&self, actor: &Actor, requested: OrderStatus) -> Result<(), ServiceError> {
        if requested == OrderStatus::PaymentFailed {
            return Err(ServiceError::Forbidden(
                "Payment state is managed by payment reconciliation".to_string(),
            ));
        }

        match actor {
            Actor::Admin(_) => Ok(()),
            Actor::Customer(_) if requested == OrderStatus::Cancelled => Ok(()),
            Actor::Customer(_) => Err(ServiceError::Forbidden(
                "Customers may only cancel orders".to_string(),
            )),
        }
    }

    /// Tracking URLs must be HTTPS and point at a known carrier.
    fn validate_tracking(&self, tracking: &TrackingInfo) -> Result<TrackingInfo, ServiceError> {
        if tracking.tracking_number.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Tracking number must not be empty".to_string(),
            ));
        }

        if let Some(raw_url) = &tracking.tracking_url {
            let url = Url::parse(raw_url).map_err(|_| {
                ServiceError::ValidationError(format!("Invalid tracking URL: {}", raw_url))
            })?;

            if url.scheme() != "https" {
                return Err(ServiceError::ValidationError(
                    "Tracking URL must use HTTPS".to_string(),
                ));
            }

            let host = url
                .host_str()
                .map(|h| h.to_ascii_lowercase())
                .unwrap_or_default();
            let allowed = self
                .carrier_domains
                .iter()
                .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)));
            if !allowed {
                return Err(ServiceError::ValidationError(format!(
                    "Tracking URL host {} is not an approved carrier",
                    host
                )));
            }
        }

        Ok(tracking.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(OrderStatus::Pending, OrderStatus::Processing, true)]
    #[case(OrderStatus::Pending, OrderStatus::Cancelled, true)]
    #[case(OrderStatus::Processing, OrderStatus::Shipped, true)]
    #[case(OrderStatus::Processing, OrderStatus::Cancelled, true)]
    #[case(OrderStatus::Shipped, OrderStatus::Delivered, true)]
    // shipped may not be skipped
    #[case(OrderStatus::Pending, OrderStatus::Shipped, false)]
    #[case(OrderStatus::Pending, OrderStatus::Delivered, false)]
    #[case(OrderStatus::Processing, OrderStatus::Delivered, false)]
    // no going back
    #[case(OrderStatus::Shipped, OrderStatus::Processing, false)]
    #[case(OrderStatus::Shipped, OrderStatus::Cancelled, false)]
    // terminal states accept nothing
    #[case(OrderStatus::Delivered, OrderStatus::Shipped, false)]
    #[case(OrderStatus::Cancelled, OrderStatus::Processing, false)]
    #[case(OrderStatus::PaymentFailed, OrderStatus::Processing, false)]
    fn transition_table(
        #[case] from: OrderStatus,
        #[case] to: OrderStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(is_transition_allowed(from, to), allowed);
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::PaymentFailed,
        ] {
            assert_eq!(OrderStatus::parse(&status.to_string()).unwrap(), status);
        }
        assert!(OrderStatus::parse("refunded").is_err());
    }

    fn service_with_carriers() -> OrderStatusService {
        let (tx, _rx) = tokio::sync::mpsc::channel(8);
        OrderStatusService::new(
            Arc::new(sea_orm::DatabaseConnection::Disconnected),
            Arc::new(EventSender::new(tx)),
            vec!["ups.com".to_string(), "yurticikargo.com".to_string()],
        )
    }

    #[test]
    fn tracking_url_requires_https_and_known_carrier() {
        let service = service_with_carriers();

        let ok = TrackingInfo {
            tracking_number: "1Z999".into(),
            tracking_url: Some("https://www.ups.com/track?tracknum=1Z999".into()),
        };
        assert!(service.validate_tracking(&ok).is_ok());

        let http = TrackingInfo {
            tracking_url: Some("http://www.ups.com/track".into()),
            ..ok.clone()
        };
        assert!(service.validate_tracking(&http).is_err());

        let unknown = TrackingInfo {
            tracking_url: Some("https://tracking.example.com/x".into()),
            ..ok.clone()
        };
        assert!(service.validate_tracking(&unknown).is_err());

        // suffix trickery does not pass the allow-list
        let spoofed = TrackingInfo {
            tracking_url: Some("https://ups.com.evil.example/track".into()),
            ..ok
        };
        assert!(service.validate_tracking(&spoofed).is_err());
    }

    #[test]
    fn customers_may_only_request_cancellation() {
        let service = service_with_carriers();
        let customer = Actor::Customer(Uuid::new_v4());

        assert!(service
            .authorize_target(&customer, OrderStatus::Cancelled)
            .is_ok());
        assert!(service
            .authorize_target(&customer, OrderStatus::Shipped)
            .is_err());
        assert!(service
            .authorize_target(&Actor::Admin(Uuid::new_v4()), OrderStatus::Shipped)
            .is_ok());
    }

    #[test]
    fn payment_failed_is_reserved_for_reconciliation() {
        let service = service_with_carriers();
        assert!(service
            .authorize_target(&Actor::Admin(Uuid::new_v4()), OrderStatus::PaymentFailed)
            .is_err());
        assert!(service
            .authorize_target(&Actor::Customer(Uuid::new_v4()), OrderStatus::PaymentFailed)
            .is_err());
    }
}
