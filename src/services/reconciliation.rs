use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    entities::order::{self, Entity as OrderEntity, Model as OrderModel},
    errors::ServiceError,
    events::{Event, EventSender},
    services::order_status::{OrderStatus, PaymentStatus},
    services::payment_gateway::{order_id_from_conversation, GatewayResult, PaymentGateway},
};

/// What a callback delivery amounted to. The HTTP layer maps this onto the
/// success/failure redirect pages.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconciliationOutcome {
    /// This delivery performed the one real transition for the payment.
    Completed { order_id: Uuid, payment_id: String },
    /// The payment had already been applied; this delivery was a no-op and
    /// the gateway should still be answered with success so it stops retrying.
    AlreadyProcessed {
        order_id: Uuid,
        payment_id: Option<String>,
    },
    /// The gateway reported the payment as failed.
    Failed {
        order_id: Option<Uuid>,
        code: Option<String>,
        message: String,
    },
}

/// Matches the gateway's reported outcome to order state exactly once.
///
/// The engine never trusts redirect query parameters: every delivery is
/// verified server-to-server through the gateway adapter, and the state
/// write is a single conditional update so two concurrent deliveries for
/// the same order cannot both apply.
#[derive(Clone)]
pub struct ReconciliationService {
    db: Arc<DbPool>,
    gateway: Arc<dyn PaymentGateway>,
    event_sender: Arc<EventSender>,
}

impl ReconciliationService {
    pub fn new(
        db: Arc<DbPool>,
        gateway: Arc<dyn PaymentGateway>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            gateway,
            event_sender,
        }
    }

    /// Processes one callback token end to end.
    #[instrument(skip(self, token))]
    pub async fn process(&self, token: &str) -> Result<ReconciliationOutcome, ServiceError> {
        // The verification call is the authority; a timeout or transport
        // error propagates without touching order state.
        let result = self.gateway.retrieve_result(token).await?;

        match result {
            GatewayResult::Success {
                payment_id,
                paid_amount,
                conversation_id,
            } => {
                let order_id = order_id_from_conversation(&conversation_id)?;
                self.apply_success(order_id, payment_id, paid_amount).await
            }
            GatewayResult::Failure {
                code,
                message,
                conversation_id,
            } => {
                let order_id = match conversation_id.as_deref() {
                    Some(raw) => order_id_from_conversation(raw).ok(),
                    None => None,
                };
                if let Some(order_id) = order_id {
                    self.apply_failure(order_id, code.clone(), &message).await?;
                } else {
                    warn!(?code, %message, "Gateway failure without a usable conversation id");
                }
                Ok(ReconciliationOutcome::Failed {
                    order_id,
                    code,
                    message,
                })
            }
        }
    }

    async fn apply_success(
        &self,
        order_id: Uuid,
        payment_id: String,
        paid_amount: rust_decimal::Decimal,
    ) -> Result<ReconciliationOutcome, ServiceError> {
        let order = self.load_order(order_id).await?;

        // Fast idempotency path, plus the anomaly check the conditional
        // update below cannot express: success reported for an order that
        // was already paid through a different payment.
        if order.payment_status == PaymentStatus::Paid.to_string() {
            if order.payment_id.as_deref() != Some(payment_id.as_str()) {
                warn!(
                    order_id = %order_id,
                    existing_payment = ?order.payment_id,
                    reported_payment = %payment_id,
                    "Possible double payment: success callback for an order paid under a different payment id"
                );
            } else {
                info!(order_id = %order_id, payment_id = %payment_id, "Duplicate success callback; already processed");
            }
            return Ok(ReconciliationOutcome::AlreadyProcessed {
                order_id,
                payment_id: order.payment_id,
            });
        }

        let now = Utc::now();
        let txn = self.db.begin().await?;

        // The guard and the write are one statement: only an order that is
        // not yet paid takes the transition, no matter how many deliveries
        // race past the check above.
        let update = OrderEntity::update_many()
            .col_expr(order::Column::Status, Expr::value(OrderStatus::Processing.to_string()))
            .col_expr(
                order::Column::PaymentStatus,
                Expr::value(PaymentStatus::Paid.to_string()),
            )
            .col_expr(order::Column::PaymentId, Expr::value(payment_id.clone()))
            .col_expr(order::Column::PaidAmount, Expr::value(paid_amount))
            .col_expr(order::Column::PaymentError, Expr::value(Option::<String>::None))
            .col_expr(order::Column::PaidAt, Expr::value(now))
            .col_expr(order::Column::UpdatedAt, Expr::value(now))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::PaymentStatus.ne(PaymentStatus::Paid.to_string()))
            .exec(&txn)
            .await?;

        if update.rows_affected == 0 {
            // Lost the race to a concurrent delivery; treat as duplicate.
            info!(order_id = %order_id, "Concurrent callback already applied the payment");
            let paid = self.load_order(order_id).await?;
            return Ok(ReconciliationOutcome::AlreadyProcessed {
                order_id,
                payment_id: paid.payment_id,
            });
        }

        audit::record_transition(
            &txn,
            order_id,
            "reconciliation",
            "payment_confirmed",
            &order.status,
            &OrderStatus::Processing.to_string(),
            Some(format!("payment {}", payment_id)),
        )
        .await?;

        txn.commit().await?;

        info!(order_id = %order_id, payment_id = %payment_id, "Payment reconciled");

        // Notification dispatch is detached: a slow or failing mail provider
        // can never fail this callback.
        if let Err(e) = self
            .event_sender
            .send(Event::OrderPaid {
                order_id,
                payment_id: payment_id.clone(),
            })
            .await
        {
            warn!(order_id = %order_id, error = %e, "Failed to emit order paid event");
        }

        Ok(ReconciliationOutcome::Completed {
            order_id,
            payment_id,
        })
    }

    async fn apply_failure(
        &self,
        order_id: Uuid,
        code: Option<String>,
        message: &str,
    ) -> Result<(), ServiceError> {
        let order = self.load_order(order_id).await?;

        // A failure never overwrites a paid order.
        if order.payment_status == PaymentStatus::Paid.to_string() {
            warn!(
                order_id = %order_id,
                "Failure callback for an already-paid order ignored"
            );
            return Ok(());
        }

        let payment_error = match &code {
            Some(code) => format!("{}: {}", code, message),
            None => message.to_string(),
        };

        let now = Utc::now();
        let txn = self.db.begin().await?;

        let update = OrderEntity::update_many()
            .col_expr(
                order::Column::Status,
                Expr::value(OrderStatus::PaymentFailed.to_string()),
            )
            .col_expr(
                order::Column::PaymentStatus,
                Expr::value(PaymentStatus::Failed.to_string()),
            )
            .col_expr(order::Column::PaymentError, Expr::value(payment_error.clone()))
            .col_expr(order::Column::UpdatedAt, Expr::value(now))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::PaymentStatus.ne(PaymentStatus::Paid.to_string()))
            .exec(&txn)
            .await?;

        if update.rows_affected == 0 {
            info!(order_id = %order_id, "Failure callback raced a successful payment; leaving order paid");
            return Ok(());
        }

        audit::record_transition(
            &txn,
            order_id,
            "reconciliation",
            "payment_failed",
            &order.status,
            &OrderStatus::PaymentFailed.to_string(),
            Some(payment_error.clone()),
        )
        .await?;

        txn.commit().await?;

        info!(order_id = %order_id, "Order marked payment_failed");

        if let Err(e) = self
            .event_sender
            .send(Event::OrderPaymentFailed {
                order_id,
                error: payment_error,
            })
            .await
        {
            warn!(order_id = %order_id, error = %e, "Failed to emit payment failed event");
        }

        Ok(())
    }

    async fn load_order(&self, order_id: Uuid) -> Result<OrderModel, ServiceError> {
        OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to load order for reconciliation");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                // No retries against ids the gateway made up.
                warn!(order_id = %order_id, "Callback references an unknown order");
                ServiceError::NotFound(format!("Order {} not found", order_id))
            })
    }
}
