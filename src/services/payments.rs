use std::sync::Arc;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        order::Entity as OrderEntity,
        order_item::{self, Entity as OrderItemEntity},
    },
    errors::ServiceError,
    services::order_status::{OrderStatus, PaymentStatus},
    services::orders::PaymentMethod,
    services::payment_gateway::{CheckoutSession, PaymentGateway},
};

/// Builds gateway checkout sessions for persisted orders. The basket sent to
/// the gateway is derived from order rows only; whatever the client posted
/// to reach this point plays no part in the amounts.
#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DbPool>,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentService {
    pub fn new(db: Arc<DbPool>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { db, gateway }
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn initialize_checkout(
        &self,
        order_id: Uuid,
    ) -> Result<CheckoutSession, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.payment_method != PaymentMethod::Card.to_string() {
            return Err(ServiceError::ValidationError(
                "Only card orders go through the payment gateway".to_string(),
            ));
        }
        if order.payment_status == PaymentStatus::Paid.to_string() {
            return Err(ServiceError::Conflict(
                "Order has already been paid".to_string(),
            ));
        }
        let status = OrderStatus::parse(&order.status)?;
        if status.is_terminal() {
            return Err(ServiceError::Conflict(format!(
                "Order is {} and cannot be paid",
                status
            )));
        }

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;

        let session = self.gateway.initialize(&order, &items).await?;
        info!(order_id = %order_id, "Checkout session created");
        Ok(session)
    }
}
