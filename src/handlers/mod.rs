pub mod orders;
pub mod payment_callbacks;
pub mod payments;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    services::catalog::CatalogService,
    services::order_status::OrderStatusService,
    services::orders::{CustomerDirectory, OrderService},
    services::payment_gateway::{HttpPaymentGateway, PaymentGateway},
    services::payments::PaymentService,
    services::reconciliation::ReconciliationService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: CatalogService,
    pub orders: Arc<OrderService>,
    pub order_status: Arc<OrderStatusService>,
    pub payments: Arc<PaymentService>,
    pub reconciliation: Arc<ReconciliationService>,
}

impl AppServices {
    /// Wires the service graph against the provider's HTTP gateway.
    pub fn new(
        db: Arc<DbPool>,
        config: &AppConfig,
        event_sender: Arc<EventSender>,
        customers: Arc<dyn CustomerDirectory>,
    ) -> Result<Self, ServiceError> {
        let gateway: Arc<dyn PaymentGateway> =
            Arc::new(HttpPaymentGateway::new(config.gateway.clone())?);
        Ok(Self::with_gateway(db, config, event_sender, customers, gateway))
    }

    /// Same wiring with an injected gateway; tests substitute a fake here.
    pub fn with_gateway(
        db: Arc<DbPool>,
        config: &AppConfig,
        event_sender: Arc<EventSender>,
        customers: Arc<dyn CustomerDirectory>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let catalog = CatalogService::new(db.clone());
        let orders = Arc::new(OrderService::new(
            db.clone(),
            catalog.clone(),
            customers,
            event_sender.clone(),
            config.shipping.clone(),
        ));
        let order_status = Arc::new(OrderStatusService::new(
            db.clone(),
            event_sender.clone(),
            config.carrier_domains(),
        ));
        let payments = Arc::new(PaymentService::new(db.clone(), gateway.clone()));
        let reconciliation = Arc::new(ReconciliationService::new(db, gateway, event_sender));

        Self {
            catalog,
            orders,
            order_status,
            payments,
            reconciliation,
        }
    }
}
