// Not every test binary exercises every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use storefront_api::{
    config::{
        AccountsConfig, AppConfig, GatewayConfig, MailConfig, PagesConfig, ShippingConfig,
    },
    db,
    entities::{audit_log, order, product},
    errors::ServiceError,
    events::{self, EventSender},
    handlers::AppServices,
    notifications::{InMemoryNotificationService, Notification},
    services::orders::{AddressInput, CustomerDirectory, CustomerProfile},
    services::payment_gateway::{CheckoutSession, GatewayResult, PaymentGateway},
    AppState,
};

/// Programmable stand-in for the payment provider. Tests stage the result a
/// token should verify to; the adapter contract stays identical to the HTTP
/// implementation.
#[derive(Default)]
pub struct FakeGateway {
    results: Mutex<HashMap<String, Result<GatewayResult, String>>>,
    pub retrieve_calls: AtomicUsize,
    last_basket: Mutex<Option<(Decimal, usize)>>,
}

impl FakeGateway {
    pub fn token_for(order_id: Uuid) -> String {
        format!("tok-{}", order_id)
    }

    pub fn stage_success(&self, token: &str, conversation_id: &str, payment_id: &str, amount: Decimal) {
        self.results.lock().unwrap().insert(
            token.to_string(),
            Ok(GatewayResult::Success {
                payment_id: payment_id.to_string(),
                paid_amount: amount,
                conversation_id: conversation_id.to_string(),
            }),
        );
    }

    pub fn stage_failure(&self, token: &str, code: &str, message: &str, conversation_id: Option<&str>) {
        self.results.lock().unwrap().insert(
            token.to_string(),
            Ok(GatewayResult::Failure {
                code: Some(code.to_string()),
                message: message.to_string(),
                conversation_id: conversation_id.map(str::to_string),
            }),
        );
    }

    pub fn stage_transport_error(&self, token: &str) {
        self.results
            .lock()
            .unwrap()
            .insert(token.to_string(), Err("gateway unreachable".to_string()));
    }

    /// Totals of the last basket built by `initialize`, for trust-boundary
    /// assertions.
    pub fn last_basket(&self) -> Option<(Decimal, usize)> {
        self.last_basket.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn initialize(
        &self,
        order: &order::Model,
        items: &[storefront_api::entities::order_item::Model],
    ) -> Result<CheckoutSession, ServiceError> {
        *self.last_basket.lock().unwrap() = Some((order.total_amount, items.len()));
        Ok(CheckoutSession {
            token: Self::token_for(order.id),
            payment_page_url: format!("https://gateway.test/pay/{}", order.id),
        })
    }

    async fn retrieve_result(&self, token: &str) -> Result<GatewayResult, ServiceError> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        match self.results.lock().unwrap().get(token) {
            Some(Ok(result)) => Ok(result.clone()),
            Some(Err(message)) => Err(ServiceError::gateway(None, message.clone())),
            None => Err(ServiceError::gateway(None, "unknown token")),
        }
    }
}

/// In-memory account service double.
#[derive(Default)]
pub struct FakeDirectory {
    profiles: Mutex<HashMap<Uuid, CustomerProfile>>,
    addresses: Mutex<HashMap<(Uuid, Uuid), AddressInput>>,
}

impl FakeDirectory {
    pub fn register_customer(&self, customer_id: Uuid, name: &str, email: &str, phone: &str) {
        self.profiles.lock().unwrap().insert(
            customer_id,
            CustomerProfile {
                name: name.to_string(),
                email: email.to_string(),
                phone: phone.to_string(),
            },
        );
    }

    pub fn register_address(&self, customer_id: Uuid, address_id: Uuid, city: &str) {
        self.addresses.lock().unwrap().insert(
            (customer_id, address_id),
            AddressInput {
                full_name: "Saved Recipient".to_string(),
                street: "Saved Street 5".to_string(),
                city: city.to_string(),
                postal_code: "34000".to_string(),
                country: "TR".to_string(),
            },
        );
    }
}

#[async_trait]
impl CustomerDirectory for FakeDirectory {
    async fn profile(&self, customer_id: Uuid) -> Result<Option<CustomerProfile>, ServiceError> {
        Ok(self.profiles.lock().unwrap().get(&customer_id).cloned())
    }

    async fn saved_address(
        &self,
        customer_id: Uuid,
        address_id: Uuid,
    ) -> Result<Option<AddressInput>, ServiceError> {
        Ok(self
            .addresses
            .lock()
            .unwrap()
            .get(&(customer_id, address_id))
            .cloned())
    }
}

/// Test application backed by a throwaway SQLite database, a fake gateway,
/// and an in-memory notification sink.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub gateway: Arc<FakeGateway>,
    pub directory: Arc<FakeDirectory>,
    pub notifications: Arc<InMemoryNotificationService>,
    _tmp: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

fn test_config(database_url: String) -> AppConfig {
    AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 18_080,
        environment: "test".into(),
        log_level: "info".into(),
        log_json: false,
        auto_migrate: false,
        cors_allowed_origins: None,
        db_max_connections: 2,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        db_acquire_timeout_secs: 5,
        event_channel_capacity: 64,
        gateway: GatewayConfig {
            base_url: "https://gateway.test".into(),
            api_key: "test-api-key".into(),
            secret_key: "test-secret-key-0123456789".into(),
            callback_url: "http://localhost:18080/api/v1/payments/callback".into(),
            timeout_secs: 2,
        },
        shipping: ShippingConfig::default(),
        mail: MailConfig::default(),
        accounts: AccountsConfig::default(),
        pages: PagesConfig {
            payment_success_url: "https://shop.test/order-confirmation".into(),
            payment_failure_url: "https://shop.test/payment-error".into(),
        },
        tracking_carrier_domains: "ups.com,yurticikargo.com".into(),
    }
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let tmp = TempDir::new().expect("temp dir for test database");
        let db_path = tmp.path().join("storefront_test.db");
        let cfg = test_config(format!("sqlite://{}?mode=rwc", db_path.display()));

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let notifications = InMemoryNotificationService::new();
        let event_task = tokio::spawn(events::process_events(
            event_rx,
            db_arc.clone(),
            notifications.clone(),
        ));

        let gateway = Arc::new(FakeGateway::default());
        let directory = Arc::new(FakeDirectory::default());

        let services = AppServices::with_gateway(
            db_arc.clone(),
            &cfg,
            Arc::new(event_sender.clone()),
            directory.clone(),
            gateway.clone(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", storefront_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            gateway,
            directory,
            notifications,
            _tmp: tmp,
            _event_task: event_task,
        }
    }

    /// Insert a catalog product and return its id.
    pub async fn seed_product(&self, title: &str, price: Decimal, in_stock: bool) -> Uuid {
        let id = Uuid::new_v4();
        let model = product::ActiveModel {
            id: Set(id),
            title: Set(title.to_string()),
            subtitle: Set(Some(format!("{} subtitle", title))),
            image: Set(Some(format!("https://cdn.shop.test/{}.jpg", id))),
            price: Set(price),
            in_stock: Set(in_stock),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        model
            .insert(&*self.state.db)
            .await
            .expect("failed to seed product");
        id
    }

    /// Send a request with optional JSON body and optional identity headers.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        identity: Option<(Uuid, &str)>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some((user_id, role)) = identity {
            builder = builder
                .header("x-user-id", user_id.to_string())
                .header("x-user-role", role);
        }

        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize request body"))
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("router response")
    }

    /// Reload an order row directly from the database.
    pub async fn load_order(&self, order_id: Uuid) -> order::Model {
        order::Entity::find_by_id(order_id)
            .one(&*self.state.db)
            .await
            .expect("query order")
            .expect("order exists")
    }

    /// All audit rows for an order, oldest first.
    pub async fn audit_entries(&self, order_id: Uuid) -> Vec<audit_log::Model> {
        use sea_orm::{ColumnTrait, QueryFilter, QueryOrder};
        audit_log::Entity::find()
            .filter(audit_log::Column::OrderId.eq(order_id))
            .order_by_asc(audit_log::Column::CreatedAt)
            .all(&*self.state.db)
            .await
            .expect("query audit log")
    }

    /// Wait until the detached dispatcher has delivered `count`
    /// notifications, or panic after a grace period.
    pub async fn wait_for_notifications(&self, count: usize) -> Vec<Notification> {
        for _ in 0..50 {
            let sent = self.notifications.sent().await;
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let sent = self.notifications.sent().await;
        panic!(
            "expected at least {} notifications, saw {}",
            count,
            sent.len()
        );
    }

    /// Let the dispatcher drain anything in flight, then return what was sent.
    pub async fn settled_notifications(&self) -> Vec<Notification> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.notifications.sent().await
    }
}

/// Decode a JSON response body.
pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// The `Location` header of a redirect response.
pub fn redirect_location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get("location")
        .expect("redirect location header")
        .to_str()
        .expect("utf-8 location")
        .to_string()
}

/// Parse a JSON money field (serialized as a decimal string) for numeric
/// comparison; string equality would be sensitive to trailing-zero scale.
pub fn money(value: &Value) -> Decimal {
    let raw = value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string());
    raw.parse().unwrap_or_else(|_| panic!("not a decimal: {}", raw))
}

/// A minimal guest checkout payload for the given product lines.
pub fn guest_cart(lines: Vec<Value>, payment_method: &str) -> Value {
    serde_json::json!({
        "lines": lines,
        "address": {
            "full_name": "Ayse Yilmaz",
            "street": "Moda Cad. 1",
            "city": "Istanbul",
            "postal_code": "34710",
            "country": "TR"
        },
        "customer_name": "Ayse Yilmaz",
        "customer_email": "ayse@example.com",
        "customer_phone": "+905551112233",
        "payment_method": payment_method
    })
}
