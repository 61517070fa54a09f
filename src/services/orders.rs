use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::RngCore;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::ShippingConfig,
    db::DbPool,
    entities::order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel},
    entities::order_item::{self, Entity as OrderItemEntity, Model as OrderItemModel},
    errors::ServiceError,
    events::{Event, EventSender},
    services::catalog::{CatalogService, PricedProduct},
    services::order_status::{OrderStatus, PaymentStatus},
};

/// Abuse guard: a single order may not carry more line items than this.
const MAX_CART_LINES: usize = 50;
/// A colliding order number is regenerated and the insert retried this often.
const MAX_ORDER_NUMBER_ATTEMPTS: usize = 3;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
}

impl PaymentMethod {
    /// Card payments confirm imminently, so the order starts optimistic;
    /// bank transfers settle manually and stay pending.
    pub fn initial_status(&self) -> OrderStatus {
        match self {
            PaymentMethod::Card => OrderStatus::Processing,
            PaymentMethod::BankTransfer => OrderStatus::Pending,
        }
    }
}

/// Inline shipping address as submitted at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddressInput {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl AddressInput {
    pub fn is_complete(&self) -> bool {
        ![
            &self.full_name,
            &self.street,
            &self.city,
            &self.postal_code,
            &self.country,
        ]
        .iter()
        .any(|f| f.trim().is_empty())
    }

    pub fn flatten(&self) -> String {
        format!(
            "{}, {}, {}, {} {}",
            self.full_name.trim(),
            self.street.trim(),
            self.city.trim(),
            self.country.trim(),
            self.postal_code.trim()
        )
    }
}

/// One cart line as submitted by the client. `unit_price` and `title` are
/// display hints only; pricing always comes from the catalog oracle.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UntrustedCartLine {
    pub product_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub title: Option<String>,
}

/// The raw, client-supplied checkout payload. Nothing in here is trusted;
/// the only way it becomes an order is through [`OrderService::create_order`],
/// which re-derives every figure from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UntrustedCartInput {
    pub lines: Vec<UntrustedCartLine>,
    /// Saved address reference (authenticated customers)
    #[serde(default)]
    pub saved_address_id: Option<Uuid>,
    /// Inline address (guest checkout, or authenticated override)
    #[serde(default)]
    pub address: Option<AddressInput>,
    /// Contact details; required for guest checkout
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub payment_method: String,
}

/// A cart line after server-side re-pricing.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub product: PricedProduct,
    pub quantity: i32,
    pub total_price: Decimal,
}

/// Cart lines that have passed the full validation pipeline: products
/// resolved, stock checked, prices recomputed from the oracle. Constructed
/// nowhere but in this module, so no code path can smuggle client-priced
/// lines into an order.
#[derive(Debug)]
pub struct ValidatedOrderLines {
    lines: Vec<PricedLine>,
    subtotal: Decimal,
}

impl ValidatedOrderLines {
    pub fn lines(&self) -> &[PricedLine] {
        &self.lines
    }

    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }
}

/// Resolved customer identity snapshot that will be frozen onto the order.
#[derive(Debug, Clone)]
pub struct CustomerSnapshot {
    pub customer_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub shipping_address: String,
}

/// Customer profile/address book, owned by the account service. This crate
/// only consumes it; tests and deployments provide the implementation.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn profile(&self, customer_id: Uuid) -> Result<Option<CustomerProfile>, ServiceError>;
    async fn saved_address(
        &self,
        customer_id: Uuid,
        address_id: Uuid,
    ) -> Result<Option<AddressInput>, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct CustomerProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub image: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub shipping_address: String,
    pub payment_id: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Builds durable, correctly priced orders out of untrusted carts.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    catalog: CatalogService,
    customers: Arc<dyn CustomerDirectory>,
    event_sender: Arc<EventSender>,
    shipping: ShippingConfig,
}

impl OrderService {
    pub fn new(
        db: Arc<DbPool>,
        catalog: CatalogService,
        customers: Arc<dyn CustomerDirectory>,
        event_sender: Arc<EventSender>,
        shipping: ShippingConfig,
    ) -> Self {
        Self {
            db,
            catalog,
            customers,
            event_sender,
            shipping,
        }
    }

    /// Validates a cart and persists the resulting order atomically.
    ///
    /// `caller` is the authenticated customer, if any; guests pass `None`
    /// and must supply full contact details plus an inline address.
    #[instrument(skip(self, input), fields(lines = input.lines.len(), caller = ?caller))]
    pub async fn create_order(
        &self,
        caller: Option<Uuid>,
        input: UntrustedCartInput,
    ) -> Result<OrderResponse, ServiceError> {
        // 1-3: structural validation, payment method, identity
        Self::check_cart_shape(&input)?;
        let payment_method = Self::parse_payment_method(&input.payment_method)?;
        let snapshot = self.resolve_customer(caller, &input).await?;

        // 4-6: resolve products, gate on stock, re-price server-side
        let validated = self.validate_lines(&input.lines).await?;

        // 7: totals
        let shipping_cost = self.shipping_cost(validated.subtotal());
        let total_amount = validated.subtotal() + shipping_cost;

        let (order, items) = self
            .persist(payment_method, &snapshot, &validated, shipping_cost, total_amount)
            .await?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total_amount,
            "Order created"
        );

        if let Err(e) = self.event_sender.send(Event::OrderPlaced(order.id)).await {
            warn!(order_id = %order.id, error = %e, "Failed to emit order placed event");
        }

        Ok(Self::to_response(order, items))
    }

    fn parse_payment_method(raw: &str) -> Result<PaymentMethod, ServiceError> {
        raw.parse().map_err(|_| {
            ServiceError::ValidationError(format!(
                "Unsupported payment method: {} (expected card or bank_transfer)",
                raw
            ))
        })
    }

    fn check_cart_shape(input: &UntrustedCartInput) -> Result<(), ServiceError> {
        if input.saved_address_id.is_none() && input.address.is_none() {
            return Err(ServiceError::ValidationError(
                "A shipping address is required".to_string(),
            ));
        }
        if input.lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "The cart must contain at least one item".to_string(),
            ));
        }
        if input.lines.len() > MAX_CART_LINES {
            return Err(ServiceError::ValidationError(format!(
                "The cart may contain at most {} items",
                MAX_CART_LINES
            )));
        }
        if let Some(line) = input.lines.iter().find(|l| l.quantity < 1) {
            return Err(ServiceError::ValidationError(format!(
                "Quantity for product {} must be at least 1",
                line.product_id
            )));
        }
        Ok(())
    }

    async fn resolve_customer(
        &self,
        caller: Option<Uuid>,
        input: &UntrustedCartInput,
    ) -> Result<CustomerSnapshot, ServiceError> {
        match caller {
            Some(customer_id) => {
                let address = match (input.saved_address_id, &input.address) {
                    (Some(address_id), _) => self
                        .customers
                        .saved_address(customer_id, address_id)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::ValidationError(format!(
                                "Saved address {} not found",
                                address_id
                            ))
                        })?,
                    (None, Some(inline)) if inline.is_complete() => inline.clone(),
                    _ => {
                        return Err(ServiceError::ValidationError(
                            "A complete shipping address is required".to_string(),
                        ))
                    }
                };

                let profile = self
                    .customers
                    .profile(customer_id)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::ValidationError("Customer profile not found".to_string())
                    })?;

                Ok(CustomerSnapshot {
                    customer_id: Some(customer_id),
                    name: input
                        .customer_name
                        .clone()
                        .filter(|n| !n.trim().is_empty())
                        .unwrap_or(profile.name),
                    email: profile.email,
                    phone: profile.phone,
                    shipping_address: address.flatten(),
                })
            }
            None => {
                let address = input
                    .address
                    .as_ref()
                    .filter(|a| a.is_complete())
                    .ok_or_else(|| {
                        ServiceError::ValidationError(
                            "Guest checkout requires a complete shipping address".to_string(),
                        )
                    })?;
                let name = Self::required_field(&input.customer_name, "name")?;
                let email = Self::required_field(&input.customer_email, "email")?;
                if !validator::validate_email(&email) {
                    return Err(ServiceError::ValidationError(format!(
                        "Invalid email address: {}",
                        email
                    )));
                }
                let phone = Self::required_field(&input.customer_phone, "phone")?;

                Ok(CustomerSnapshot {
                    customer_id: None,
                    name,
                    email,
                    phone,
                    shipping_address: address.flatten(),
                })
            }
        }
    }

    fn required_field(value: &Option<String>, field: &str) -> Result<String, ServiceError> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("Guest checkout requires {}", field))
            })
    }

    /// Steps 4-6 of the pipeline: the only producer of [`ValidatedOrderLines`].
    async fn validate_lines(
        &self,
        lines: &[UntrustedCartLine],
    ) -> Result<ValidatedOrderLines, ServiceError> {
        let ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
        let products: HashMap<Uuid, PricedProduct> = self
            .catalog
            .find_all(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        // Unknown product fails the whole order, naming the offender.
        for line in lines {
            if !products.contains_key(&line.product_id) {
                return Err(ServiceError::ValidationError(format!(
                    "Unknown product in cart: {}",
                    line.product_id
                )));
            }
        }

        // Stock gate: collect every unavailable title, not just the first.
        let unavailable: Vec<&str> = lines
            .iter()
            .filter_map(|line| {
                let product = &products[&line.product_id];
                (!product.in_stock).then_some(product.title.as_str())
            })
            .collect();
        if !unavailable.is_empty() {
            return Err(ServiceError::InsufficientStock(format!(
                "The following items are out of stock: {}",
                unavailable.join(", ")
            )));
        }

        // Re-price from the oracle; client numbers were display hints only.
        let mut priced = Vec::with_capacity(lines.len());
        let mut subtotal = Decimal::ZERO;
        for line in lines {
            let product = products[&line.product_id].clone();
            let total_price = product.unit_price * Decimal::from(line.quantity);
            subtotal += total_price;
            priced.push(PricedLine {
                product,
                quantity: line.quantity,
                total_price,
            });
        }

        Ok(ValidatedOrderLines {
            lines: priced,
            subtotal,
        })
    }

    /// Free above the threshold, flat fee below it.
    pub fn shipping_cost(&self, subtotal: Decimal) -> Decimal {
        if subtotal >= self.shipping.free_threshold {
            Decimal::ZERO
        } else {
            self.shipping.flat_fee
        }
    }

    async fn persist(
        &self,
        payment_method: PaymentMethod,
        snapshot: &CustomerSnapshot,
        validated: &ValidatedOrderLines,
        shipping_cost: Decimal,
        total_amount: Decimal,
    ) -> Result<(OrderModel, Vec<OrderItemModel>), ServiceError> {
        let db = &*self.db;

        for attempt in 1..=MAX_ORDER_NUMBER_ATTEMPTS {
            let order_id = Uuid::new_v4();
            let order_number = generate_order_number();
            let now = Utc::now();

            let txn = db.begin().await.map_err(|e| {
                error!(error = %e, "Failed to start order transaction");
                ServiceError::DatabaseError(e)
            })?;

            let order_active = OrderActiveModel {
                id: Set(order_id),
                order_number: Set(order_number.clone()),
                customer_id: Set(snapshot.customer_id),
                customer_name: Set(snapshot.name.clone()),
                customer_email: Set(snapshot.email.clone()),
                customer_phone: Set(snapshot.phone.clone()),
                status: Set(payment_method.initial_status().to_string()),
                payment_status: Set(PaymentStatus::Pending.to_string()),
                payment_method: Set(payment_method.to_string()),
                subtotal: Set(validated.subtotal()),
                shipping_cost: Set(shipping_cost),
                total_amount: Set(total_amount),
                currency: Set("TRY".to_string()),
                shipping_address: Set(snapshot.shipping_address.clone()),
                payment_id: Set(None),
                paid_amount: Set(None),
                payment_error: Set(None),
                tracking_number: Set(None),
                tracking_url: Set(None),
                created_at: Set(now),
                updated_at: Set(Some(now)),
                paid_at: Set(None),
            };

            let order = match order_active.insert(&txn).await {
                Ok(order) => order,
                Err(e) => {
                    if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
                        && attempt < MAX_ORDER_NUMBER_ATTEMPTS
                    {
                        warn!(
                            order_number = %order_number,
                            attempt,
                            "Order number collided; retrying with a fresh number"
                        );
                        continue;
                    }
                    error!(error = %e, customer = %snapshot.email, "Failed to insert order");
                    return Err(ServiceError::DatabaseError(e));
                }
            };

            let mut items = Vec::with_capacity(validated.lines().len());
            for line in validated.lines() {
                let item = order_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    order_id: Set(order_id),
                    product_id: Set(line.product.id),
                    title: Set(line.product.title.clone()),
                    subtitle: Set(line.product.subtitle.clone()),
                    image: Set(line.product.image.clone()),
                    quantity: Set(line.quantity),
                    unit_price: Set(line.product.unit_price),
                    total_price: Set(line.total_price),
                    created_at: Set(now),
                };
                let item = item.insert(&txn).await.map_err(|e| {
                    error!(error = %e, order_id = %order_id, "Failed to insert order item");
                    ServiceError::DatabaseError(e)
                })?;
                items.push(item);
            }

            txn.commit().await.map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to commit order transaction");
                ServiceError::DatabaseError(e)
            })?;

            return Ok((order, items));
        }

        Err(ServiceError::InternalError(
            "Could not allocate a unique order number".to_string(),
        ))
    }

    /// Fetches an order with its items.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderResponse>, ServiceError> {
        let order = OrderEntity::find_by_id(order_id).one(&*self.db).await?;
        match order {
            Some(order) => {
                let items = OrderItemEntity::find()
                    .filter(order_item::Column::OrderId.eq(order_id))
                    .all(&*self.db)
                    .await?;
                Ok(Some(Self::to_response(order, items)))
            }
            None => Ok(None),
        }
    }

    /// Admin listing with pagination, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let paginator = OrderEntity::find()
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(OrderListResponse {
            orders: orders
                .into_iter()
                .map(|o| Self::to_response(o, Vec::new()))
                .collect(),
            total,
            page,
            per_page,
        })
    }

    fn to_response(order: OrderModel, items: Vec<OrderItemModel>) -> OrderResponse {
        OrderResponse {
            id: order.id,
            order_number: order.order_number,
            customer_id: order.customer_id,
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            status: order.status,
            payment_status: order.payment_status,
            payment_method: order.payment_method,
            subtotal: order.subtotal,
            shipping_cost: order.shipping_cost,
            total_amount: order.total_amount,
            currency: order.currency,
            shipping_address: order.shipping_address,
            payment_id: order.payment_id,
            tracking_number: order.tracking_number,
            tracking_url: order.tracking_url,
            items: items
                .into_iter()
                .map(|item| OrderItemResponse {
                    id: item.id,
                    product_id: item.product_id,
                    title: item.title,
                    subtitle: item.subtitle,
                    image: item.image,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    total_price: item.total_price,
                })
                .collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
            paid_at: order.paid_at,
        }
    }
}

/// Order numbers combine a date component with random bytes so concurrent
/// instances can generate them without coordination. `SF-YYMMDD-XXXXXXXX`.
fn generate_order_number() -> String {
    let mut bytes = [0u8; 4];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    format!(
        "SF-{}-{}",
        Utc::now().format("%y%m%d"),
        hex::encode_upper(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn order_numbers_carry_date_and_entropy() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "SF");
        assert_eq!(parts[1].len(), 6);
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));

        // two draws colliding would mean broken entropy, not bad luck
        assert_ne!(generate_order_number(), generate_order_number());
    }

    #[test]
    fn initial_status_depends_on_payment_method() {
        assert_eq!(
            PaymentMethod::Card.initial_status(),
            OrderStatus::Processing
        );
        assert_eq!(
            PaymentMethod::BankTransfer.initial_status(),
            OrderStatus::Pending
        );
    }

    #[test]
    fn payment_method_parsing_is_strict() {
        assert_eq!(
            OrderService::parse_payment_method("card").unwrap(),
            PaymentMethod::Card
        );
        assert_eq!(
            OrderService::parse_payment_method("bank_transfer").unwrap(),
            PaymentMethod::BankTransfer
        );
        assert!(OrderService::parse_payment_method("paypal").is_err());
    }

    #[test]
    fn cart_shape_limits_are_enforced() {
        let line = UntrustedCartLine {
            product_id: Uuid::new_v4(),
            quantity: 1,
            unit_price: None,
            title: None,
        };
        let address = AddressInput {
            full_name: "Test".into(),
            street: "Street 1".into(),
            city: "Istanbul".into(),
            postal_code: "34000".into(),
            country: "TR".into(),
        };

        let empty = UntrustedCartInput {
            lines: vec![],
            saved_address_id: None,
            address: Some(address.clone()),
            customer_name: None,
            customer_email: None,
            customer_phone: None,
            payment_method: "card".into(),
        };
        assert!(OrderService::check_cart_shape(&empty).is_err());

        let oversized = UntrustedCartInput {
            lines: vec![line.clone(); MAX_CART_LINES + 1],
            ..empty.clone()
        };
        assert!(OrderService::check_cart_shape(&oversized).is_err());

        let no_address = UntrustedCartInput {
            lines: vec![line.clone()],
            address: None,
            ..empty.clone()
        };
        assert!(OrderService::check_cart_shape(&no_address).is_err());

        let zero_quantity = UntrustedCartInput {
            lines: vec![UntrustedCartLine {
                quantity: 0,
                ..line.clone()
            }],
            ..empty.clone()
        };
        assert!(OrderService::check_cart_shape(&zero_quantity).is_err());

        let ok = UntrustedCartInput {
            lines: vec![line],
            ..empty
        };
        assert!(OrderService::check_cart_shape(&ok).is_ok());
    }

    #[test]
    fn address_completeness_and_flattening() {
        let address = AddressInput {
            full_name: "Ayse Yilmaz".into(),
            street: "Moda Cad. 1".into(),
            city: "Istanbul".into(),
            postal_code: "34710".into(),
            country: "TR".into(),
        };
        assert!(address.is_complete());
        assert_eq!(
            address.flatten(),
            "Ayse Yilmaz, Moda Cad. 1, Istanbul, TR 34710"
        );

        let incomplete = AddressInput {
            city: "  ".into(),
            ..address
        };
        assert!(!incomplete.is_complete());
    }

    struct NoDirectory;

    #[async_trait]
    impl CustomerDirectory for NoDirectory {
        async fn profile(&self, _: Uuid) -> Result<Option<CustomerProfile>, ServiceError> {
            Ok(None)
        }

        async fn saved_address(
            &self,
            _: Uuid,
            _: Uuid,
        ) -> Result<Option<AddressInput>, ServiceError> {
            Ok(None)
        }
    }

    fn detached_service() -> OrderService {
        let db = Arc::new(sea_orm::DatabaseConnection::Disconnected);
        let (tx, _rx) = tokio::sync::mpsc::channel(8);
        OrderService::new(
            db.clone(),
            CatalogService::new(db),
            Arc::new(NoDirectory),
            Arc::new(EventSender::new(tx)),
            ShippingConfig {
                free_threshold: dec!(500.00),
                flat_fee: dec!(49.90),
            },
        )
    }

    #[test]
    fn shipping_is_free_at_the_threshold() {
        let service = detached_service();
        assert_eq!(service.shipping_cost(dec!(499.99)), dec!(49.90));
        assert_eq!(service.shipping_cost(dec!(500.00)), Decimal::ZERO);
        assert_eq!(service.shipping_cost(dec!(1250.50)), Decimal::ZERO);
    }
}
