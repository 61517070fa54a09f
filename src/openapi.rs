use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{errors, handlers, services};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.3.0",
        description = "Order creation, trusted server-side pricing, and payment gateway reconciliation for the storefront."
    ),
    paths(
        handlers::orders::create_order,
        handlers::orders::get_order,
        handlers::orders::list_orders,
        handlers::orders::cancel_order,
        handlers::orders::update_order_status,
        handlers::payments::initialize_payment,
        handlers::payment_callbacks::payment_callback_get,
        handlers::payment_callbacks::payment_callback_post,
    ),
    components(schemas(
        errors::ErrorResponse,
        handlers::orders::UpdateOrderStatusRequest,
        handlers::orders::CancelOrderRequest,
        handlers::payments::InitializePaymentRequest,
        handlers::payments::InitializePaymentResponse,
        services::orders::UntrustedCartInput,
        services::orders::UntrustedCartLine,
        services::orders::AddressInput,
        services::orders::OrderResponse,
        services::orders::OrderItemResponse,
        services::orders::OrderListResponse,
        services::orders::PaymentMethod,
        services::order_status::OrderStatus,
        services::order_status::PaymentStatus,
        services::order_status::TrackingInfo,
    )),
    tags(
        (name = "Orders", description = "Order creation and lifecycle"),
        (name = "Payments", description = "Gateway checkout and reconciliation callbacks"),
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
