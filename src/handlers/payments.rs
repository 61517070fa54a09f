use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::MaybeAuthUser;
use crate::services::payment_gateway::CheckoutSession;
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct InitializePaymentRequest {
    /// Order to start a gateway checkout session for
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InitializePaymentResponse {
    /// One-time token identifying the checkout session
    pub token: String,
    /// Gateway-hosted payment page to send the shopper to
    pub payment_page_url: String,
}

/// Start a gateway checkout session for an order
#[utoipa::path(
    post,
    path = "/api/v1/payments/initialize",
    summary = "Initialize payment",
    description = "Builds the gateway basket from the persisted order and returns the hosted payment page",
    request_body = InitializePaymentRequest,
    responses(
        (status = 200, description = "Checkout session created", body = ApiResponse<InitializePaymentResponse>),
        (status = 402, description = "Payment rejected by the provider", body = crate::errors::ErrorResponse),
        (status = 403, description = "Order belongs to another customer", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already paid or closed", body = crate::errors::ErrorResponse),
        (status = 502, description = "Payment provider unreachable", body = crate::errors::ErrorResponse),
    ),
    tag = "Payments"
)]
pub async fn initialize_payment(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    Json(request): Json<InitializePaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InitializePaymentResponse>>), ServiceError> {
    // Guest orders carry no owner; authenticated orders may only be paid by
    // their owner (or an admin).
    let order = state
        .services
        .orders
        .get_order(request.order_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Order {} not found", request.order_id))
        })?;
    if let Some(owner) = order.customer_id {
        let authorized = caller
            .as_ref()
            .map(|user| user.is_admin() || user.user_id == owner)
            .unwrap_or(false);
        if !authorized {
            return Err(ServiceError::Forbidden(
                "Order does not belong to the requesting customer".to_string(),
            ));
        }
    }

    let CheckoutSession {
        token,
        payment_page_url,
    } = state
        .services
        .payments
        .initialize_checkout(request.order_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(InitializePaymentResponse {
            token,
            payment_page_url,
        })),
    ))
}
