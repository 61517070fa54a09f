use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{AuthUser, MaybeAuthUser};
use crate::services::order_status::{Actor, OrderStatus, TrackingInfo};
use crate::services::orders::{OrderListResponse, OrderResponse, UntrustedCartInput};
use crate::{errors::ServiceError, ApiResponse, AppState, ListQuery};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CancelOrderRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Create a new order from a client cart
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Create order",
    description = "Validates the cart server-side (catalog prices, stock) and persists the order with its items",
    request_body = UntrustedCartInput,
    responses(
        (status = 201, description = "Order created successfully", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Invalid cart, address, or contact details", body = crate::errors::ErrorResponse),
        (status = 422, description = "One or more items are out of stock", body = crate::errors::ErrorResponse),
        (status = 500, description = "Order could not be created", body = crate::errors::ErrorResponse),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    Json(input): Json<UntrustedCartInput>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ServiceError> {
    let caller_id = caller.map(|user| user.user_id);
    let order = state.services.orders.create_order(caller_id, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

/// Get an order with its items
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    summary = "Get order",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order retrieved successfully", body = ApiResponse<OrderResponse>),
        (status = 403, description = "Order belongs to another customer", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state
        .services
        .orders
        .get_order(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

    if !auth_user.is_admin() && order.customer_id != Some(auth_user.user_id) {
        return Err(ServiceError::Forbidden(
            "Order does not belong to the requesting customer".to_string(),
        ));
    }

    Ok(Json(ApiResponse::success(order)))
}

/// List orders with pagination (admin)
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    summary = "List orders",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Orders retrieved successfully", body = ApiResponse<OrderListResponse>),
        (status = 403, description = "Administrator access required", body = crate::errors::ErrorResponse),
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<OrderListResponse>>, ServiceError> {
    auth_user.require_admin()?;
    let result = state
        .services
        .orders
        .list_orders(query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Cancel an order (customer)
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/cancel",
    summary = "Cancel order",
    description = "Customers may only cancel their own pending or processing orders",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = CancelOrderRequest,
    responses(
        (status = 200, description = "Order cancelled", body = ApiResponse<OrderResponse>),
        (status = 403, description = "Not the order owner, or a non-cancel target status", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order is in a state that cannot be cancelled", body = crate::errors::ErrorResponse),
    ),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelOrderRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    // The only target a customer may request through this endpoint.
    if request.status != OrderStatus::Cancelled {
        return Err(ServiceError::Forbidden(
            "Customers may only cancel orders".to_string(),
        ));
    }

    let actor = if auth_user.is_admin() {
        Actor::Admin(auth_user.user_id)
    } else {
        Actor::Customer(auth_user.user_id)
    };

    state
        .services
        .order_status
        .update_status(id, OrderStatus::Cancelled, actor, None, request.reason)
        .await?;

    let order = state
        .services
        .orders
        .get_order(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;
    Ok(Json(ApiResponse::success(order)))
}

/// Update order status (admin)
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    summary = "Update order status",
    description = "Applies a forward transition; tracking details may be attached when moving to shipped",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Invalid status value or tracking URL", body = crate::errors::ErrorResponse),
        (status = 403, description = "Administrator access required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Transition not allowed from the current state", body = crate::errors::ErrorResponse),
    ),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    auth_user.require_admin()?;

    let tracking = request.tracking_number.map(|tracking_number| TrackingInfo {
        tracking_number,
        tracking_url: request.tracking_url,
    });

    state
        .services
        .order_status
        .update_status(
            id,
            request.status,
            Actor::Admin(auth_user.user_id),
            tracking,
            None,
        )
        .await?;

    let order = state
        .services
        .orders
        .get_order(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;
    Ok(Json(ApiResponse::success(order)))
}
