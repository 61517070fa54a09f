use axum::{
    extract::{Query, State},
    response::Redirect,
    Form,
};
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::services::reconciliation::ReconciliationOutcome;
use crate::{errors::ServiceError, AppState};

/// Pre-approved, browser-safe failure text. Raw gateway messages never reach
/// the shopper; support correlates through the error code instead.
const FAILURE_MESSAGE: &str = "Your payment could not be completed.";

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    /// One-time checkout token minted by the gateway. Status fields the
    /// gateway may also append are ignored; only the token is trusted, and
    /// only after server-to-server verification.
    pub token: Option<String>,
}

/// Payment callback (gateway redirect, GET variant)
#[utoipa::path(
    get,
    path = "/api/v1/payments/callback",
    summary = "Payment callback",
    description = "Verifies the checkout token with the gateway and redirects the shopper to the result page",
    params(("token" = Option<String>, Query, description = "Checkout session token")),
    responses(
        (status = 303, description = "Redirect to the confirmation or error page"),
    ),
    tag = "Payments"
)]
pub async fn payment_callback_get(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    handle_callback(state, params.token).await
}

/// Payment callback (gateway server-to-server notification, POST variant)
#[utoipa::path(
    post,
    path = "/api/v1/payments/callback",
    summary = "Payment callback (POST)",
    request_body = String,
    responses(
        (status = 303, description = "Redirect to the confirmation or error page"),
    ),
    tag = "Payments"
)]
pub async fn payment_callback_post(
    State(state): State<AppState>,
    Form(params): Form<CallbackParams>,
) -> Redirect {
    handle_callback(state, params.token).await
}

/// Both callback variants funnel here: the redirect target is decided solely
/// by the verified reconciliation outcome, and every path ends in a redirect
/// because a browser is on the other side.
async fn handle_callback(state: AppState, token: Option<String>) -> Redirect {
    let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
        warn!("Payment callback without a token");
        return failure_redirect(
            &state,
            "missing_token",
            "The payment session could not be identified.",
            None,
        );
    };

    match state.services.reconciliation.process(&token).await {
        Ok(ReconciliationOutcome::Completed {
            order_id,
            payment_id,
        }) => success_redirect(&state, order_id, Some(&payment_id)),
        Ok(ReconciliationOutcome::AlreadyProcessed {
            order_id,
            payment_id,
        }) => {
            // Duplicate delivery: same destination as the first one, so the
            // gateway and the shopper both see a settled outcome.
            success_redirect(&state, order_id, payment_id.as_deref())
        }
        Ok(ReconciliationOutcome::Failed {
            order_id,
            code,
            message,
        }) => {
            info!(?order_id, ?code, %message, "Payment failed at the gateway");
            failure_redirect(
                &state,
                code.as_deref().unwrap_or("payment_failed"),
                FAILURE_MESSAGE,
                order_id,
            )
        }
        Err(err) => {
            let code = match &err {
                ServiceError::NotFound(_) => "order_not_found",
                ServiceError::ValidationError(_) => "invalid_callback",
                ServiceError::GatewayError { .. } => "gateway_error",
                _ => "callback_failed",
            };
            warn!(error = %err, code, "Payment callback processing failed");
            failure_redirect(&state, code, FAILURE_MESSAGE, None)
        }
    }
}

fn success_redirect(state: &AppState, order_id: Uuid, payment_id: Option<&str>) -> Redirect {
    let mut url = page_url(&state.config.pages.payment_success_url);
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("orderId", &order_id.to_string());
        if let Some(payment_id) = payment_id {
            query.append_pair("paymentId", payment_id);
        }
    }
    Redirect::to(url.as_str())
}

fn failure_redirect(
    state: &AppState,
    error: &str,
    message: &str,
    order_id: Option<Uuid>,
) -> Redirect {
    let mut url = page_url(&state.config.pages.payment_failure_url);
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("error", error);
        query.append_pair("message", message);
        if let Some(order_id) = order_id {
            query.append_pair("orderId", &order_id.to_string());
        }
    }
    Redirect::to(url.as_str())
}

fn page_url(configured: &str) -> Url {
    // Config validation keeps these parseable; the expect documents that.
    Url::parse(configured).expect("redirect page URLs are validated at startup")
}
