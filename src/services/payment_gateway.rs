use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::RngCore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::{
    config::GatewayConfig,
    entities::{order::Model as OrderModel, order_item::Model as OrderItemModel},
    errors::ServiceError,
};

type HmacSha256 = Hmac<Sha256>;

/// A checkout session minted by the gateway: the shopper is sent to
/// `payment_page_url`, and `token` later retrieves the authoritative result.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub token: String,
    pub payment_page_url: String,
}

/// The gateway's reported outcome, normalized at this boundary. Raw gateway
/// JSON never crosses into reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayResult {
    Success {
        payment_id: String,
        paid_amount: Decimal,
        conversation_id: String,
    },
    Failure {
        code: Option<String>,
        message: String,
        conversation_id: Option<String>,
    },
}

/// Server-to-server interface to the payment provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Builds a hosted-checkout session for the order. The basket is derived
    /// strictly from persisted order rows, never from request payloads.
    async fn initialize(
        &self,
        order: &OrderModel,
        items: &[OrderItemModel],
    ) -> Result<CheckoutSession, ServiceError>;

    /// Fetches the authoritative outcome for a callback token.
    async fn retrieve_result(&self, token: &str) -> Result<GatewayResult, ServiceError>;
}

// ---- wire types -----------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeRequest {
    conversation_id: String,
    price: Decimal,
    paid_price: Decimal,
    currency: String,
    callback_url: String,
    buyer: BuyerPayload,
    basket_items: Vec<BasketItemPayload>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuyerPayload {
    name: String,
    email: String,
    phone: String,
    shipping_address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BasketItemPayload {
    id: String,
    name: String,
    price: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeResponse {
    status: String,
    token: Option<String>,
    payment_page_url: Option<String>,
    error_code: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveResponse {
    status: String,
    payment_status: Option<String>,
    payment_id: Option<String>,
    paid_price: Option<Decimal>,
    conversation_id: Option<String>,
    error_code: Option<String>,
    error_message: Option<String>,
}

/// HTTP implementation speaking the provider's REST dialect with HMAC-signed
/// requests and a bounded timeout.
#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HttpPaymentGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("gateway client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Provider request auth: `SFW2 base64(apiKey:..&randomKey:..&signature:..)`
    /// where signature = hex(HMAC-SHA256(secret, randomKey + path + body)).
    fn authorization_header(&self, path: &str, body: &str) -> String {
        let mut nonce = [0u8; 8];
        rand::rngs::OsRng.fill_bytes(&mut nonce);
        let random_key = hex::encode(nonce);

        let mut mac = HmacSha256::new_from_slice(self.config.secret_key.as_bytes())
            .expect("HMAC accepts keys of any size");
        mac.update(random_key.as_bytes());
        mac.update(path.as_bytes());
        mac.update(body.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        let raw = format!(
            "apiKey:{}&randomKey:{}&signature:{}",
            self.config.api_key, random_key, signature
        );
        format!("SFW2 {}", base64::engine::general_purpose::STANDARD.encode(raw))
    }

    async fn post_signed<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: String,
    ) -> Result<T, ServiceError> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.authorization_header(path, &body))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                // Timeouts and transport failures must fail soft: the caller
                // leaves order state untouched.
                error!(error = %e, path, "Gateway request failed");
                ServiceError::gateway(None, format!("gateway unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, path, "Gateway returned non-success HTTP status");
            return Err(ServiceError::gateway(
                Some(status.as_u16().to_string()),
                "gateway rejected the request",
            ));
        }

        response.json::<T>().await.map_err(|e| {
            error!(error = %e, path, "Gateway response could not be parsed");
            ServiceError::gateway(None, format!("malformed gateway response: {}", e))
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[instrument(skip(self, order, items), fields(order_id = %order.id))]
    async fn initialize(
        &self,
        order: &OrderModel,
        items: &[OrderItemModel],
    ) -> Result<CheckoutSession, ServiceError> {
        let request = InitializeRequest {
            // The conversation id is the order id; callbacks correlate on it.
            conversation_id: order.id.to_string(),
            price: order.subtotal,
            paid_price: order.total_amount,
            currency: order.currency.clone(),
            callback_url: self.config.callback_url.clone(),
            buyer: BuyerPayload {
                name: order.customer_name.clone(),
                email: order.customer_email.clone(),
                phone: order.customer_phone.clone(),
                shipping_address: order.shipping_address.clone(),
            },
            basket_items: items
                .iter()
                .map(|item| BasketItemPayload {
                    id: item.product_id.to_string(),
                    name: item.title.clone(),
                    price: item.total_price,
                })
                .collect(),
        };

        let body = serde_json::to_string(&request)
            .map_err(|e| ServiceError::InternalError(format!("serialize gateway request: {}", e)))?;
        let response: InitializeResponse =
            self.post_signed("/checkoutform/initialize", body).await?;

        match (response.status.as_str(), response.token, response.payment_page_url) {
            ("success", Some(token), Some(payment_page_url)) => Ok(CheckoutSession {
                token,
                payment_page_url,
            }),
            _ => Err(ServiceError::gateway(
                response.error_code,
                response
                    .error_message
                    .unwrap_or_else(|| "checkout initialization failed".to_string()),
            )),
        }
    }

    #[instrument(skip(self, token))]
    async fn retrieve_result(&self, token: &str) -> Result<GatewayResult, ServiceError> {
        let body = serde_json::json!({ "token": token }).to_string();
        let response: RetrieveResponse = self.post_signed("/checkoutform/retrieve", body).await?;
        parse_retrieve_response(response)
    }
}

/// Normalizes the verification payload into the closed [`GatewayResult`]
/// variant set. Anything that does not positively read as a completed
/// payment is a failure.
fn parse_retrieve_response(response: RetrieveResponse) -> Result<GatewayResult, ServiceError> {
    let succeeded = response.status == "success"
        && response
            .payment_status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("SUCCESS"))
            .unwrap_or(false);

    if succeeded {
        let payment_id = response.payment_id.filter(|id| !id.is_empty()).ok_or_else(|| {
            ServiceError::gateway(None, "gateway reported success without a payment id")
        })?;
        let paid_amount = response.paid_price.ok_or_else(|| {
            ServiceError::gateway(None, "gateway reported success without a paid amount")
        })?;
        let conversation_id = response.conversation_id.filter(|c| !c.is_empty()).ok_or_else(|| {
            ServiceError::gateway(None, "gateway reported success without a conversation id")
        })?;

        return Ok(GatewayResult::Success {
            payment_id,
            paid_amount,
            conversation_id,
        });
    }

    Ok(GatewayResult::Failure {
        code: response.error_code,
        message: response
            .error_message
            .unwrap_or_else(|| "payment was not completed".to_string()),
        conversation_id: response.conversation_id,
    })
}

/// Parses a conversation id back into an order id. Malformed ids are
/// rejected outright, never guessed at.
pub fn order_id_from_conversation(conversation_id: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(conversation_id).map_err(|_| {
        ServiceError::ValidationError(format!(
            "Malformed conversation id: {}",
            conversation_id
        ))
    })
}
