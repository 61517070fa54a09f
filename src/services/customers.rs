use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::{
    config::AccountsConfig,
    errors::ServiceError,
    services::orders::{AddressInput, CustomerDirectory, CustomerProfile},
};

/// Client for the account service that owns customer profiles and address
/// books. Identities are minted and verified upstream; this service only
/// reads the snapshot data an order needs.
#[derive(Clone)]
pub struct HttpCustomerDirectory {
    client: reqwest::Client,
    config: AccountsConfig,
}

#[derive(Debug, Deserialize)]
struct ProfilePayload {
    name: String,
    email: String,
    phone: String,
}

#[derive(Debug, Deserialize)]
struct AddressPayload {
    full_name: String,
    street: String,
    city: String,
    postal_code: String,
    country: String,
}

impl HttpCustomerDirectory {
    pub fn new(config: AccountsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
    ) -> Result<Option<T>, ServiceError> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let mut request = self.client.get(&url);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, path, "Account service unreachable");
            ServiceError::InternalError("account service unreachable".to_string())
        })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            error!(status = %response.status(), path, "Account service returned an error");
            return Err(ServiceError::InternalError(
                "account service request failed".to_string(),
            ));
        }

        let payload = response.json::<T>().await.map_err(|e| {
            error!(error = %e, path, "Malformed account service response");
            ServiceError::InternalError("malformed account service response".to_string())
        })?;
        Ok(Some(payload))
    }
}

#[async_trait]
impl CustomerDirectory for HttpCustomerDirectory {
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn profile(&self, customer_id: Uuid) -> Result<Option<CustomerProfile>, ServiceError> {
        let payload: Option<ProfilePayload> =
            self.get_json(&format!("/customers/{}", customer_id)).await?;
        Ok(payload.map(|p| CustomerProfile {
            name: p.name,
            email: p.email,
            phone: p.phone,
        }))
    }

    #[instrument(skip(self), fields(customer_id = %customer_id, address_id = %address_id))]
    async fn saved_address(
        &self,
        customer_id: Uuid,
        address_id: Uuid,
    ) -> Result<Option<AddressInput>, ServiceError> {
        let payload: Option<AddressPayload> = self
            .get_json(&format!(
                "/customers/{}/addresses/{}",
                customer_id, address_id
            ))
            .await?;
        Ok(payload.map(|a| AddressInput {
            full_name: a.full_name,
            street: a.street,
            city: a.city,
            postal_code: a.postal_code,
            country: a.country,
        }))
    }
}
