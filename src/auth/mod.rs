//! Actor identity for order endpoints.
//!
//! Authentication itself lives upstream: the identity provider (or an API
//! gateway in front of it) verifies credentials and forwards the resolved
//! identity in trusted headers. This module only reads that identity and
//! answers authorization questions about it; it never mints or validates
//! tokens.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::HeaderMap, request::Parts},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

/// Identity forwarded by the upstream identity provider.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails unless the caller is an admin.
    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "Administrator access required".to_string(),
            ))
        }
    }
}

fn identity_from_headers(headers: &HeaderMap) -> Result<Option<AuthUser>, ServiceError> {
    let Some(user_id) = headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };

    let user_id = user_id
        .to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| ServiceError::Unauthorized("Malformed identity header".to_string()))?;

    let role = match headers
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase())
        .as_deref()
    {
        Some("admin") => Role::Admin,
        Some("customer") | None => Role::Customer,
        Some(other) => {
            return Err(ServiceError::Unauthorized(format!(
                "Unknown role: {}",
                other
            )))
        }
    };

    Ok(Some(AuthUser { user_id, role }))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from_headers(&parts.headers)?
            .ok_or_else(|| ServiceError::Unauthorized("Authentication required".to_string()))
    }
}

/// Optional identity for endpoints that also serve guests (order creation).
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(identity_from_headers(&parts.headers)?))
    }
}
