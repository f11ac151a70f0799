use std::ops::Deref;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::error::AppError;
use crate::models::{Principal, Role};
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Resolves the signed-in principal for a request.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_principal(&self, headers: &HeaderMap) -> Result<Principal, AppError>;
}

/// Trusts identity headers injected by an authenticating reverse proxy.
pub struct HeaderIdentityProvider;

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl IdentityProvider for HeaderIdentityProvider {
    async fn current_principal(&self, headers: &HeaderMap) -> Result<Principal, AppError> {
        let id = header_str(headers, USER_ID_HEADER).ok_or(AppError::Unauthorized)?;
        let email = header_str(headers, USER_EMAIL_HEADER).map(str::to_string);
        let role = header_str(headers, USER_ROLE_HEADER).and_then(Role::parse);

        Ok(Principal::new(id, email, role))
    }
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_address: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
    #[serde(default)]
    public_metadata: Option<serde_json::Value>,
}

fn metadata_role(meta: Option<&serde_json::Value>) -> Option<Role> {
    meta.and_then(|meta| meta.get("role"))
        .and_then(|role| role.as_str())
        .and_then(Role::parse)
}

impl UserInfo {
    /// Role precedence: top-level `role`, then `metadata.role` (session claims),
    /// then `public_metadata.role` (user object).
    fn into_principal(self) -> Principal {
        let role = self
            .role
            .as_deref()
            .and_then(Role::parse)
            .or_else(|| metadata_role(self.metadata.as_ref()))
            .or_else(|| metadata_role(self.public_metadata.as_ref()));

        Principal::new(self.sub, self.email.or(self.email_address), role)
    }
}

/// Forwards the caller's bearer token to an OIDC-style userinfo endpoint.
pub struct RemoteIdentityProvider {
    client: Client,
    userinfo_url: String,
}

impl RemoteIdentityProvider {
    pub fn new(userinfo_url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self::with_client(client, userinfo_url))
    }

    pub fn with_client(client: Client, userinfo_url: impl Into<String>) -> Self {
        Self {
            client,
            userinfo_url: userinfo_url.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn current_principal(&self, headers: &HeaderMap) -> Result<Principal, AppError> {
        let token = header_str(headers, AUTHORIZATION.as_str()).ok_or(AppError::Unauthorized)?;

        let response = self
            .client
            .get(&self.userinfo_url)
            .header("Authorization", token)
            .send()
            .await
            .map_err(|e| AppError::Identity(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(AppError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("userinfo endpoint returned {}: {}", status, body);
            return Err(AppError::Identity(format!("userinfo returned {}", status)));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| AppError::Identity(format!("Failed to parse userinfo: {}", e)))?;

        Ok(info.into_principal())
    }
}

/// Always answers with the same principal (or none). Used in tests and local runs.
pub struct StaticIdentityProvider(pub Option<Principal>);

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn current_principal(&self, _headers: &HeaderMap) -> Result<Principal, AppError> {
        self.0.clone().ok_or(AppError::Unauthorized)
    }
}

/// Extractor yielding the principal for the current request.
pub struct CurrentPrincipal(pub Principal);

impl Deref for CurrentPrincipal {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for CurrentPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = state.identity.current_principal(&parts.headers).await?;
        Ok(Self(principal))
    }
}
