//! API client for the Smoke Signal admin backend.
//!
//! This module provides the `AdminClient` struct: the login exchange plus
//! authenticated access to the dashboard collections. Every call goes
//! through the [`Gateway`], so the credential is attached and 401s end the
//! session uniformly.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use super::{ApiError, ApiRequest, Gateway, ReqwestTransport};
use crate::auth::{Identity, Role, SessionStore};
use crate::config::Config;
use crate::models::{AdminResource, HealthStatus, LoginRequest, LoginResponse};

/// Shown when a rejected login carries no message of its own
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";

#[derive(Clone)]
pub struct AdminClient {
    gateway: Gateway,
    session: Arc<SessionStore>,
    health_url: String,
}

impl AdminClient {
    pub fn new(gateway: Gateway, session: Arc<SessionStore>, health_url: impl Into<String>) -> Self {
        Self {
            gateway,
            session,
            health_url: health_url.into(),
        }
    }

    /// Build the standard reqwest-backed client for a configuration
    pub fn from_config(config: &Config, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(&config.api_url, config.request_timeout())?;
        let gateway = Gateway::authorized(Arc::new(transport), session.clone());
        Ok(Self::new(gateway, session, config.health_url()))
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    // ===== Authentication =====

    /// Exchange email and password for a session.
    ///
    /// Any rejection becomes [`ApiError::LoginRejected`] with the server's
    /// message; an existing session is left untouched on failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, ApiError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::LoginRejected("Email and password required".to_string()));
        }

        let request = ApiRequest::post("/auth/login")
            .json(&LoginRequest { email, password })?
            .anonymous();

        let response = match self.gateway.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Login failed");
                return Err(Self::login_error(e));
            }
        };

        if let Some(role) = Self::unsupported_role(&response.body) {
            warn!(role = %role, "Login accepted for a role the dashboard does not know");
            return Err(ApiError::LoginRejected(format!(
                "Role '{}' cannot use the admin dashboard",
                role
            )));
        }

        let login: LoginResponse = response.json()?;
        if login.token.is_empty() {
            return Err(ApiError::InvalidResponse("Login response carried an empty token".to_string()));
        }

        info!(user_id = %login.user.id, "Login successful");
        self.session.set_session(login.user.clone(), login.token);
        Ok(login.user)
    }

    /// The user's role when the payload names one outside [`Role`]
    fn unsupported_role(body: &str) -> Option<String> {
        let payload: Value = serde_json::from_str(body).ok()?;
        let role = payload.pointer("/user/role")?.as_str()?;
        role.parse::<Role>().is_err().then(|| role.to_string())
    }

    fn login_error(err: ApiError) -> ApiError {
        match err {
            ApiError::NetworkError(_) => err,
            ApiError::RateLimited => ApiError::LoginRejected(LOGIN_FAILED_MESSAGE.to_string()),
            other => match other.server_message().filter(|m| !m.trim().is_empty()) {
                Some(message) => ApiError::LoginRejected(message.to_string()),
                None => ApiError::LoginRejected(LOGIN_FAILED_MESSAGE.to_string()),
            },
        }
    }

    /// End the session and redirect to login
    pub fn logout(&self) -> bool {
        info!("Logging out");
        self.session.clear_session()
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let response = self
            .gateway
            .execute(ApiRequest::get(self.health_url.clone()).anonymous())
            .await?;
        response.json()
    }

    // ===== Generic JSON helpers =====

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.gateway.execute(ApiRequest::get(path)).await?.json()
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.gateway.execute(ApiRequest::post(path).json(body)?).await?.json()
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.gateway.execute(ApiRequest::put(path).json(body)?).await?.json()
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.gateway.execute(ApiRequest::patch(path).json(body)?).await?.json()
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.gateway.execute(ApiRequest::delete(path)).await?;
        Ok(())
    }

    // ===== Dashboard resources =====

    pub async fn list(&self, resource: AdminResource) -> Result<Value, ApiError> {
        self.get(resource.list_path()).await
    }

    pub async fn recent_orders(&self, limit: usize) -> Result<Value, ApiError> {
        self.get(&format!("/orders?limit={}", limit)).await
    }

    pub async fn set_status(&self, resource: AdminResource, id: &str, status: &str) -> Result<Value, ApiError> {
        if !resource.has_status() {
            return Err(ApiError::InvalidRequest(format!("{} has no status field", resource)));
        }
        let path = format!("{}/status", resource.item_path(id));
        self.patch(&path, &serde_json::json!({ "status": status })).await
    }

    pub async fn remove(&self, resource: AdminResource, id: &str) -> Result<(), ApiError> {
        self.delete(&resource.item_path(id)).await
    }
}
