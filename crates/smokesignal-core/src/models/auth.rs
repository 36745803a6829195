use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{Credential, Identity};

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful login exchange
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: Identity,
    pub token: Credential,
}

/// `GET /health` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}
