//! Request/response middleware applied by the [`Gateway`](super::Gateway).
//!
//! Hooks are synchronous: they run between the suspension points of a call
//! (before the request is sent, after the response arrives) and never await.

use std::sync::Arc;

use reqwest::header::{self, HeaderValue};
use tracing::{debug, warn};

use super::{ApiError, ApiRequest, ApiResponse, AuthMode};
use crate::auth::SessionStore;

pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;

    /// Adjust an outgoing request. An error aborts the call before sending.
    fn on_request(&self, _request: &mut ApiRequest) -> Result<(), ApiError> {
        Ok(())
    }

    /// Observe or transform the outcome before it reaches the caller.
    fn on_response(
        &self,
        _request: &ApiRequest,
        result: Result<ApiResponse, ApiError>,
    ) -> Result<ApiResponse, ApiError> {
        result
    }
}

/// Attaches the current credential as a bearer `Authorization` header.
pub struct BearerAuth {
    session: Arc<SessionStore>,
}

impl BearerAuth {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }
}

impl Middleware for BearerAuth {
    fn name(&self) -> &'static str {
        "bearer-auth"
    }

    fn on_request(&self, request: &mut ApiRequest) -> Result<(), ApiError> {
        if request.auth == AuthMode::Anonymous {
            return Ok(());
        }
        let Some(token) = self.session.credential() else {
            debug!(path = %request.path, "No credential, sending unauthenticated");
            return Ok(());
        };

        let mut value = HeaderValue::from_str(&token.bearer())
            .map_err(|_| ApiError::InvalidRequest("Credential is not a valid header value".to_string()))?;
        value.set_sensitive(true);
        request.headers.insert(header::AUTHORIZATION, value);
        Ok(())
    }
}

/// Clears the session when the server rejects the credential.
///
/// Every 401 on a session request collapses to a full teardown; expired,
/// invalid and missing credentials are not told apart. The error itself is
/// still returned to the caller.
pub struct SessionTeardown {
    session: Arc<SessionStore>,
}

impl SessionTeardown {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }
}

impl Middleware for SessionTeardown {
    fn name(&self) -> &'static str {
        "session-teardown"
    }

    fn on_response(
        &self,
        request: &ApiRequest,
        result: Result<ApiResponse, ApiError>,
    ) -> Result<ApiResponse, ApiError> {
        if let Err(ref err) = result {
            if err.is_unauthorized() && request.auth == AuthMode::Session {
                warn!(method = %request.method, path = %request.path, "Credential rejected, clearing session");
                self.session.clear_session();
            }
        }
        result
    }
}
