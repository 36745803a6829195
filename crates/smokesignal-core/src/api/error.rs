use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error ({0}): {1}")]
    ServerError(StatusCode, String),

    #[error("Unexpected status {0}: {1}")]
    UnexpectedStatus(StatusCode, String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The login exchange was refused; the message is meant for the login form
    #[error("{0}")]
    LoginRejected(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error payload the backend sends with non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<String>,
    message: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Human-readable message from a `{"error": "..."}` payload, if present
    pub fn payload_message(body: &str) -> Option<String> {
        let payload: ErrorPayload = serde_json::from_str(body).ok()?;
        payload
            .error
            .or(payload.message)
            .filter(|m| !m.trim().is_empty())
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = Self::payload_message(body).unwrap_or_else(|| Self::truncate_body(body));
        match status.as_u16() {
            401 => ApiError::Unauthorized(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(status, message),
            _ => ApiError::UnexpectedStatus(status, message),
        }
    }

    /// HTTP status behind this error, when the server answered
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            ApiError::AccessDenied(_) => Some(StatusCode::FORBIDDEN),
            ApiError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            ApiError::RateLimited => Some(StatusCode::TOO_MANY_REQUESTS),
            ApiError::ServerError(status, _) | ApiError::UnexpectedStatus(status, _) => Some(*status),
            ApiError::NetworkError(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Server-provided message carried by a status error
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized(m)
            | ApiError::AccessDenied(m)
            | ApiError::NotFound(m)
            | ApiError::ServerError(_, m)
            | ApiError::UnexpectedStatus(_, m) => Some(m.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_uses_payload_error_field() {
        let err = ApiError::from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"error":"Access token invalid or expired"}"#,
        );
        assert!(err.is_unauthorized());
        assert_eq!(err.server_message(), Some("Access token invalid or expired"));
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, r#"{"error":"Insufficient permissions"}"#),
            ApiError::AccessDenied(m) if m == "Insufficient permissions"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, "missing"),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "oops"),
            ApiError::ServerError(StatusCode::BAD_GATEWAY, _)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, "{}"),
            ApiError::UnexpectedStatus(StatusCode::BAD_REQUEST, _)
        ));
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "é".repeat(400);
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        let message = err.server_message().expect("message").to_string();
        assert!(message.contains("truncated, 800 total bytes"));
    }
}
