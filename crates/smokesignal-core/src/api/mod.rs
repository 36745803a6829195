//! REST API access for the Smoke Signal admin backend.
//!
//! Requests flow through the [`Gateway`]: an ordered middleware pipeline
//! over a [`Transport`]. The standard pipeline attaches the session's bearer
//! credential and clears the session when the server answers 401.

pub mod client;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod request;
pub mod transport;

pub use client::AdminClient;
pub use error::ApiError;
pub use gateway::Gateway;
pub use middleware::{BearerAuth, Middleware, SessionTeardown};
pub use request::{ApiRequest, ApiResponse, AuthMode};
pub use transport::{ReqwestTransport, Transport};
