//! Data models for the admin API.
//!
//! - `LoginRequest`, `LoginResponse`: the login exchange
//! - `HealthStatus`: server liveness
//! - `AdminResource`: dashboard collections and their paths

pub mod auth;
pub mod resource;

pub use auth::{HealthStatus, LoginRequest, LoginResponse};
pub use resource::AdminResource;
