//! Core library for the Smoke Signal admin client.
//!
//! Owns the signed-in session (with durable persistence across restarts)
//! and the authorized request gateway every dashboard call goes through.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod navigation;

#[cfg(test)]
mod testing;

pub use api::{AdminClient, ApiError, Gateway};
pub use auth::{Credential, Identity, Role, SessionState, SessionStore};
pub use config::Config;
pub use navigation::{LoggingNavigator, Navigator};
