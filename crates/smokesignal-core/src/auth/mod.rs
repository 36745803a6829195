//! Authentication module for the admin session.
//!
//! This module provides:
//! - `Identity`, `Credential`: what the login exchange hands back
//! - `SessionStore`: the single owner of the current session
//! - `SessionStorage`: durable storage port with file, keychain and
//!   in-memory backends
//!
//! The session is persisted under the `auth-storage` key and restored by
//! `SessionStore::hydrate` on startup.

pub mod credentials;
pub mod identity;
pub mod session;
pub mod storage;

use std::sync::Arc;

use anyhow::{bail, Result};

pub use credentials::KeyringStorage;
pub use identity::{Credential, Identity, Role};
pub use session::{AuthenticatedSession, SessionState, SessionStore, STORAGE_KEY};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageBackend};

use crate::config::Config;

/// Build the storage backend selected in the configuration
pub fn storage_for(config: &Config) -> Result<Arc<dyn SessionStorage>> {
    Ok(match config.storage {
        StorageBackend::File => Arc::new(FileStorage::new(config.cache_dir()?)),
        StorageBackend::Keyring => {
            if !keychain_available() {
                bail!("No OS keychain is available on this platform; use file storage");
            }
            Arc::new(KeyringStorage::new())
        }
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
    })
}

/// Platforms with a keychain store compiled in
const fn keychain_available() -> bool {
    cfg!(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "windows",
        target_os = "linux",
        target_os = "freebsd",
        target_os = "openbsd",
    ))
}
