use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::identity::{Credential, Identity};
use super::storage::SessionStorage;
use crate::navigation::Navigator;

/// Namespace key of the persisted session envelope
pub const STORAGE_KEY: &str = "auth-storage";

/// Envelope format version. Envelopes with any other version are discarded.
const ENVELOPE_VERSION: u32 = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedSession {
    pub user: Identity,
    pub token: Credential,
    pub established_at: DateTime<Utc>,
}

impl AuthenticatedSession {
    pub fn age(&self) -> Duration {
        Utc::now() - self.established_at
    }

    /// Short human-readable age for status output
    pub fn age_display(&self) -> String {
        let minutes = self.age().num_minutes();
        if minutes < 1 {
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

/// Either nobody is signed in, or exactly one identity with its credential is.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated(AuthenticatedSession),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn credential(&self) -> Option<&Credential> {
        match self {
            SessionState::Authenticated(session) => Some(&session.token),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(session) => Some(&session.user),
            SessionState::Unauthenticated => None,
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    state: &'a AuthenticatedSession,
    version: u32,
}

#[derive(Deserialize)]
struct StoredEnvelope {
    #[serde(default)]
    version: u32,
    state: serde_json::Value,
}

/// Process-wide owner of the current session.
///
/// Reads are synchronous snapshots of a `watch` channel, so a reader sees
/// either the old pair or the new pair, never a mix. Only [`set_session`]
/// and [`clear_session`] write, and neither awaits.
///
/// [`set_session`]: SessionStore::set_session
/// [`clear_session`]: SessionStore::clear_session
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<SessionState>,
    hydrated: watch::Sender<bool>,
    /// Set by a teardown, reset by the next `set_session`
    logging_out: AtomicBool,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            storage,
            navigator,
            state: watch::Sender::new(SessionState::Unauthenticated),
            hydrated: watch::Sender::new(false),
            logging_out: AtomicBool::new(false),
        }
    }

    /// Replace the session after a successful login and persist it.
    pub fn set_session(&self, user: Identity, token: Credential) {
        let session = AuthenticatedSession {
            user,
            token,
            established_at: Utc::now(),
        };

        if let Err(e) = self.persist(&session) {
            warn!(error = %e, "Failed to save session");
        }

        info!(user_id = %session.user.id, role = %session.user.role, "Session established");
        self.logging_out.store(false, Ordering::SeqCst);
        self.state.send_replace(SessionState::Authenticated(session));
    }

    /// Current bearer credential, if signed in
    pub fn credential(&self) -> Option<Credential> {
        self.state.borrow().credential().cloned()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Tear the session down, evict the durable copy and redirect to login.
    ///
    /// The redirect fires once per teardown: repeated calls before the next
    /// `set_session` still clear state and storage but do not navigate again.
    /// Returns whether this call performed the redirect.
    pub fn clear_session(&self) -> bool {
        let first = !self.logging_out.swap(true, Ordering::SeqCst);
        let previous = self.state.send_replace(SessionState::Unauthenticated);

        if let Err(e) = self.storage.remove(STORAGE_KEY) {
            warn!(error = %e, "Failed to remove persisted session");
        }

        if first {
            match previous.identity() {
                Some(user) => info!(user_id = %user.id, "Session cleared"),
                None => debug!("Session cleared while signed out"),
            }
            self.navigator.redirect_to_login();
        } else {
            debug!("Teardown already in progress, skipping redirect");
        }
        first
    }

    /// Restore the persisted session, then mark hydration finished.
    ///
    /// A missing envelope leaves the in-memory state as it is. A corrupt or
    /// version-mismatched envelope is evicted. Returns whether a session
    /// was restored.
    pub fn hydrate(&self) -> bool {
        let restored = match self.load() {
            Ok(Some(session)) => {
                debug!(user_id = %session.user.id, "Session restored from storage");
                self.logging_out.store(false, Ordering::SeqCst);
                self.state.send_replace(SessionState::Authenticated(session));
                true
            }
            Ok(None) => {
                debug!("No persisted session found");
                false
            }
            Err(e) => {
                warn!(error = %e, "Discarding unreadable persisted session");
                if let Err(e) = self.storage.remove(STORAGE_KEY) {
                    warn!(error = %e, "Failed to remove persisted session");
                }
                false
            }
        };

        self.hydrated.send_replace(true);
        restored
    }

    pub fn is_hydrated(&self) -> bool {
        *self.hydrated.borrow()
    }

    /// Resolves once [`hydrate`](SessionStore::hydrate) has completed.
    pub async fn wait_hydrated(&self) {
        let mut rx = self.hydrated.subscribe();
        // The sender lives as long as `self`, so this cannot observe a close.
        let _ = rx.wait_for(|done| *done).await;
    }

    /// Observe session changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn persist(&self, session: &AuthenticatedSession) -> Result<()> {
        let envelope = EnvelopeRef {
            state: session,
            version: ENVELOPE_VERSION,
        };
        let contents = serde_json::to_string(&envelope)?;
        self.storage.write(STORAGE_KEY, &contents)
    }

    fn load(&self) -> Result<Option<AuthenticatedSession>> {
        let Some(contents) = self.storage.read(STORAGE_KEY)? else {
            return Ok(None);
        };

        let envelope: StoredEnvelope =
            serde_json::from_str(&contents).context("Failed to parse session envelope")?;
        if envelope.version != ENVELOPE_VERSION {
            anyhow::bail!("Unsupported session envelope version {}", envelope.version);
        }

        let session: AuthenticatedSession =
            serde_json::from_value(envelope.state).context("Failed to parse persisted session")?;
        if session.token.is_empty() {
            anyhow::bail!("Persisted session has an empty token");
        }
        Ok(Some(session))
    }
}
