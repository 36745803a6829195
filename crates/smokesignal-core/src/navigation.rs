//! Navigation port invoked when the session ends.

use tracing::info;

/// Replaces the current view with the login surface.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

/// Navigator for headless use: records the redirect in the log only.
pub struct LoggingNavigator {
    login_path: String,
}

impl LoggingNavigator {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }
}

impl Navigator for LoggingNavigator {
    fn redirect_to_login(&self) {
        info!(login_path = %self.login_path, "Redirecting to login");
    }
}
