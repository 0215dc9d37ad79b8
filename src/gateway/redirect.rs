//! What happens when the server rejects the session with a 401.

use crate::session::SessionStore;
use std::sync::Arc;
use tracing::warn;

/// Sends the user to the re-authentication entry point at `path`.
pub trait AuthRedirect: Send + Sync {
    fn redirect(&self, path: &str);
}

/// Only logs the rejection.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRedirect;

impl AuthRedirect for LogRedirect {
    fn redirect(&self, path: &str) {
        warn!("Session rejected by the server, re-authenticate via {path}");
    }
}

/// Drops the local session so the next run starts anonymous.
#[derive(Debug, Clone)]
pub struct ResetSession {
    session: Arc<SessionStore>,
}

impl ResetSession {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }
}

impl AuthRedirect for ResetSession {
    fn redirect(&self, path: &str) {
        warn!("Session rejected by the server, clearing it ({path})");
        self.session.logout();
    }
}
