//! Session state
//!
//! The session is a single-writer cell: [`SessionManager`] is the only type
//! that can change it, and it hands out [`SessionReader`]s to anything that
//! needs the current token. The token and the logged-in flag live in one enum,
//! so they can never disagree.

use serde::Serialize;
use tokio::sync::watch;

/// Authentication state of the app
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    LoggedOut,
    LoggedIn {
        token: String,
    },
}

impl SessionState {
    pub fn token(&self) -> Option<&str> {
        match self {
            SessionState::LoggedOut => None,
            SessionState::LoggedIn { token } => Some(token),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self, SessionState::LoggedIn { .. })
    }

    /// View safe to hand to the UI (no credential)
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            logged_in: self.is_logged_in(),
        }
    }
}

/// Token-free view of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub logged_in: bool,
}

/// Sole writer of session state
#[derive(Debug)]
pub struct SessionManager {
    tx: watch::Sender<SessionState>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    /// Start logged out
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::LoggedOut);
        Self { tx }
    }

    /// Store a new credential. Replaces any existing one (token refresh).
    pub fn update_token(&self, token: impl Into<String>) {
        let previous = self.tx.send_replace(SessionState::LoggedIn {
            token: token.into(),
        });
        if previous.is_logged_in() {
            tracing::info!("Session token refreshed");
        } else {
            tracing::info!("Session started");
        }
    }

    /// Forget the credential
    pub fn clear_token(&self) {
        let previous = self.tx.send_replace(SessionState::LoggedOut);
        if previous.is_logged_in() {
            tracing::info!("Session cleared");
        }
    }

    /// Forget the credential only if it is still `token`.
    ///
    /// Returns whether the session was cleared. A token that has since been
    /// replaced or dropped leaves the session alone.
    pub fn clear_if_current(&self, token: &str) -> bool {
        let cleared = self.tx.send_if_modified(|state| {
            if state.token() == Some(token) {
                *state = SessionState::LoggedOut;
                true
            } else {
                false
            }
        });
        if cleared {
            tracing::info!("Session cleared");
        }
        cleared
    }

    /// Clear the session and return the token that was active, if any.
    ///
    /// Local only: the backend is not told. Callers that want server-side
    /// invalidation revoke the returned token themselves.
    pub fn logout(&self) -> Option<String> {
        match self.tx.send_replace(SessionState::LoggedOut) {
            SessionState::LoggedIn { token } => {
                tracing::info!("Logged out");
                Some(token)
            }
            SessionState::LoggedOut => {
                tracing::debug!("Logout requested while already logged out");
                None
            }
        }
    }

    pub fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn reader(&self) -> SessionReader {
        SessionReader {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read-only handle to the session
#[derive(Debug, Clone)]
pub struct SessionReader {
    rx: watch::Receiver<SessionState>,
}

impl SessionReader {
    pub fn current(&self) -> SessionState {
        self.rx.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.rx.borrow().token().map(str::to_string)
    }

    pub fn is_logged_in(&self) -> bool {
        self.rx.borrow().is_logged_in()
    }

    /// Wait for the next change and return the new state.
    /// Returns `None` once the manager is gone.
    pub async fn changed(&mut self) -> Option<SessionState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
