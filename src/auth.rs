//! Login, token validation and logout
//!
//! [`AuthService`] owns the [`SessionManager`], so it is the only place the
//! session is written. Every authenticated call goes through
//! [`AuthService::authorized`], which supplies the token and invalidates the
//! session when the backend rejects it.

use crate::backend::{AuthBackend, BackendError, BackendErrorKind, Credentials, UserProfile};
use crate::notify::{Notifier, SESSION_EXPIRED_ID};
use crate::session::{SessionManager, SessionReader, SessionStatus};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

/// Result of a logout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogoutOutcome {
    /// Whether a session was active
    pub was_logged_in: bool,
    /// Whether the backend confirmed revoking the token; `None` when not attempted
    pub server_revoked: Option<bool>,
}

pub struct AuthService {
    session: SessionManager,
    backend: Arc<dyn AuthBackend>,
    notifier: Arc<dyn Notifier>,
    revoke_on_logout: bool,
}

impl AuthService {
    pub fn new(backend: Arc<dyn AuthBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            session: SessionManager::new(),
            backend,
            notifier,
            revoke_on_logout: false,
        }
    }

    /// Also ask the backend to revoke the token on logout
    #[must_use]
    pub fn with_revoke_on_logout(mut self, enabled: bool) -> Self {
        self.revoke_on_logout = enabled;
        self
    }

    pub fn session(&self) -> SessionReader {
        self.session.reader()
    }

    pub fn status(&self) -> SessionStatus {
        self.session.current().status()
    }

    /// Exchange credentials for a token and start the session.
    ///
    /// On failure the session is left as it was.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), BackendError> {
        if credentials.is_blank() {
            return Err(BackendError::invalid_request("Email and password are required"));
        }

        match self.backend.login(credentials).await {
            Ok(response) => {
                self.session.update_token(response.token);
                tracing::info!(email = %credentials.email, "Login succeeded");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    email = %credentials.email,
                    kind = ?e.kind,
                    error = %e,
                    "Login failed"
                );
                Err(e)
            }
        }
    }

    /// Validate the current token and return its profile
    pub async fn profile(&self) -> Result<UserProfile, BackendError> {
        let backend = Arc::clone(&self.backend);
        self.authorized(|token| async move { backend.validate(&token).await })
            .await
    }

    /// Run an authenticated call with the current token.
    ///
    /// Fails with `MissingToken` without calling anything when logged out.
    /// An `Unauthorized` result ends the session, unless the token it was
    /// issued for has already been replaced.
    pub async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, BackendError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let token = self
            .session
            .current()
            .token()
            .map(str::to_string)
            .ok_or_else(BackendError::missing_token)?;

        let result = call(token.clone()).await;
        if let Err(e) = &result {
            if e.kind == BackendErrorKind::Unauthorized {
                self.invalidate(&token, &e.message);
            }
        }
        result
    }

    /// Drop a session the backend no longer accepts
    fn invalidate(&self, token: &str, reason: &str) {
        if !self.session.clear_if_current(token) {
            tracing::debug!(reason, "Rejected token is no longer current, keeping session");
            return;
        }
        tracing::warn!(reason, "Backend rejected session token, logged out");
        self.notifier.notify(
            "Sesión expirada",
            "Vuelve a iniciar sesión para seguir monitoreando tus estanques.",
            SESSION_EXPIRED_ID,
        );
    }

    /// End the session. The local clear always happens first and always succeeds.
    pub async fn logout(&self) -> LogoutOutcome {
        let previous = self.session.logout();
        let was_logged_in = previous.is_some();

        let server_revoked = match previous {
            Some(token) if self.revoke_on_logout => match self.backend.revoke(&token).await {
                Ok(()) => Some(true),
                Err(e) => {
                    tracing::warn!(kind = ?e.kind, error = %e, "Token revocation failed");
                    Some(false)
                }
            },
            _ => None,
        };

        LogoutOutcome {
            was_logged_in,
            server_revoked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockAuthBackend, RecordingNotifier};

    fn service() -> (AuthService, Arc<MockAuthBackend>, Arc<RecordingNotifier>) {
        let backend = Arc::new(MockAuthBackend::new("tok-1"));
        let notifier = Arc::new(RecordingNotifier::default());
        let service = AuthService::new(backend.clone(), notifier.clone());
        (service, backend, notifier)
    }

    #[tokio::test]
    async fn test_login_starts_session() {
        let (auth, _, _) = service();
        auth.login(&Credentials::new("ana@example.com", "lechuga"))
            .await
            .unwrap();
        assert!(auth.status().logged_in);
        assert_eq!(auth.session().token().as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_untouched() {
        let (auth, backend, _) = service();
        backend.fail_login(BackendError::unauthorized("bad password"));
        let err = auth
            .login(&Credentials::new("ana@example.com", "x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Unauthorized);
        assert!(!auth.status().logged_in);
    }

    #[tokio::test]
    async fn test_blank_credentials_rejected_locally() {
        let (auth, backend, _) = service();
        let err = auth.login(&Credentials::new("", "")).await.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::InvalidRequest);
        assert_eq!(backend.login_calls(), 0);
    }

    #[tokio::test]
    async fn test_profile_requires_token() {
        let (auth, backend, _) = service();
        let err = auth.profile().await.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::MissingToken);
        assert!(backend.validated_tokens().is_empty());
    }

    #[tokio::test]
    async fn test_profile_uses_current_token() {
        let (auth, backend, _) = service();
        auth.login(&Credentials::new("ana@example.com", "lechuga"))
            .await
            .unwrap();
        let profile = auth.profile().await.unwrap();
        assert_eq!(profile.email, "ana@example.com");
        assert_eq!(backend.validated_tokens(), vec!["tok-1"]);
    }

    #[tokio::test]
    async fn test_unauthorized_forces_logout_and_notifies() {
        let (auth, backend, notifier) = service();
        auth.login(&Credentials::new("ana@example.com", "lechuga"))
            .await
            .unwrap();
        backend.expire_tokens();

        let err = auth.profile().await.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Unauthorized);
        assert!(!auth.status().logged_in);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].2, SESSION_EXPIRED_ID);
    }

    #[tokio::test]
    async fn test_stale_rejection_keeps_refreshed_session() {
        let (auth, _, notifier) = service();
        auth.login(&Credentials::new("ana@example.com", "lechuga"))
            .await
            .unwrap();

        let (started_tx, started_rx) = tokio::sync::oneshot::channel();
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        let call = auth.authorized(|token| async move {
            started_tx.send(token).unwrap();
            reply_rx.await.unwrap()
        });
        let refresh = async {
            assert_eq!(started_rx.await.unwrap(), "tok-1");
            // Token refreshed while the tok-1 call is in flight
            auth.session.update_token("tok-2");
            reply_tx
                .send(Err::<(), _>(BackendError::unauthorized("tok-1 expired")))
                .unwrap();
        };
        let (result, ()) = tokio::join!(call, refresh);

        assert_eq!(result.unwrap_err().kind, BackendErrorKind::Unauthorized);
        assert!(auth.status().logged_in);
        assert_eq!(auth.session().token().as_deref(), Some("tok-2"));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_other_failures_keep_session() {
        let (auth, _, notifier) = service();
        auth.login(&Credentials::new("ana@example.com", "lechuga"))
            .await
            .unwrap();

        let err = auth
            .authorized(|_| async { Err::<(), _>(BackendError::server("down")) })
            .await
            .unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Server);
        assert!(auth.status().logged_in);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_logout_is_local_by_default() {
        let (auth, backend, _) = service();
        auth.login(&Credentials::new("ana@example.com", "lechuga"))
            .await
            .unwrap();
        let outcome = auth.logout().await;
        assert_eq!(
            outcome,
            LogoutOutcome {
                was_logged_in: true,
                server_revoked: None
            }
        );
        assert!(!auth.status().logged_in);
        assert!(backend.revoked_tokens().is_empty());
    }

    #[tokio::test]
    async fn test_logout_when_logged_out() {
        let (auth, _, _) = service();
        let outcome = auth.logout().await;
        assert!(!outcome.was_logged_in);
        assert!(!auth.status().logged_in);
    }

    #[tokio::test]
    async fn test_logout_with_revoke() {
        let backend = Arc::new(MockAuthBackend::new("tok-1"));
        let auth = AuthService::new(backend.clone(), Arc::new(RecordingNotifier::default()))
            .with_revoke_on_logout(true);
        auth.login(&Credentials::new("ana@example.com", "lechuga"))
            .await
            .unwrap();

        let outcome = auth.logout().await;
        assert_eq!(outcome.server_revoked, Some(true));
        assert_eq!(backend.revoked_tokens(), vec!["tok-1"]);
    }

    #[tokio::test]
    async fn test_failed_revoke_still_logs_out() {
        let backend = Arc::new(MockAuthBackend::new("tok-1"));
        backend.fail_revoke(BackendError::network("offline"));
        let auth = AuthService::new(backend.clone(), Arc::new(RecordingNotifier::default()))
            .with_revoke_on_logout(true);
        auth.login(&Credentials::new("ana@example.com", "lechuga"))
            .await
            .unwrap();

        let outcome = auth.logout().await;
        assert!(outcome.was_logged_in);
        assert_eq!(outcome.server_revoked, Some(false));
        assert!(!auth.status().logged_in);
    }
}
