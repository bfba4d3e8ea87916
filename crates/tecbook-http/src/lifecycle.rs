//! Login, logout and session invalidation.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use tecbook_core::error::AuthError;
use tecbook_core::{
    AccessToken, ApiResponse, Credential, CredentialStore, Identity, LoginCredentials,
    PendingRequest, RefreshToken, RequestAuthenticator, Result, SessionRecord, StatusCode,
    Transport,
};

use crate::config::{AuthEndpoints, ClientConfig};
use crate::endpoints::{GoogleLoginRequest, LoginRequest, LoginResponse, LogoutRequest};
use crate::events::{EVENT_CAPACITY, InvalidationReason, SessionEvent};

/// Called once per invalidated session, typically to send the user back to
/// the login screen.
pub type InvalidationCallback = Arc<dyn Fn(InvalidationReason) + Send + Sync>;

/// What a successful login produced.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub identity: Option<Identity>,
    /// The account must finish its profile before using the app.
    pub requires_completion: bool,
    /// Where the server suggests sending the user next.
    pub redirect_to: Option<String>,
}

/// Owns the transitions into and out of an authenticated session.
#[derive(Clone)]
pub struct SessionLifecycle {
    inner: Arc<LifecycleInner>,
    revoke_timeout: Duration,
}

struct LifecycleInner {
    store: CredentialStore,
    transport: Arc<dyn Transport>,
    authenticator: RequestAuthenticator,
    endpoints: AuthEndpoints,
    events: broadcast::Sender<SessionEvent>,
    on_invalidated: RwLock<Option<InvalidationCallback>>,
}

impl SessionLifecycle {
    pub fn new(
        store: CredentialStore,
        transport: Arc<dyn Transport>,
        authenticator: RequestAuthenticator,
        endpoints: AuthEndpoints,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(LifecycleInner {
                store,
                transport,
                authenticator,
                endpoints,
                events,
                on_invalidated: RwLock::new(None),
            }),
            revoke_timeout: ClientConfig::DEFAULT_REVOKE_TIMEOUT,
        }
    }

    /// Bound how long [`SessionLifecycle::logout`] waits for the server.
    pub fn with_revoke_timeout(mut self, timeout: Duration) -> Self {
        self.revoke_timeout = timeout;
        self
    }

    pub fn store(&self) -> &CredentialStore {
        &self.inner.store
    }

    pub fn endpoints(&self) -> &AuthEndpoints {
        &self.inner.endpoints
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    pub(crate) fn authenticator(&self) -> &RequestAuthenticator {
        &self.inner.authenticator
    }

    /// Receive every subsequent [`SessionEvent`].
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Register the callback run when a session is invalidated.
    ///
    /// Replaces any previously registered callback.
    pub fn on_session_invalidated<F>(&self, callback: F)
    where
        F: Fn(InvalidationReason) + Send + Sync + 'static,
    {
        *self
            .inner
            .on_invalidated
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(callback));
    }

    /// Log in with institutional email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the server rejects the
    /// credentials. On any error the stored session is left untouched.
    #[instrument(skip(self, credentials), fields(email = credentials.email()))]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome> {
        info!("logging in");
        let request = PendingRequest::post(&self.inner.endpoints.login).json(&LoginRequest {
            correo_institucional: credentials.email(),
            password: credentials.password(),
        })?;
        self.complete_login(request).await
    }

    /// Exchange a Google ID token for a TecBook session.
    #[instrument(skip(self, id_token))]
    pub async fn login_with_google(&self, id_token: &str) -> Result<LoginOutcome> {
        info!("logging in with Google");
        let request = PendingRequest::post(&self.inner.endpoints.google_login)
            .json(&GoogleLoginRequest { id_token })?;
        self.complete_login(request).await
    }

    /// Install a token obtained out of band, such as an OAuth redirect.
    ///
    /// The identity is unknown until it is fetched from the API.
    #[instrument(skip_all)]
    pub fn adopt_token(
        &self,
        access_token: AccessToken,
        refresh_token: Option<RefreshToken>,
    ) -> Result<()> {
        let credential = Credential::new(access_token, refresh_token)?;
        self.inner.store.set(SessionRecord::new(credential, None))?;
        info!("adopted external token");
        self.notify(SessionEvent::LoggedIn { user_id: None });
        Ok(())
    }

    /// Log out.
    ///
    /// The local session is cleared before anything else, so this never
    /// fails. Revoking the refresh token on the server is best-effort and
    /// abandoned after the revoke timeout.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let Some(previous) = self.inner.store.clear() else {
            debug!("logout without a session");
            return;
        };
        info!("logged out");
        self.notify(SessionEvent::LoggedOut);

        let Some(refresh) = previous.credential.refresh_token.as_ref() else {
            return;
        };
        match tokio::time::timeout(
            self.revoke_timeout,
            self.revoke(&previous.credential, refresh),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "server logout failed; local session already cleared"),
            Err(_) => warn!(
                timeout = ?self.revoke_timeout,
                "server logout timed out; local session already cleared"
            ),
        }
    }

    /// Clear the session because it can no longer be used.
    ///
    /// Emits [`SessionEvent::Invalidated`] and runs the invalidation callback
    /// only if there was a session to clear, so concurrent failures notify
    /// once. Returns whether a session was cleared.
    pub fn invalidate(&self, reason: InvalidationReason) -> bool {
        if self.inner.store.clear().is_none() {
            debug!(%reason, "session already cleared");
            return false;
        }

        warn!(%reason, "session invalidated");
        self.notify(SessionEvent::Invalidated { reason });

        let callback = self
            .inner
            .on_invalidated
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(callback) = callback {
            callback(reason);
        }
        true
    }

    pub(crate) fn notify(&self, event: SessionEvent) {
        // No subscribers is not an error.
        let _ = self.inner.events.send(event);
    }

    async fn complete_login(&self, request: PendingRequest) -> Result<LoginOutcome> {
        let response = self.inner.transport.send(&request).await?;
        let body: LoginResponse = login_response(response)?.json()?;

        let credential =
            Credential::new(body.token, body.refresh)?.with_lifetime(body.expires_in);
        let identity = body.user.map(Identity::from);
        self.inner
            .store
            .set(SessionRecord::new(credential, identity.clone()))?;

        let user_id = identity.as_ref().map(|i| i.user_id);
        info!(?user_id, requires_completion = body.requires_completion, "logged in");
        self.notify(SessionEvent::LoggedIn { user_id });

        Ok(LoginOutcome {
            identity,
            requires_completion: body.requires_completion,
            redirect_to: body.redirect_to,
        })
    }

    async fn revoke(&self, credential: &Credential, refresh: &RefreshToken) -> Result<()> {
        let request = PendingRequest::post(&self.inner.endpoints.logout).json(&LogoutRequest {
            refresh: refresh.as_str(),
        })?;
        let request = self.inner.authenticator.attach(request, Some(credential));
        self.inner.transport.send(&request).await?.error_for_status()?;
        debug!("refresh token revoked");
        Ok(())
    }
}

/// Map the login endpoint's rejections onto `InvalidCredentials`.
fn login_response(response: ApiResponse) -> Result<ApiResponse> {
    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            let reason = response
                .status_error()
                .reason()
                .unwrap_or("invalid email or password")
                .to_string();
            Err(AuthError::InvalidCredentials(reason).into())
        }
        _ => response.error_for_status(),
    }
}

impl fmt::Debug for SessionLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionLifecycle")
            .field("store", &self.inner.store)
            .field("endpoints", &self.inner.endpoints)
            .field("revoke_timeout", &self.revoke_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tecbook_core::Error;

    fn lifecycle(transport: Arc<FakeTransport>) -> SessionLifecycle {
        SessionLifecycle::new(
            CredentialStore::in_memory(),
            transport,
            RequestAuthenticator::default(),
            AuthEndpoints::default(),
        )
    }

    fn credentials() -> LoginCredentials {
        LoginCredentials::new("ana@tecsup.edu.pe", "secret")
    }

    #[tokio::test]
    async fn login_stores_credential_and_identity() {
        let transport = FakeTransport::new();
        transport.respond(
            "/auth/login",
            StatusCode::OK,
            json!({
                "token": "A1",
                "refresh": "R1",
                "expiresIn": 900,
                "user": {"id": 5, "nombre": "Ana", "correoInstitucional": "ana@tecsup.edu.pe", "rol": "estudiante"}
            }),
        );
        let lifecycle = lifecycle(transport.clone());
        let mut events = lifecycle.subscribe();

        let outcome = lifecycle.login(&credentials()).await.unwrap();

        assert_eq!(outcome.identity.unwrap().user_id, 5);
        let credential = lifecycle.store().credential().unwrap();
        assert_eq!(credential.access_token.as_str(), "A1");
        assert!(credential.expires_at.is_some());
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::LoggedIn { user_id: Some(5) }
        );

        let sent = transport.requests();
        assert_eq!(
            sent[0].body(),
            Some(&json!({"correoInstitucional": "ana@tecsup.edu.pe", "password": "secret"}))
        );
        assert!(sent[0].bearer_token().is_none());
    }

    #[tokio::test]
    async fn rejected_login_leaves_session_untouched() {
        let transport = FakeTransport::new();
        transport.respond(
            "/auth/login",
            StatusCode::UNAUTHORIZED,
            json!({"message": "Credenciales inválidas"}),
        );
        let lifecycle = lifecycle(transport);
        lifecycle
            .adopt_token(AccessToken::new("OLD"), None)
            .unwrap();

        let err = lifecycle.login(&credentials()).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Auth(AuthError::InvalidCredentials(ref reason)) if reason == "Credenciales inválidas"
        ));
        assert_eq!(
            lifecycle.store().credential().unwrap().access_token.as_str(),
            "OLD"
        );
    }

    #[tokio::test]
    async fn logout_clears_even_when_server_fails() {
        let transport = FakeTransport::new();
        transport.respond("/auth/logout", StatusCode::INTERNAL_SERVER_ERROR, json!({}));
        let lifecycle = lifecycle(transport.clone());
        lifecycle
            .adopt_token(AccessToken::new("A1"), Some(RefreshToken::new("R1")))
            .unwrap();
        let mut events = lifecycle.subscribe();

        lifecycle.logout().await;

        assert!(!lifecycle.store().is_authenticated());
        assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedOut);
        let sent = transport.requests();
        assert_eq!(sent[0].body(), Some(&json!({"refresh": "R1"})));
        assert_eq!(sent[0].bearer_token(), Some("A1"));
    }

    #[tokio::test(start_paused = true)]
    async fn logout_gives_up_on_slow_server() {
        let transport = FakeTransport::new();
        transport.respond("/auth/logout", StatusCode::OK, json!({}));
        transport.delay("/auth/logout", Duration::from_secs(60));
        let lifecycle = lifecycle(transport.clone()).with_revoke_timeout(Duration::from_secs(2));
        lifecycle
            .adopt_token(AccessToken::new("A1"), Some(RefreshToken::new("R1")))
            .unwrap();

        let started = tokio::time::Instant::now();
        lifecycle.logout().await;

        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(!lifecycle.store().is_authenticated());
        assert_eq!(transport.count("/auth/logout"), 1);
    }

    #[tokio::test]
    async fn logout_without_refresh_token_skips_server() {
        let transport = FakeTransport::new();
        let lifecycle = lifecycle(transport.clone());
        lifecycle.adopt_token(AccessToken::new("A1"), None).unwrap();

        lifecycle.logout().await;

        assert!(!lifecycle.store().is_authenticated());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn invalidate_notifies_once() {
        let lifecycle = lifecycle(FakeTransport::new());
        lifecycle.adopt_token(AccessToken::new("A1"), None).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        lifecycle.on_session_invalidated(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(lifecycle.invalidate(InvalidationReason::RefreshFailed));
        assert!(!lifecycle.invalidate(InvalidationReason::RefreshFailed));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn adopt_token_rejects_empty_token() {
        let lifecycle = lifecycle(FakeTransport::new());
        let err = lifecycle
            .adopt_token(AccessToken::new("  "), None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(!lifecycle.store().is_authenticated());
    }
}
