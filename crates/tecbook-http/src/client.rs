//! Ready-to-use client wiring the session components together.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::instrument;

use tecbook_core::{
    AccessToken, ApiResponse, Credential, CredentialStore, EndpointPolicy, Identity,
    LoginCredentials, PendingRequest, RefreshToken, RequestAuthenticator, Result, Transport,
};

use crate::config::ClientConfig;
use crate::endpoints::UserPayload;
use crate::events::{InvalidationReason, SessionEvent};
use crate::gateway::SessionGateway;
use crate::lifecycle::{LoginOutcome, SessionLifecycle};
use crate::refresh::RefreshCoordinator;
use crate::transport::HttpTransport;

/// A TecBook API client with an authenticated session.
///
/// # Example
///
/// ```no_run
/// use tecbook_core::{ApiUrl, CredentialStore, LoginCredentials, PendingRequest};
/// use tecbook_http::{ClientConfig, TecbookClient};
///
/// # async fn example() -> tecbook_core::Result<()> {
/// let config = ClientConfig::new(ApiUrl::new("https://tecbook.example.com/api")?);
/// let client = TecbookClient::new(config, CredentialStore::in_memory())?;
///
/// client
///     .login(&LoginCredentials::new("ana@tecsup.edu.pe", "password"))
///     .await?;
/// let classrooms: serde_json::Value = client.call_json(PendingRequest::get("/aulas")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TecbookClient {
    config: ClientConfig,
    gateway: SessionGateway,
}

impl TecbookClient {
    /// Create a client talking HTTP to `config.api_url`.
    pub fn new(config: ClientConfig, store: CredentialStore) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self::with_transport(
            config,
            store,
            transport,
            EndpointPolicy::default(),
        ))
    }

    /// Create a client on a custom transport and endpoint policy.
    pub fn with_transport(
        config: ClientConfig,
        store: CredentialStore,
        transport: Arc<dyn Transport>,
        policy: EndpointPolicy,
    ) -> Self {
        let authenticator = RequestAuthenticator::new(Arc::new(policy));
        let lifecycle =
            SessionLifecycle::new(store, transport, authenticator, config.endpoints.clone())
                .with_revoke_timeout(config.revoke_timeout);
        let coordinator = RefreshCoordinator::new(lifecycle.clone());
        let gateway = SessionGateway::new(lifecycle, coordinator)
            .with_refresh_margin(config.refresh_margin_chrono());

        Self { config, gateway }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn gateway(&self) -> &SessionGateway {
        &self.gateway
    }

    pub fn lifecycle(&self) -> &SessionLifecycle {
        self.gateway.lifecycle()
    }

    pub fn store(&self) -> &CredentialStore {
        self.gateway.store()
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome> {
        self.lifecycle().login(credentials).await
    }

    pub async fn login_with_google(&self, id_token: &str) -> Result<LoginOutcome> {
        self.lifecycle().login_with_google(id_token).await
    }

    pub fn adopt_token(
        &self,
        access_token: AccessToken,
        refresh_token: Option<RefreshToken>,
    ) -> Result<()> {
        self.lifecycle().adopt_token(access_token, refresh_token)
    }

    pub async fn logout(&self) {
        self.lifecycle().logout().await
    }

    /// Force an access token refresh.
    pub async fn refresh(&self) -> Result<Credential> {
        self.gateway.coordinator().refresh().await
    }

    pub async fn call(&self, request: PendingRequest) -> Result<ApiResponse> {
        self.gateway.call(request).await
    }

    pub async fn call_json<T: DeserializeOwned>(&self, request: PendingRequest) -> Result<T> {
        self.gateway.call_json(request).await
    }

    /// Fetch the signed-in user and cache it as the session identity.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<Identity> {
        let request = PendingRequest::get(&self.config.endpoints.current_user);
        let user: UserPayload = self.gateway.call_json(request).await?;
        let identity = Identity::from(user);
        self.store().set_identity(identity.clone())?;
        Ok(identity)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.lifecycle().subscribe()
    }

    pub fn on_session_invalidated<F>(&self, callback: F)
    where
        F: Fn(InvalidationReason) + Send + Sync + 'static,
    {
        self.lifecycle().on_session_invalidated(callback)
    }
}
