//! The single entry point for outbound API calls.

use std::fmt;

use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use tecbook_core::error::{AuthError, Error};
use tecbook_core::{
    Access, ApiResponse, Credential, CredentialStore, EndpointPolicy, PendingRequest, Result,
    StatusCode,
};

use crate::events::InvalidationReason;
use crate::lifecycle::SessionLifecycle;
use crate::refresh::RefreshCoordinator;

/// Sends requests with the session's credential and recovers from an expired
/// access token by refreshing it and retrying once.
///
/// Non-401 statuses are returned as-is; use [`ApiResponse::error_for_status`]
/// or [`SessionGateway::call_json`] to turn them into errors.
#[derive(Clone)]
pub struct SessionGateway {
    lifecycle: SessionLifecycle,
    coordinator: RefreshCoordinator,
    refresh_margin: chrono::Duration,
}

impl SessionGateway {
    pub fn new(lifecycle: SessionLifecycle, coordinator: RefreshCoordinator) -> Self {
        Self {
            lifecycle,
            coordinator,
            refresh_margin: chrono::Duration::zero(),
        }
    }

    /// Refresh credentials that expire within `margin` before using them.
    pub fn with_refresh_margin(mut self, margin: chrono::Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    pub fn policy(&self) -> &EndpointPolicy {
        self.lifecycle.authenticator().policy()
    }

    pub fn store(&self) -> &CredentialStore {
        self.lifecycle.store()
    }

    pub fn lifecycle(&self) -> &SessionLifecycle {
        &self.lifecycle
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Send `request`, attaching the credential when the endpoint needs one.
    ///
    /// A protected call answered with 401 triggers one refresh and one retry
    /// with the new token; a request is never sent more than twice.
    ///
    /// # Errors
    ///
    /// - `AuthError::NotAuthenticated` on a 401 when no credential exists,
    ///   or when it has no refresh token (the session is cleared)
    /// - `AuthError::SessionExpired` when the refresh fails
    /// - `AuthError::Unauthorized` when the retry is rejected too
    /// - `Error::Network` when the transport fails
    #[instrument(skip(self, request), fields(method = %request.method(), path = request.path()))]
    pub async fn call(&self, mut request: PendingRequest) -> Result<ApiResponse> {
        let access = self.policy().classify(request.path());
        if access == Access::Public {
            return self.send(request, None).await;
        }

        let credential = self.current_credential().await?;
        let response = self.send(request.clone(), credential.as_ref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        if request.is_retried() {
            return Err(self.rejected_after_refresh());
        }
        let Some(used) = credential else {
            debug!("protected endpoint answered 401 without a credential");
            return Err(AuthError::NotAuthenticated.into());
        };

        debug!("access token rejected, refreshing");
        self.coordinator
            .refresh_after(Some(&used.access_token))
            .await?;
        request.mark_retried();

        let credential = self.store().credential().ok_or(AuthError::SessionExpired)?;
        let response = self.send(request, Some(&credential)).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(self.rejected_after_refresh());
        }
        Ok(response)
    }

    /// Send `request` and decode a successful JSON body.
    ///
    /// # Errors
    ///
    /// As [`SessionGateway::call`], plus `Error::Server`/`Error::Validation`
    /// for error statuses and `NetworkError::Decode` for unexpected bodies.
    pub async fn call_json<T: DeserializeOwned>(&self, request: PendingRequest) -> Result<T> {
        self.call(request).await?.error_for_status()?.json()
    }

    /// Snapshot the credential, refreshing it first if it is about to expire.
    async fn current_credential(&self) -> Result<Option<Credential>> {
        let Some(credential) = self.store().credential() else {
            return Ok(None);
        };

        if credential.can_refresh()
            && credential.expires_within(Utc::now(), self.refresh_margin)
        {
            debug!("access token about to expire, refreshing first");
            self.coordinator
                .refresh_after(Some(&credential.access_token))
                .await?;
            return Ok(self.store().credential());
        }

        Ok(Some(credential))
    }

    async fn send(
        &self,
        request: PendingRequest,
        credential: Option<&Credential>,
    ) -> Result<ApiResponse> {
        let request = self.lifecycle.authenticator().attach(request, credential);
        let response = self.lifecycle.transport().send(&request).await?;
        debug!(status = %response.status(), retried = request.is_retried(), "response");
        Ok(response)
    }

    fn rejected_after_refresh(&self) -> Error {
        warn!("request rejected with a refreshed token");
        self.lifecycle
            .invalidate(InvalidationReason::RejectedAfterRefresh);
        AuthError::Unauthorized.into()
    }
}

impl fmt::Debug for SessionGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGateway")
            .field("lifecycle", &self.lifecycle)
            .field("coordinator", &self.coordinator)
            .field("refresh_margin", &self.refresh_margin)
            .finish()
    }
}
