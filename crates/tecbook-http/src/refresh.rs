//! Single-flight access token refresh.
//!
//! Any number of callers may ask for a refresh at the same time; at most one
//! refresh request is on the wire and every caller gets its outcome. The
//! exchange runs in its own task, so a caller that gives up (a dropped
//! future, a timeout) never leaves the other callers waiting forever.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use tecbook_core::error::AuthError;
use tecbook_core::{AccessToken, Credential, PendingRequest, RefreshToken, Result};

use crate::endpoints::{RefreshRequest, RefreshResponse};
use crate::events::{InvalidationReason, SessionEvent};
use crate::lifecycle::SessionLifecycle;

type Outcome = std::result::Result<Credential, AuthError>;

enum RefreshState {
    Idle,
    Refreshing(RefreshTicket),
}

/// The refresh currently in flight.
struct RefreshTicket {
    waiters: Vec<oneshot::Sender<Outcome>>,
}

/// Either an answer available right away or a seat on the in-flight refresh.
enum Plan {
    Ready(Outcome),
    Wait(oneshot::Receiver<Outcome>),
    Start(oneshot::Receiver<Outcome>, RefreshToken),
    NoRefreshToken,
}

/// Coordinates access token refreshes for one session.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    lifecycle: SessionLifecycle,
    endpoint: String,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new(lifecycle: SessionLifecycle) -> Self {
        let endpoint = lifecycle.endpoints().refresh.clone();
        Self {
            inner: Arc::new(CoordinatorInner {
                lifecycle,
                endpoint,
                state: Mutex::new(RefreshState::Idle),
            }),
        }
    }

    /// Refresh the access token, or join the refresh already in flight.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionExpired` if there is no session or the
    /// refresh failed, and `AuthError::NotAuthenticated` if the session has
    /// no refresh token. Both of the latter also invalidate the session.
    pub async fn refresh(&self) -> Result<Credential> {
        self.refresh_after(None).await
    }

    /// Returns true while a refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.state(), RefreshState::Refreshing(_))
    }

    /// Obtain a credential newer than `stale`.
    ///
    /// If the store already holds a different access token (another caller
    /// refreshed meanwhile), it is returned without a network call.
    #[instrument(skip_all)]
    pub(crate) async fn refresh_after(&self, stale: Option<&AccessToken>) -> Result<Credential> {
        let plan = self.plan(stale);

        let outcome = match plan {
            Plan::Ready(outcome) => outcome,
            Plan::NoRefreshToken => {
                self.inner
                    .lifecycle
                    .invalidate(InvalidationReason::NoRefreshToken);
                Err(AuthError::NotAuthenticated)
            }
            Plan::Wait(rx) => {
                debug!("joining in-flight refresh");
                rx.await.unwrap_or(Err(AuthError::SessionExpired))
            }
            Plan::Start(rx, refresh_token) => {
                let coordinator = self.clone();
                tokio::spawn(async move { coordinator.run(refresh_token).await });
                rx.await.unwrap_or(Err(AuthError::SessionExpired))
            }
        };

        outcome.map_err(Into::into)
    }

    fn plan(&self, stale: Option<&AccessToken>) -> Plan {
        let mut state = self.state();

        if let RefreshState::Refreshing(ticket) = &mut *state {
            let (tx, rx) = oneshot::channel();
            ticket.waiters.push(tx);
            return Plan::Wait(rx);
        }

        let Some(current) = self.inner.lifecycle.store().credential() else {
            return Plan::Ready(Err(AuthError::SessionExpired));
        };
        if stale.is_some_and(|stale| *stale != current.access_token) {
            debug!("credential already refreshed");
            return Plan::Ready(Ok(current));
        }
        let Some(refresh_token) = current.refresh_token else {
            return Plan::NoRefreshToken;
        };

        let (tx, rx) = oneshot::channel();
        *state = RefreshState::Refreshing(RefreshTicket { waiters: vec![tx] });
        Plan::Start(rx, refresh_token)
    }

    /// Perform the exchange, update the session and resolve every waiter.
    async fn run(self, refresh_token: RefreshToken) {
        info!("refreshing access token");
        let ticket = TicketGuard::new(&self);

        let outcome = match self.exchange(&refresh_token).await {
            Ok(response) => self.apply(&refresh_token, response),
            Err(e) => {
                warn!(error = %e, "token refresh failed");
                self.fail(&refresh_token)
            }
        };

        ticket.resolve(&outcome);
        if outcome.is_ok() {
            self.inner.lifecycle.notify(SessionEvent::Refreshed);
        }
    }

    /// Return to `Idle` and hand `outcome` to everyone waiting on the ticket.
    fn resolve(&self, outcome: &Outcome) {
        let waiters = match std::mem::replace(&mut *self.state(), RefreshState::Idle) {
            RefreshState::Refreshing(ticket) => ticket.waiters,
            RefreshState::Idle => Vec::new(),
        };
        debug!(waiters = waiters.len(), ok = outcome.is_ok(), "refresh resolved");
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }

    async fn exchange(&self, refresh_token: &RefreshToken) -> Result<RefreshResponse> {
        let request = PendingRequest::post(&self.inner.endpoint).json(&RefreshRequest {
            refresh: refresh_token.as_str(),
        })?;
        let response = self
            .inner
            .lifecycle
            .transport()
            .send(&request)
            .await?
            .error_for_status()?;
        response.json()
    }

    fn apply(&self, used: &RefreshToken, response: RefreshResponse) -> Outcome {
        let store = self.inner.lifecycle.store();
        // Without rotation the old refresh token stays valid.
        let refresh = response.refresh.or_else(|| Some(used.clone()));

        let credential = match Credential::new(response.access, refresh) {
            Ok(credential) => credential.with_lifetime(response.expires_in),
            Err(e) => {
                warn!(error = %e, "refresh response carried no usable token");
                return self.fail(used);
            }
        };

        if store.replace_credential(used, credential.clone()) {
            info!("access token refreshed");
            return Ok(credential);
        }

        // Logged out or logged in again while the refresh was in flight.
        debug!("session changed during refresh, discarding result");
        store.credential().ok_or(AuthError::SessionExpired)
    }

    fn fail(&self, used: &RefreshToken) -> Outcome {
        let lifecycle = &self.inner.lifecycle;
        let still_current = lifecycle
            .store()
            .credential()
            .is_some_and(|c| c.refresh_token.as_ref() == Some(used));
        if still_current {
            lifecycle.invalidate(InvalidationReason::RefreshFailed);
        }
        Err(AuthError::SessionExpired)
    }

    fn state(&self) -> MutexGuard<'_, RefreshState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resolves the ticket with `SessionExpired` if the refresh task ends
/// without an outcome, so no waiter is left hanging.
struct TicketGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    armed: bool,
}

impl<'a> TicketGuard<'a> {
    fn new(coordinator: &'a RefreshCoordinator) -> Self {
        Self {
            coordinator,
            armed: true,
        }
    }

    fn resolve(mut self, outcome: &Outcome) {
        self.armed = false;
        self.coordinator.resolve(outcome);
    }
}

impl Drop for TicketGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("refresh ended without an outcome");
            self.coordinator.resolve(&Err(AuthError::SessionExpired));
        }
    }
}

impl fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("endpoint", &self.inner.endpoint)
            .field("refreshing", &self.is_refreshing())
            .finish()
    }
}
