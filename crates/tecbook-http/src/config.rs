//! Client configuration.

use std::time::Duration;

use tecbook_core::ApiUrl;

/// Paths of the authentication endpoints, relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    pub login: String,
    pub google_login: String,
    pub refresh: String,
    pub logout: String,
    pub current_user: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            google_login: "/auth/google".to_string(),
            refresh: "/auth/refresh".to_string(),
            logout: "/auth/logout".to_string(),
            current_user: "/auth/user".to_string(),
        }
    }
}

/// Configuration shared by the transport, gateway and lifecycle.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: ApiUrl,
    pub endpoints: AuthEndpoints,
    /// Total time allowed for one request, including the body.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// A credential this close to expiry is refreshed before it is used.
    pub refresh_margin: Duration,
    /// How long logout waits for the server to revoke the refresh token.
    pub revoke_timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    /// Default request timeout.
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    /// Default connect timeout.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default proactive refresh margin.
    pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(30);
    /// Default wait for the server-side logout.
    pub const DEFAULT_REVOKE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Configuration with defaults for everything but the base URL.
    pub fn new(api_url: ApiUrl) -> Self {
        Self {
            api_url,
            endpoints: AuthEndpoints::default(),
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            refresh_margin: Self::DEFAULT_REFRESH_MARGIN,
            revoke_timeout: Self::DEFAULT_REVOKE_TIMEOUT,
            user_agent: concat!("tecbook/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: AuthEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the proactive refresh margin. `Duration::ZERO` only refreshes
    /// credentials that have already expired.
    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    pub fn with_revoke_timeout(mut self, timeout: Duration) -> Self {
        self.revoke_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// The refresh margin as a `chrono` duration, saturating on overflow.
    pub(crate) fn refresh_margin_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.refresh_margin).unwrap_or(chrono::Duration::MAX)
    }
}
