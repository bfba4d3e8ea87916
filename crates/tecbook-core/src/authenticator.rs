//! Credential attachment.

use std::sync::Arc;

use http::header::{AUTHORIZATION, HeaderValue};
use tracing::{trace, warn};

use crate::policy::{Access, EndpointPolicy};
use crate::request::PendingRequest;
use crate::session::Credential;

/// Decides whether and how a pending request carries the credential.
///
/// Pure: no I/O and no failure path.
#[derive(Debug, Clone)]
pub struct RequestAuthenticator {
    policy: Arc<EndpointPolicy>,
}

impl RequestAuthenticator {
    pub fn new(policy: Arc<EndpointPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &EndpointPolicy {
        &self.policy
    }

    /// Return `request` prepared for sending with `credential`.
    ///
    /// - Public paths never carry an `Authorization` header.
    /// - Protected paths carry `Bearer <access token>` when a credential exists.
    /// - Protected paths without a credential go out unchanged.
    pub fn attach(
        &self,
        mut request: PendingRequest,
        credential: Option<&Credential>,
    ) -> PendingRequest {
        if self.policy.classify(request.path()) == Access::Public {
            request.headers_mut().remove(AUTHORIZATION);
            trace!(path = request.path(), "public endpoint, no credential attached");
            return request;
        }

        let Some(credential) = credential else {
            trace!(path = request.path(), "no credential for protected endpoint");
            return request;
        };

        let bearer = format!("Bearer {}", credential.access_token.as_str());
        match HeaderValue::from_str(&bearer) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(_) => {
                // Sent without a credential; the server answers 401.
                warn!(path = request.path(), "access token is not a valid header value");
                request.headers_mut().remove(AUTHORIZATION);
            }
        }

        request
    }
}

impl Default for RequestAuthenticator {
    fn default() -> Self {
        Self::new(Arc::new(EndpointPolicy::default()))
    }
}
