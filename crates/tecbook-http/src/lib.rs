//! tecbook-http - HTTP session gateway for the TecBook API.
//!
//! Sends API calls with the session's bearer token, refreshes an expired
//! token once for any number of concurrent callers, and owns login, logout
//! and session invalidation.

mod client;
mod config;
mod endpoints;
mod events;
mod gateway;
mod lifecycle;
mod refresh;
mod transport;

#[cfg(test)]
mod testing;

pub use client::TecbookClient;
pub use config::{AuthEndpoints, ClientConfig};
pub use endpoints::UserPayload;
pub use events::{InvalidationReason, SessionEvent};
pub use gateway::SessionGateway;
pub use lifecycle::{InvalidationCallback, LoginOutcome, SessionLifecycle};
pub use refresh::RefreshCoordinator;
pub use transport::HttpTransport;
