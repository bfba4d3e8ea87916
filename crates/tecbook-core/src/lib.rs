//! tecbook-core - Session types, endpoint policy and credential storage.
//!
//! This crate holds everything about an authenticated TecBook session that
//! does not touch the network: which endpoints need a credential, how the
//! credential is attached, and where it is kept.

pub mod authenticator;
pub mod credentials;
pub mod error;
pub mod policy;
pub mod request;
pub mod session;
pub mod store;
pub mod tokens;
pub mod traits;
pub mod types;

pub use authenticator::RequestAuthenticator;
pub use credentials::LoginCredentials;
pub use error::{AuthError, Error};
pub use policy::{Access, EndpointPolicy, EndpointRule};
pub use request::{ApiResponse, PendingRequest};
pub use session::{Credential, Identity, Role, SessionRecord};
pub use store::{CredentialBackend, CredentialStore, MemoryBackend};
pub use tokens::{AccessToken, RefreshToken};
pub use traits::Transport;
pub use types::ApiUrl;

/// Re-exported so callers can build requests without a direct `http` dependency.
pub use http::{Method, StatusCode};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
