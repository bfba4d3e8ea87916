//! Error types for TecBook API clients.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, HTTP status, input validation and storage errors.

use std::fmt;
use thiserror::Error;

/// The unified error type for tecbook operations.
///
/// Callers match on the variant to decide who handles a failure: network
/// errors are retryable by the caller, `Auth` errors mean the user must
/// (re-)authenticate, and `Server`/`Validation` carry the API's own answer.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout, undecodable response).
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Authentication errors (invalid credentials, expired session).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The API answered with a 5xx status.
    #[error("server error: {0}")]
    Server(HttpStatusError),

    /// The API rejected the request with a 4xx status other than 401.
    #[error("request rejected: {0}")]
    Validation(HttpStatusError),

    /// Input validation errors (bad URL, header value, pattern).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Credential persistence errors.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl Error {
    /// Map a non-success HTTP status onto the error taxonomy.
    pub fn from_status(status: HttpStatusError) -> Self {
        match status.status {
            401 => Error::Auth(AuthError::Unauthorized),
            500..=599 => Error::Server(status),
            _ => Error::Validation(status),
        }
    }

    /// Returns true if the failure means the user has to log in again.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Error::Auth(
                AuthError::Unauthorized | AuthError::SessionExpired | AuthError::NotAuthenticated
            )
        )
    }

    /// Returns true if the caller may reasonably retry the same call later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Server(_))
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// The response body could not be decoded.
    #[error("invalid response body: {message}")]
    Decode { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
///
/// Cloneable so a single refresh outcome can be handed to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The server rejected the login credentials.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The server answered 401 even after the token was refreshed.
    #[error("unauthorized")]
    Unauthorized,

    /// The session could not be refreshed and has been cleared.
    #[error("session expired")]
    SessionExpired,

    /// A protected call was made without any stored credential.
    #[error("not authenticated")]
    NotAuthenticated,
}

/// A non-success HTTP answer from the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpStatusError {
    /// HTTP status code.
    pub status: u16,
    /// Machine-readable error code (if present).
    pub error: Option<String>,
    /// Error message from the server.
    pub message: Option<String>,
}

impl fmt::Display for HttpStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for HttpStatusError {}

impl HttpStatusError {
    /// Create a new status error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
        }
    }

    /// Returns the server message, falling back to the error code.
    pub fn reason(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Invalid header name or value.
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// Invalid endpoint pattern.
    #[error("invalid endpoint pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    /// A token was empty.
    #[error("{kind} must not be empty")]
    EmptyToken { kind: &'static str },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

/// Credential persistence errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing store failed.
    #[error("I/O error on {location}: {message}")]
    Io { location: String, message: String },

    /// The persisted session could not be decoded.
    #[error("corrupt session data in {location}: {message}")]
    Corrupt { location: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_taxonomy() {
        let unauthorized = Error::from_status(HttpStatusError::new(401, None, None));
        assert!(matches!(unauthorized, Error::Auth(AuthError::Unauthorized)));

        let server = Error::from_status(HttpStatusError::new(503, None, None));
        assert!(matches!(server, Error::Server(ref e) if e.status == 503));

        let validation = Error::from_status(HttpStatusError::new(422, None, None));
        assert!(matches!(validation, Error::Validation(ref e) if e.status == 422));
    }

    #[test]
    fn unauthenticated_groups_terminal_auth_errors() {
        assert!(Error::from(AuthError::SessionExpired).is_unauthenticated());
        assert!(Error::from(AuthError::NotAuthenticated).is_unauthenticated());
        assert!(Error::from(AuthError::Unauthorized).is_unauthenticated());
        assert!(!Error::from(AuthError::InvalidCredentials("bad".into())).is_unauthenticated());
        assert!(!Error::from(NetworkError::Timeout).is_unauthenticated());
    }

    #[test]
    fn network_errors_are_retryable_auth_errors_are_not() {
        assert!(Error::from(NetworkError::Timeout).is_retryable());
        assert!(!Error::from(AuthError::SessionExpired).is_retryable());
    }

    #[test]
    fn status_error_display_includes_code_and_message() {
        let err = HttpStatusError::new(
            400,
            Some("BadRequest".to_string()),
            Some("missing field".to_string()),
        );
        assert_eq!(err.to_string(), "HTTP 400 [BadRequest]: missing field");
        assert_eq!(err.reason(), Some("missing field"));
    }
}
