//! Transport trait.

use async_trait::async_trait;

use crate::Result;
use crate::request::{ApiResponse, PendingRequest};

/// Sends a fully prepared request to the API.
///
/// A transport performs no authentication of its own: the request it
/// receives already carries whatever credential the gateway attached.
/// Any HTTP status is a successful send; only failures to obtain a response
/// are errors.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Send `request` and return the response, whatever its status.
    async fn send(&self, request: &PendingRequest) -> Result<ApiResponse>;
}
