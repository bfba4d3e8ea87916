//! `reqwest`-backed transport.

use async_trait::async_trait;
use tracing::{debug, instrument, trace};

use tecbook_core::error::{Error, InvalidInputError, NetworkError};
use tecbook_core::{ApiResponse, ApiUrl, PendingRequest, Result, Transport};

use crate::config::ClientConfig;

/// Map a `reqwest` failure onto the transport error kinds.
pub(crate) fn map_transport(err: reqwest::Error) -> Error {
    let network = if err.is_timeout() {
        NetworkError::Timeout
    } else if err.is_connect() {
        NetworkError::Connection {
            message: err.to_string(),
        }
    } else if err.is_decode() {
        NetworkError::Decode {
            message: err.to_string(),
        }
    } else {
        NetworkError::Http {
            message: err.to_string(),
        }
    };
    Error::Network(network)
}

/// Sends [`PendingRequest`]s to the API over HTTP.
///
/// Never interprets the status code; that is the gateway's job.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    api_url: ApiUrl,
}

impl HttpTransport {
    /// Build a transport from the client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized (for
    /// example when the TLS backend fails to load).
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| InvalidInputError::Other {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }

    /// Returns the API base URL requests are sent to.
    pub fn api_url(&self) -> &ApiUrl {
        &self.api_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method(), path = request.path()))]
    async fn send(&self, request: &PendingRequest) -> Result<ApiResponse> {
        let url = self.api_url.endpoint_url(request.path());
        debug!(%url, "sending request");

        let mut builder = self
            .client
            .request(request.method().clone(), &url)
            .headers(request.headers().clone());

        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_transport)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_transport)?;
        trace!(%status, bytes = body.len(), "response received");

        Ok(ApiResponse::new(status, headers, body.to_vec()))
    }
}
