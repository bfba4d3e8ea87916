//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use tecbook_core::error::{Error, NetworkError};
use tecbook_core::{ApiResponse, PendingRequest, Result, StatusCode, Transport};

type Handler = Arc<dyn Fn(&PendingRequest) -> Result<ApiResponse> + Send + Sync>;

/// Answers by path from a queue of handlers; the last handler for a path
/// keeps answering once the others are used up. Unknown paths get a 404.
#[derive(Default)]
pub(crate) struct FakeTransport {
    routes: Mutex<HashMap<String, VecDeque<Handler>>>,
    delays: Mutex<HashMap<String, Duration>>,
    requests: Mutex<Vec<PendingRequest>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn respond(&self, path: &str, status: StatusCode, body: Value) {
        self.respond_with(path, move |_| Ok(ApiResponse::from_json(status, &body)));
    }

    pub(crate) fn fail(&self, path: &str) {
        self.respond_with(path, |_| {
            Err(Error::Network(NetworkError::Connection {
                message: "connection refused".into(),
            }))
        });
    }

    pub(crate) fn respond_with<F>(&self, path: &str, handler: F)
    where
        F: Fn(&PendingRequest) -> Result<ApiResponse> + Send + Sync + 'static,
    {
        self.routes
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(Arc::new(handler));
    }

    pub(crate) fn delay(&self, path: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(path.to_string(), delay);
    }

    pub(crate) fn requests(&self) -> Vec<PendingRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path() == path)
            .count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: &PendingRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let delay = self.delays.lock().unwrap().get(request.path()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let handler = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(request.path()) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match handler {
            Some(handler) => handler(request),
            None => Ok(ApiResponse::from_json(
                StatusCode::NOT_FOUND,
                &serde_json::json!({"error": "NotFound"}),
            )),
        }
    }
}

impl std::fmt::Debug for FakeTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeTransport").finish_non_exhaustive()
    }
}
