use std::fmt;

use crate::{
    config::{ClientConfig, SharedConfig},
    executor::RequestExecutor,
    request::ApiRequest,
    types::ApiResponse,
    Result,
};

/// Client for the Meetly REST API.
///
/// Pure composition: builds a request descriptor per call and delegates to
/// the dispatch engine, which reads the shared settings on every call.
pub struct MeetlyClient {
    executor: RequestExecutor,
    config: SharedConfig,
}

impl fmt::Debug for MeetlyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeetlyClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MeetlyClient {
    /// Creates a client from an explicit configuration.
    pub fn new(config: ClientConfig) -> Self {
        let shared = config.config.clone();
        Self {
            executor: RequestExecutor::new(
                config.config,
                config.credentials,
                config.timeout_ms,
                config.retry_backoff_ms,
            ),
            config: shared,
        }
    }

    /// The settings handle this client reads on every call.
    pub fn settings(&self) -> SharedConfig {
        self.config.clone()
    }

    /// Dispatches a request descriptor.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.executor.dispatch(request).await
    }

    /// GET without parameters.
    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::get(path)).await
    }

    /// POST with a JSON body.
    pub async fn post(&self, path: &str, body: serde_json::Value) -> Result<ApiResponse> {
        self.send(ApiRequest::post(path).json(body)).await
    }
}
