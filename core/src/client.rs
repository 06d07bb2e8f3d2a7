//! The HTTP client wrapper.
//!
//! # Design
//! `ApiClient` is built once from a `Config` and shared. Each call goes
//! through three steps: build an `HttpRequest` (base URL, default JSON
//! header, per-call options), execute it through the `Transport`, and turn
//! the answer into an `ApiResponse` or an `ApiError`. The observer is told
//! about every step, but whatever it sees is exactly what the caller gets:
//! one attempt, no retries, and failures come back unchanged.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::Config;
use crate::error::ApiError;
use crate::http::{ApiResponse, HttpMethod, HttpRequest, RequestOptions};
use crate::observer::{FailureKind, RequestObserver, TracingObserver};
use crate::transport::{Transport, UreqTransport};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

/// Long-lived client bound to a base URL and timeout.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    transport: Arc<dyn Transport>,
    observer: Arc<dyn RequestObserver>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Client over the network, logging through `tracing`.
    pub fn new(config: &Config) -> Self {
        Self::with_transport(config, Arc::new(UreqTransport::new(config.timeout)))
    }

    pub fn with_transport(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            transport,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve `path` against the base URL.
    ///
    /// Absolute URLs (`scheme://...`, any case) and protocol-relative
    /// `//host/...` pass through untouched.
    pub fn url_for(&self, path: &str) -> String {
        if is_absolute_url(path) {
            return path.to_string();
        }
        if path.is_empty() {
            return self.base_url.clone();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Build the wire request for one call without sending it.
    pub fn build_request<B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<HttpRequest, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::InvalidRequest(format!("body serialization failed: {e}")))?;

        let mut headers = vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())];
        for (name, value) in &options.headers {
            validate_header(name, value)?;
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        Ok(HttpRequest {
            method,
            url: self.url_for(path),
            headers,
            query: options.query.clone(),
            body,
        })
    }

    /// Build and send one call.
    pub async fn request<B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<ApiResponse, ApiError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let request = match self.build_request(method, path, body, options) {
            Ok(request) => request,
            Err(e) => {
                self.observer.on_request_error(&e);
                return Err(e);
            }
        };
        self.send(request).await
    }

    /// Send an already built request.
    pub async fn send(&self, request: HttpRequest) -> Result<ApiResponse, ApiError> {
        self.observer.on_request(&request);

        let err = match self.transport.execute(request.clone()).await {
            Ok(response) if response.is_success() => {
                self.observer.on_response(&request, &response);
                return Ok(ApiResponse::from_http(response));
            }
            Ok(response) => ApiError::Status {
                status: response.status,
                body: response.body,
            },
            Err(e) => e,
        };

        self.observer
            .on_failure(&request, &err, FailureKind::classify(&err));
        Err(err)
    }
}

fn is_absolute_url(path: &str) -> bool {
    if path.starts_with("//") {
        return true;
    }
    let Some((scheme, _)) = path.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn validate_header(name: &str, value: &str) -> Result<(), ApiError> {
    let token = |c: char| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c);
    if name.is_empty() || !name.chars().all(token) {
        return Err(ApiError::InvalidRequest(format!("invalid header name `{name}`")));
    }
    if value.chars().any(|c| c == '\r' || c == '\n' || c == '\0') {
        return Err(ApiError::InvalidRequest(format!("invalid value for header `{name}`")));
    }
    Ok(())
}
