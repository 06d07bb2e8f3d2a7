//! The wire round-trip behind `ApiClient`.
//!
//! # Design
//! `Transport` is the only place that touches the network. The production
//! implementation drives a single long-lived `ureq::Agent` on tokio's
//! blocking pool, so async callers never block the executor. Non-2xx
//! statuses come back as data (`http_status_as_error(false)`); interpreting
//! them is the client's job, not the transport's.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::runtime::Handle;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one `HttpRequest` and returns whatever the server answered.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// `Transport` backed by a blocking `ureq` agent.
///
/// Calls run on the blocking pool of the ambient tokio runtime. Awaited
/// outside one, `execute` fails with `ApiError::Network`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    timeout: Duration,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent, timeout }
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = self.agent.clone();
        let timeout = self.timeout;
        blocking_pool()?
            .spawn_blocking(move || execute_blocking(&agent, request, timeout))
            .await
            .map_err(|e| ApiError::Network(format!("transport task failed: {e}")))?
    }
}

fn blocking_pool() -> Result<Handle, ApiError> {
    Handle::try_current().map_err(|e| ApiError::Network(format!("no tokio runtime: {e}")))
}

fn execute_blocking(
    agent: &ureq::Agent,
    request: HttpRequest,
    timeout: Duration,
) -> Result<HttpResponse, ApiError> {
    let HttpRequest {
        method,
        url,
        headers,
        query,
        body,
    } = request;

    let result = match method {
        HttpMethod::Get => with_parts(agent.get(&url), &headers, &query).call(),
        HttpMethod::Delete => with_parts(agent.delete(&url), &headers, &query).call(),
        HttpMethod::Post => send(with_parts(agent.post(&url), &headers, &query), body),
        HttpMethod::Put => send(with_parts(agent.put(&url), &headers, &query), body),
        HttpMethod::Patch => send(with_parts(agent.patch(&url), &headers, &query), body),
    };
    let mut response = result.map_err(|e| map_error(e, timeout))?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| map_error(e, timeout))?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn with_parts<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
    query: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    for (key, value) in query {
        builder = builder.query(key.as_str(), value.as_str());
    }
    builder
}

fn send(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<String>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

fn map_error(err: ureq::Error, timeout: Duration) -> ApiError {
    match err {
        ureq::Error::Timeout(_) => ApiError::Timeout(timeout),
        ureq::Error::Io(e) if e.kind() == io::ErrorKind::TimedOut => ApiError::Timeout(timeout),
        ureq::Error::BadUri(uri) => ApiError::InvalidRequest(format!("bad uri: {uri}")),
        other => ApiError::Network(other.to_string()),
    }
}
