//! Request/response observers.
//!
//! # Design
//! The client reports every stage of a call to an injected `RequestObserver`.
//! Observers only watch: they receive borrowed views of the request, the
//! response or the error, and have no way to change what the caller gets
//! back. `TracingObserver` is the default and writes the diagnostic log
//! lines; tests swap in a recording observer instead of capturing output.

use tracing::{debug, error, info};

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Classification of a failed call, for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The server answered 401.
    Unauthorized,
    /// The server answered 500.
    ServerError,
    /// The call exceeded the client timeout.
    Timeout,
    Other,
}

impl FailureKind {
    pub fn classify(error: &ApiError) -> Self {
        match error {
            ApiError::Status { status: 401, .. } => FailureKind::Unauthorized,
            ApiError::Status { status: 500, .. } => FailureKind::ServerError,
            ApiError::Timeout(_) => FailureKind::Timeout,
            _ => FailureKind::Other,
        }
    }
}

/// Hooks invoked around every call made by `ApiClient`.
pub trait RequestObserver: Send + Sync {
    /// Called once the request is built, before it is sent.
    fn on_request(&self, request: &HttpRequest);

    /// Called when building the request failed; the call is then abandoned.
    fn on_request_error(&self, error: &ApiError);

    /// Called for every 2xx response.
    fn on_response(&self, request: &HttpRequest, response: &HttpResponse);

    /// Called for every failed call after classification.
    fn on_failure(&self, request: &HttpRequest, error: &ApiError, kind: FailureKind);
}

/// Writes each stage as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn on_request(&self, request: &HttpRequest) {
        info!(method = %request.method, url = %request.url, "sending request");
    }

    fn on_request_error(&self, err: &ApiError) {
        error!(error = %err, "request error");
    }

    fn on_response(&self, request: &HttpRequest, response: &HttpResponse) {
        info!(url = %request.url, status = response.status, "response received");
    }

    fn on_failure(&self, request: &HttpRequest, err: &ApiError, kind: FailureKind) {
        match (kind, err) {
            // Log only. A 401 does not end the local session.
            (FailureKind::Unauthorized, _) => {
                error!(url = %request.url, "unauthorized access");
            }
            (FailureKind::ServerError, ApiError::Status { body, .. }) => {
                error!(url = %request.url, body = %body, "server error");
            }
            (FailureKind::Timeout, _) => {
                error!(url = %request.url, "request timeout");
            }
            _ => {
                debug!(url = %request.url, error = %err, "request failed");
            }
        }
    }
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RequestObserver for NoopObserver {
    fn on_request(&self, _request: &HttpRequest) {}
    fn on_request_error(&self, _error: &ApiError) {}
    fn on_response(&self, _request: &HttpRequest, _response: &HttpResponse) {}
    fn on_failure(&self, _request: &HttpRequest, _error: &ApiError, _kind: FailureKind) {}
}
