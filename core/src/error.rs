//! Error types for the portal API client.
//!
//! # Design
//! Every failure the client can produce is a variant of `ApiError`. Non-2xx
//! responses keep the raw status code and body so callers can inspect them;
//! the client never rewrites or enriches an error after observing it. The
//! type is `Clone` so the hooks can store it in their state and still hand it
//! to the caller.

use std::time::Duration;

use thiserror::Error;

/// Errors returned by `ApiClient` and the service facade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("request failed with status code {status}")]
    Status { status: u16, body: String },

    /// No response arrived within the configured timeout.
    #[error("timeout of {}ms exceeded", .0.as_millis())]
    Timeout(Duration),

    /// The request never produced a response (connection refused, DNS, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The request could not be constructed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The response body could not be decoded into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A field the client relies on is absent from the response data.
    #[error("missing field `{0}` in response")]
    MissingField(&'static str),
}

impl ApiError {
    /// HTTP status code, when the failure came from a server response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout(_))
    }
}

/// Errors raised by a `SessionStore` backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session store is corrupt: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_message_matches_http_client_wording() {
        let err = ApiError::Status {
            status: 401,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "request failed with status code 401");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn timeout_message_reports_milliseconds() {
        let err = ApiError::Timeout(Duration::from_millis(10_000));
        assert_eq!(err.to_string(), "timeout of 10000ms exceeded");
        assert!(err.is_timeout());
        assert_eq!(err.status(), None);
    }
}
