//! HTTP transport types.
//!
//! # Design
//! Requests and responses are described as plain data. `ApiClient` builds an
//! `HttpRequest`, hands it to a `Transport` for the actual round-trip, and
//! turns the resulting `HttpResponse` into an `ApiResponse` envelope. Keeping
//! the wire shapes as data lets tests drive the client with an in-memory
//! transport and inspect exactly what would have been sent.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute; `query` pairs are appended by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Per-call additions to a request: extra headers and query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// The response envelope handed back to callers.
///
/// `data` holds the decoded body. Bodies are opaque to the client, so the
/// default payload type is a raw JSON value.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T = Value> {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub data: T,
}

impl ApiResponse<Value> {
    /// Decode a successful `HttpResponse`.
    ///
    /// An empty body becomes `Value::Null`; a body that is not JSON is kept
    /// verbatim as `Value::String`.
    pub fn from_http(response: HttpResponse) -> Self {
        let data = if response.body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&response.body).unwrap_or(Value::String(response.body))
        };
        Self {
            status: response.status,
            headers: response.headers,
            data,
        }
    }

    /// Re-decode `data` into a concrete type.
    pub fn into_typed<U: DeserializeOwned>(self) -> Result<ApiResponse<U>, ApiError> {
        let data = serde_json::from_value(self.data)
            .map_err(|e| ApiError::Deserialization(e.to_string()))?;
        Ok(ApiResponse {
            status: self.status,
            headers: self.headers,
            data,
        })
    }
}

impl<T> ApiResponse<T> {
    /// First header with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
