//! In-memory doubles for the transport and observer seams.
//!
//! Compiled for this crate's tests and for dependents that enable the
//! `test-util` feature.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::observer::{FailureKind, RequestObserver};
use crate::transport::Transport;

type Responder = dyn Fn(&HttpRequest) -> Result<HttpResponse, ApiError> + Send + Sync;

/// Answers every request with a closure and remembers what it was sent.
#[derive(Clone)]
pub struct StubTransport {
    responder: Arc<Responder>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl StubTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, ApiError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answer 200 with `body`.
    pub fn ok(body: Value) -> Self {
        Self::new(move |_| Ok(json_response(200, &body)))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let result = (self.responder)(&request);
        self.requests.lock().push(request);
        result
    }
}

pub fn json_response(status: u16, body: &Value) -> HttpResponse {
    HttpResponse {
        status,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: body.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverEvent {
    /// `"METHOD url"`
    Request(String),
    RequestError(ApiError),
    Response(String, u16),
    Failure(String, FailureKind, ApiError),
}

/// Records every notification in order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events.lock().clone()
    }
}

impl RequestObserver for RecordingObserver {
    fn on_request(&self, request: &HttpRequest) {
        self.events
            .lock()
            .push(ObserverEvent::Request(format!("{} {}", request.method, request.url)));
    }

    fn on_request_error(&self, error: &ApiError) {
        self.events.lock().push(ObserverEvent::RequestError(error.clone()));
    }

    fn on_response(&self, request: &HttpRequest, response: &HttpResponse) {
        self.events
            .lock()
            .push(ObserverEvent::Response(request.url.clone(), response.status));
    }

    fn on_failure(&self, request: &HttpRequest, error: &ApiError, kind: FailureKind) {
        self.events
            .lock()
            .push(ObserverEvent::Failure(request.url.clone(), kind, error.clone()));
    }
}
