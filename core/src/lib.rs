//! Client core for the course portal API.
//!
//! # Overview
//! Resolves configuration from the environment, sends JSON requests through
//! a single long-lived `ApiClient`, and exposes the remote API as the
//! `ApiService` facade. The logged-in user is cached as two string entries
//! in a pluggable `SessionStore`.
//!
//! # Design
//! - `Config` is resolved once and never mutated; resolution cannot fail.
//! - The network round-trip sits behind the `Transport` trait and every call
//!   is reported to a `RequestObserver`, so the client can be driven and
//!   inspected in tests without a server or captured log output.
//! - Errors pass through the client unchanged: one attempt, no retries.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod observer;
pub mod service;
pub mod session;
pub mod telemetry;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use client::ApiClient;
pub use config::{Config, Endpoint};
pub use error::{ApiError, StoreError};
pub use http::{ApiResponse, HttpMethod, HttpRequest, HttpResponse, RequestOptions};
pub use observer::{FailureKind, NoopObserver, RequestObserver, TracingObserver};
pub use service::ApiService;
pub use session::{FileStore, MemoryStore, Session, SessionStore};
pub use transport::{Transport, UreqTransport};
