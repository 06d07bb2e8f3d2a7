//! View-layer state machines over `portal-core`.
//!
//! # Overview
//! Three hooks, each wrapping one async call in observable state:
//! - `UseApi`: `{data, loading, error}` for a data fetch.
//! - `UseAuth`: the logged-in user, backed by the cached session keys.
//! - `UseAsyncOperation`: `loading` and `error` around any operation.
//!
//! # Design
//! Every hook is a cheap cloneable handle over shared state, so it can be
//! passed into spawned tasks. State changes happen synchronously when an
//! operation starts and once more when it settles; nothing is retried or
//! cancelled. Hook operations never return `Err`: failures end up in the
//! hook's `error` state or in an `Outcome::Failure`.

pub mod outcome;
pub mod use_api;
pub mod use_async_operation;
pub mod use_auth;

pub use outcome::Outcome;
pub use use_api::{FetchState, UseApi};
pub use use_async_operation::{OperationState, UseAsyncOperation};
pub use use_auth::{AuthState, UseAuth};
