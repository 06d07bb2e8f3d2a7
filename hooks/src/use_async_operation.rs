//! Generic async-operation hook.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use portal_core::ApiError;

use crate::outcome::Outcome;

#[derive(Debug, Clone, PartialEq)]
pub struct OperationState<E> {
    pub loading: bool,
    pub error: Option<E>,
}

/// Tracks `loading` and the last `error` of caller-supplied operations.
pub struct UseAsyncOperation<E = ApiError> {
    state: Arc<Mutex<OperationState<E>>>,
}

impl<E> Clone for UseAsyncOperation<E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<E: Clone + Display> Default for UseAsyncOperation<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Display> UseAsyncOperation<E> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(OperationState {
                loading: false,
                error: None,
            })),
        }
    }

    pub fn state(&self) -> OperationState<E> {
        self.state.lock().clone()
    }

    pub fn loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn error(&self) -> Option<E> {
        self.state.lock().error.clone()
    }

    /// Run `operation`, tracking it in this hook's state.
    ///
    /// `loading` is set before this returns and cleared when the returned
    /// future completes, whatever the outcome. Dropping the future unfinished
    /// clears it too.
    pub fn execute<T, Fut>(&self, operation: Fut) -> impl Future<Output = Outcome<T>>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        {
            let mut state = self.state.lock();
            state.loading = true;
            state.error = None;
        }
        let running = Running {
            state: Arc::clone(&self.state),
        };

        async move {
            let result = operation.await;
            match result {
                Ok(data) => Outcome::Success { data },
                Err(err) => {
                    let outcome = Outcome::failure(&err);
                    running.state.lock().error = Some(err);
                    outcome
                }
            }
        }
    }
}

/// Clears `loading` when an operation's future is dropped, finished or not.
struct Running<E> {
    state: Arc<Mutex<OperationState<E>>>,
}

impl<E> Drop for Running<E> {
    fn drop(&mut self) {
        self.state.lock().loading = false;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test]
    async fn success_returns_data_and_clears_loading() {
        let op: UseAsyncOperation = UseAsyncOperation::new();
        assert!(!op.loading());

        let outcome = op.execute(async { Ok::<_, ApiError>(json!({"saved": true})) }).await;

        assert_eq!(outcome, Outcome::Success { data: json!({"saved": true}) });
        assert_eq!(op.state(), OperationState { loading: false, error: None });
    }

    #[tokio::test]
    async fn failure_returns_message_and_keeps_error() {
        let op: UseAsyncOperation = UseAsyncOperation::new();
        let err = ApiError::Status {
            status: 403,
            body: String::new(),
        };
        let failing = err.clone();

        let outcome: Outcome<()> = op.execute(async move { Err(failing) }).await;

        assert_eq!(outcome, Outcome::failure("request failed with status code 403"));
        assert!(!op.loading());
        assert_eq!(op.error(), Some(err));
    }

    #[tokio::test]
    async fn loading_while_in_flight() {
        let op: UseAsyncOperation<String> = UseAsyncOperation::new();
        let (tx, rx) = oneshot::channel::<Result<u32, String>>();

        let task = tokio::spawn(op.execute(async move { rx.await.unwrap() }));
        assert!(op.loading());

        tx.send(Ok(7)).unwrap();
        assert_eq!(task.await.unwrap(), Outcome::Success { data: 7 });
        assert!(!op.loading());
    }

    #[tokio::test]
    async fn next_execute_clears_previous_error() {
        let op: UseAsyncOperation<String> = UseAsyncOperation::new();
        let _ = op.execute(async { Err::<(), _>("first".to_string()) }).await;
        assert_eq!(op.error().as_deref(), Some("first"));

        let outcome = op.execute(async { Ok::<_, String>(1) }).await;

        assert!(outcome.is_success());
        assert_eq!(op.error(), None);
    }

    #[tokio::test]
    async fn timed_out_operation_clears_loading() {
        let op: UseAsyncOperation = UseAsyncOperation::new();

        let run = op.execute(std::future::pending::<Result<(), ApiError>>());
        let raced = tokio::time::timeout(Duration::from_millis(20), run).await;

        assert!(raced.is_err());
        assert!(!op.loading());
        assert_eq!(op.error(), None);
    }

    #[tokio::test]
    async fn aborted_operation_clears_loading() {
        let op: UseAsyncOperation<String> = UseAsyncOperation::new();
        let task = tokio::spawn(op.execute(std::future::pending::<Result<u32, String>>()));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(op.loading());

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        assert!(!op.loading());
    }
}
