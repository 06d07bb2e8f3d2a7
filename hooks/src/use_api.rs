//! Data-fetch hook.
//!
//! # Design
//! `UseApi` owns a `{data, loading, error}` triple. Starting a fetch updates
//! the triple right away (`loading = true`, `error = None`) and hands back a
//! future that performs the call; the caller awaits or spawns it. Every
//! fetch is stamped with a generation number, and its result is applied only
//! if no newer fetch has started and the hook is still mounted. A superseded
//! or unmounted fetch still runs to completion on the network; only its
//! state update is dropped. Dropping the future of the current fetch, or a
//! panic inside the call, still clears `loading`.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use portal_core::{ApiError, ApiResponse};
use serde_json::Value;
use tracing::debug;

/// Snapshot of a data-fetch hook.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<ApiError>,
}

struct Slot<T> {
    state: FetchState<T>,
    generation: u64,
    mounted: bool,
    deps: Option<Box<dyn Any + Send>>,
}

impl<T> Slot<T> {
    fn is_current(&self, generation: u64) -> bool {
        self.mounted && self.generation == generation
    }
}

/// Clears `loading` when a fetch ends, however it ends, if it is still current.
struct Pending<T> {
    slot: Arc<Mutex<Slot<T>>>,
    generation: u64,
}

impl<T> Pending<T> {
    fn settle(&self, result: Result<ApiResponse<T>, ApiError>) {
        let mut slot = self.slot.lock();
        if !slot.is_current(self.generation) {
            debug!(
                generation = self.generation,
                current = slot.generation,
                "discarding stale fetch result"
            );
            return;
        }
        match result {
            Ok(response) => slot.state.data = Some(response.data),
            Err(err) => slot.state.error = Some(err),
        }
    }
}

impl<T> Drop for Pending<T> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        if slot.is_current(self.generation) {
            slot.state.loading = false;
        }
    }
}

/// Cloneable handle to one data-fetch hook instance.
pub struct UseApi<T = Value> {
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> Clone for UseApi<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: Clone> Default for UseApi<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> UseApi<T> {
    /// A mounted hook that has not fetched yet. Starts out loading.
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                state: FetchState {
                    data: None,
                    loading: true,
                    error: None,
                },
                generation: 0,
                mounted: true,
                deps: None,
            })),
        }
    }

    pub fn state(&self) -> FetchState<T> {
        self.slot.lock().state.clone()
    }

    pub fn data(&self) -> Option<T> {
        self.slot.lock().state.data.clone()
    }

    pub fn loading(&self) -> bool {
        self.slot.lock().state.loading
    }

    pub fn error(&self) -> Option<ApiError> {
        self.slot.lock().state.error.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.slot.lock().mounted
    }

    /// Start a fetch.
    ///
    /// The state flips to loading before this returns. The returned future
    /// awaits `call` and applies its result if this fetch is still current.
    pub fn fetch<Fut>(&self, call: Fut) -> impl Future<Output = ()>
    where
        Fut: Future<Output = Result<ApiResponse<T>, ApiError>>,
    {
        let generation = {
            let mut slot = self.slot.lock();
            slot.generation += 1;
            slot.state.loading = true;
            slot.state.error = None;
            slot.generation
        };
        let pending = Pending {
            slot: Arc::clone(&self.slot),
            generation,
        };

        async move {
            let result = call.await;
            pending.settle(result);
        }
    }

    /// Start a fetch only if `deps` differs from the previous call.
    ///
    /// The first call always fetches. Deps of a different type than last
    /// time count as changed.
    pub fn fetch_on<D, F, Fut>(&self, deps: D, call: F) -> Option<impl Future<Output = ()>>
    where
        D: PartialEq + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ApiResponse<T>, ApiError>>,
    {
        {
            let mut slot = self.slot.lock();
            let unchanged = slot
                .deps
                .as_deref()
                .and_then(|previous| previous.downcast_ref::<D>())
                .is_some_and(|previous| *previous == deps);
            if unchanged {
                return None;
            }
            slot.deps = Some(Box::new(deps));
        }
        Some(self.fetch(call()))
    }

    /// Mark the hook as loading again.
    ///
    /// This does not re-run the call; start a new `fetch` for that.
    pub fn refetch(&self) {
        self.slot.lock().state.loading = true;
    }

    /// Drop the results of every in-flight fetch.
    pub fn unmount(&self) {
        let mut slot = self.slot.lock();
        slot.mounted = false;
        slot.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tokio::sync::oneshot;

    use super::*;

    fn ok(data: Value) -> Result<ApiResponse, ApiError> {
        Ok(ApiResponse {
            status: 200,
            headers: Vec::new(),
            data,
        })
    }

    fn pending() -> (
        oneshot::Sender<Result<ApiResponse, ApiError>>,
        impl Future<Output = Result<ApiResponse, ApiError>>,
    ) {
        let (tx, rx) = oneshot::channel();
        let call = async move {
            rx.await
                .unwrap_or_else(|_| Err(ApiError::Network("sender dropped".to_string())))
        };
        (tx, call)
    }

    fn never() -> impl Future<Output = Result<ApiResponse, ApiError>> {
        std::future::pending()
    }

    #[test]
    fn starts_loading_with_nothing() {
        let hook: UseApi = UseApi::new();
        assert_eq!(
            hook.state(),
            FetchState {
                data: None,
                loading: true,
                error: None
            }
        );
    }

    #[tokio::test]
    async fn loading_until_resolved_then_data() {
        let hook: UseApi = UseApi::new();
        let (tx, call) = pending();

        let task = tokio::spawn(hook.fetch(call));
        assert!(hook.loading());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(hook.loading());

        tx.send(ok(json!({"courses": 3}))).unwrap();
        task.await.unwrap();

        assert!(!hook.loading());
        assert_eq!(hook.data(), Some(json!({"courses": 3})));
        assert_eq!(hook.error(), None);
    }

    #[tokio::test]
    async fn failure_sets_error_and_keeps_previous_data() {
        let hook: UseApi = UseApi::new();
        hook.fetch(async { ok(json!([1])) }).await;

        let err = ApiError::Status {
            status: 500,
            body: "down".to_string(),
        };
        let failing = err.clone();
        hook.fetch(async move { Err(failing) }).await;

        let state = hook.state();
        assert!(!state.loading);
        assert_eq!(state.error, Some(err));
        assert_eq!(state.data, Some(json!([1])));
    }

    #[tokio::test]
    async fn new_fetch_clears_previous_error() {
        let hook: UseApi = UseApi::new();
        hook.fetch(async { Err(ApiError::Network("refused".to_string())) }).await;
        assert!(hook.error().is_some());

        let (tx, call) = pending();
        let task = tokio::spawn(hook.fetch(call));
        assert_eq!(hook.error(), None);
        tx.send(ok(json!(null))).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn unmount_discards_late_result() {
        let hook: UseApi = UseApi::new();
        let (tx, call) = pending();
        let task = tokio::spawn(hook.fetch(call));

        hook.unmount();
        tx.send(ok(json!("late"))).unwrap();
        task.await.unwrap();

        assert!(!hook.is_mounted());
        assert_eq!(hook.data(), None);
        assert!(hook.loading());
    }

    #[tokio::test]
    async fn superseded_fetch_cannot_overwrite_newer_result() {
        let hook: UseApi = UseApi::new();
        let (slow_tx, slow) = pending();
        let (fast_tx, fast) = pending();

        let first = tokio::spawn(hook.fetch(slow));
        let second = tokio::spawn(hook.fetch(fast));

        fast_tx.send(ok(json!("second"))).unwrap();
        second.await.unwrap();
        slow_tx.send(ok(json!("first"))).unwrap();
        first.await.unwrap();

        assert_eq!(hook.data(), Some(json!("second")));
        assert!(!hook.loading());
    }

    #[tokio::test]
    async fn fetch_on_runs_only_when_deps_change() {
        let hook: UseApi = UseApi::new();
        let calls = Arc::new(Mutex::new(0));

        for deps in ["course-1", "course-1", "course-2", "course-2"] {
            let calls = Arc::clone(&calls);
            if let Some(run) = hook.fetch_on(deps, move || async move {
                *calls.lock() += 1;
                ok(json!(deps))
            }) {
                run.await;
            }
        }

        assert_eq!(*calls.lock(), 2);
        assert_eq!(hook.data(), Some(json!("course-2")));
    }

    #[tokio::test]
    async fn refetch_only_flips_loading() {
        let hook: UseApi = UseApi::new();
        hook.fetch(async { ok(json!(1)) }).await;
        assert!(!hook.loading());

        hook.refetch();

        assert!(hook.loading());
        assert_eq!(hook.data(), Some(json!(1)));
    }

    #[tokio::test]
    async fn aborted_fetch_clears_loading() {
        let hook: UseApi = UseApi::new();
        let task = tokio::spawn(hook.fetch(never()));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(hook.loading());

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        assert!(!hook.loading());
        assert_eq!(hook.data(), None);
    }

    #[tokio::test]
    async fn fetch_dropped_before_polling_clears_loading() {
        let hook: UseApi = UseApi::new();
        let fetch = hook.fetch(never());
        assert!(hook.loading());

        drop(fetch);

        assert!(!hook.loading());
    }

    #[tokio::test]
    async fn dropping_superseded_fetch_keeps_newer_one_loading() {
        let hook: UseApi = UseApi::new();
        let stale = hook.fetch(never());
        let (tx, call) = pending();
        let current = tokio::spawn(hook.fetch(call));

        drop(stale);
        assert!(hook.loading());

        tx.send(ok(json!("fresh"))).unwrap();
        current.await.unwrap();
        assert!(!hook.loading());
        assert_eq!(hook.data(), Some(json!("fresh")));
    }

    #[tokio::test]
    async fn fetch_on_compares_deps_by_value() {
        let hook: UseApi = UseApi::new();

        assert!(hook.fetch_on(vec![1, 2], || async { ok(json!(1)) }).is_some());
        assert!(hook.fetch_on(vec![1, 2], || async { ok(json!(2)) }).is_none());
        assert!(hook.fetch_on(vec![1, 3], || async { ok(json!(3)) }).is_some());
        assert!(hook.fetch_on("other type", || async { ok(json!(4)) }).is_some());
    }
}
