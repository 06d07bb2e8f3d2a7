//! Hooks against the live mock server with an on-disk session store.

use std::sync::Arc;
use std::time::Duration;

use portal_core::{ApiClient, ApiService, Config, FileStore, NoopObserver, Session};
use portal_hooks::{Outcome, UseApi, UseAsyncOperation, UseAuth};
use serde_json::json;

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}")
}

fn service(base_url: &str, store: Arc<FileStore>) -> ApiService {
    let config = Config {
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        ..Config::default()
    };
    let client = ApiClient::new(&config).with_observer(Arc::new(NoopObserver));
    ApiService::new(client, store)
}

#[tokio::test(flavor = "multi_thread")]
async fn session_survives_remount_until_logout() {
    let base = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let service = service(&base, Arc::new(FileStore::new(&path)));

    // Step 1: register through the hook; no session yet.
    let auth = UseAuth::mount(service.clone());
    let registered = auth
        .register(&json!({"username": "alice", "password": "secret", "role": "admin"}))
        .await;
    assert!(registered.is_success());
    assert!(!auth.is_authenticated());

    // Step 2: a bad password is reported, not raised.
    let rejected = auth
        .login(&json!({"username": "alice", "password": "wrong"}))
        .await;
    assert_eq!(rejected, Outcome::failure("request failed with status code 401"));
    assert!(!path.exists());

    // Step 3: log in for real.
    let outcome = auth
        .login(&json!({"username": "alice", "password": "secret"}))
        .await;
    assert!(outcome.is_success());
    assert_eq!(auth.user(), Some(Session::new("alice", "admin")));

    // Step 4: a fresh mount reads the session back from disk.
    let remounted = UseAuth::mount(service.clone());
    assert!(remounted.is_authenticated());
    assert_eq!(remounted.user(), Some(Session::new("alice", "admin")));

    // Step 5: logout wipes it for every later mount.
    remounted.logout();
    assert!(!remounted.is_authenticated());
    assert!(!UseAuth::mount(service).is_authenticated());
}

#[tokio::test(flavor = "multi_thread")]
async fn courses_through_fetch_and_operation_hooks() {
    let base = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let service = service(&base, Arc::new(FileStore::new(dir.path().join("s.json"))));

    let create: UseAsyncOperation = UseAsyncOperation::new();
    let created = {
        let service = service.clone();
        create
            .execute(async move { service.courses().create(&json!({"title": "Rust 101"})).await })
            .await
    };
    let course = created.into_result().unwrap().data;
    assert!(!create.loading());

    let courses: UseApi = UseApi::new();
    let fetch = {
        let service = service.clone();
        courses.fetch(async move { service.courses().get_all().await })
    };
    assert!(courses.loading());
    fetch.await;

    assert!(!courses.loading());
    assert_eq!(courses.data(), Some(json!([course])));

    let missing = {
        let service = service.clone();
        courses.fetch(async move { service.courses().get_by_id("00000000-0000-0000-0000-000000000000").await })
    };
    missing.await;
    assert_eq!(courses.error().and_then(|e| e.status()), Some(404));
}
