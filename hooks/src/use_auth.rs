//! Auth-session hook.
//!
//! # Design
//! `UseAuth` mirrors the cached session in memory. Mounting reads the two
//! session keys once; `login` persists them after a successful call and
//! `logout` removes them. Network and storage failures are folded into an
//! `Outcome` so callers never see an `Err` from this hook.

use std::sync::Arc;

use parking_lot::Mutex;
use portal_core::{ApiError, ApiService, Session};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::outcome::Outcome;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<Session>,
    pub is_authenticated: bool,
}

/// Cloneable handle to the auth-session hook.
#[derive(Clone)]
pub struct UseAuth {
    service: ApiService,
    state: Arc<Mutex<AuthState>>,
}

impl UseAuth {
    /// Mount the hook, restoring any session cached in the service's store.
    pub fn mount(service: ApiService) -> Self {
        let state = match Session::load(service.store().as_ref()) {
            Ok(Some(user)) => {
                info!(username = %user.username, "restored cached session");
                AuthState {
                    user: Some(user),
                    is_authenticated: true,
                }
            }
            Ok(None) => AuthState::default(),
            Err(e) => {
                warn!(error = %e, "could not read cached session");
                AuthState::default()
            }
        };
        Self {
            service,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.lock().clone()
    }

    pub fn user(&self) -> Option<Session> {
        self.state.lock().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.lock().is_authenticated
    }

    /// Log in and cache the returned `username` and `role`.
    ///
    /// Nothing is written unless the call succeeds and both fields are
    /// present in the response.
    pub async fn login<C>(&self, credentials: &C) -> Outcome<Value>
    where
        C: Serialize + Sync + ?Sized,
    {
        let response = match self.service.auth().login(credentials).await {
            Ok(response) => response,
            Err(e) => return Outcome::failure(e),
        };
        let session = match session_from(&response.data) {
            Ok(session) => session,
            Err(e) => return Outcome::failure(e),
        };
        if let Err(e) = session.save(self.service.store().as_ref()) {
            warn!(error = %e, "could not cache session");
            return Outcome::failure(e);
        }

        info!(username = %session.username, role = %session.role, "logged in");
        *self.state.lock() = AuthState {
            user: Some(session),
            is_authenticated: true,
        };
        Outcome::Success {
            data: response.data,
        }
    }

    /// Register a new account. The local session is left as it is.
    pub async fn register<U>(&self, user_data: &U) -> Outcome<Value>
    where
        U: Serialize + Sync + ?Sized,
    {
        match self.service.auth().register(user_data).await {
            Ok(response) => Outcome::Success {
                data: response.data,
            },
            Err(e) => Outcome::failure(e),
        }
    }

    /// Forget the session locally and in the store.
    pub fn logout(&self) {
        if let Err(e) = self.service.auth().logout() {
            warn!(error = %e, "could not clear cached session");
        }
        *self.state.lock() = AuthState::default();
    }
}

fn session_from(data: &Value) -> Result<Session, ApiError> {
    let field = |name: &'static str| {
        data.get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ApiError::MissingField(name))
    };
    Ok(Session {
        username: field("username")?,
        role: field("role")?,
    })
}

#[cfg(test)]
mod tests {
    use portal_core::testing::{json_response, StubTransport};
    use portal_core::{ApiClient, Config, MemoryStore, SessionStore};
    use serde_json::json;

    use super::*;

    fn service(transport: StubTransport) -> (ApiService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let client = ApiClient::with_transport(&Config::default(), Arc::new(transport));
        (ApiService::new(client, store.clone()), store)
    }

    #[tokio::test]
    async fn login_persists_both_keys() {
        let (service, store) = service(StubTransport::ok(json!({"username": "alice", "role": "admin"})));
        let auth = UseAuth::mount(service);
        assert!(!auth.is_authenticated());

        let outcome = auth.login(&json!({"username": "alice", "password": "pw"})).await;

        assert_eq!(
            outcome,
            Outcome::Success {
                data: json!({"username": "alice", "role": "admin"})
            }
        );
        assert_eq!(store.get("un").unwrap().as_deref(), Some("alice"));
        assert_eq!(store.get("role").unwrap().as_deref(), Some("admin"));
        assert!(auth.is_authenticated());
        assert_eq!(auth.user(), Some(Session::new("alice", "admin")));
    }

    #[tokio::test]
    async fn rejected_login_writes_nothing() {
        let (service, store) = service(StubTransport::new(|_| {
            Ok(json_response(401, &json!({"message": "invalid credentials"})))
        }));
        let auth = UseAuth::mount(service);

        let outcome = auth.login(&json!({"username": "alice", "password": "bad"})).await;

        assert_eq!(outcome, Outcome::failure("request failed with status code 401"));
        assert!(store.is_empty());
        assert!(!auth.is_authenticated());
        assert_eq!(auth.user(), None);
    }

    #[tokio::test]
    async fn login_response_without_role_is_a_failure() {
        let (service, store) = service(StubTransport::ok(json!({"username": "alice"})));
        let auth = UseAuth::mount(service);

        let outcome = auth.login(&json!({})).await;

        assert_eq!(outcome.error(), Some("missing field `role` in response"));
        assert!(store.is_empty());
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn mount_restores_cached_session() {
        let (service, store) = service(StubTransport::ok(json!({})));
        Session::new("bob", "student").save(store.as_ref()).unwrap();

        let auth = UseAuth::mount(service);

        assert_eq!(
            auth.state(),
            AuthState {
                user: Some(Session::new("bob", "student")),
                is_authenticated: true,
            }
        );
    }

    #[test]
    fn mount_with_one_key_stays_logged_out() {
        let (service, store) = service(StubTransport::ok(json!({})));
        store.set("role", "admin").unwrap();
        assert!(!UseAuth::mount(service).is_authenticated());
    }

    #[test]
    fn logout_without_session_is_harmless() {
        let (service, store) = service(StubTransport::ok(json!({})));
        let auth = UseAuth::mount(service);

        auth.logout();

        assert!(!auth.is_authenticated());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn logout_after_login_clears_everything() {
        let (service, store) = service(StubTransport::ok(json!({"username": "alice", "role": "admin"})));
        let auth = UseAuth::mount(service);
        auth.login(&json!({})).await;

        auth.logout();

        assert_eq!(auth.state(), AuthState::default());
        assert_eq!(store.get("un").unwrap(), None);
        assert_eq!(store.get("role").unwrap(), None);
    }

    #[tokio::test]
    async fn register_does_not_touch_session() {
        let transport = StubTransport::ok(json!({"id": 9, "username": "dan", "role": "student"}));
        let (service, store) = service(transport.clone());
        let auth = UseAuth::mount(service);

        let outcome = auth.register(&json!({"username": "dan", "password": "pw"})).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.data().unwrap()["id"], 9);
        assert!(!auth.is_authenticated());
        assert!(store.is_empty());
        assert_eq!(transport.requests()[0].url, "http://localhost:8081/register");
    }
}
