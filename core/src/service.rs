//! Service facade over `ApiClient`.
//!
//! # Design
//! `ApiService` exposes the generic verbs plus three namespaced groups
//! (`auth`, `users`, `courses`). Every method is one call with a literal path
//! and no extra validation, pagination or reshaping; callers get the raw
//! envelope. The only method that does not touch the network is
//! `auth().logout()`, which clears the cached session keys.

use std::fmt::Display;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::client::ApiClient;
use crate::config::{Config, Endpoint};
use crate::error::{ApiError, StoreError};
use crate::http::{ApiResponse, HttpMethod, RequestOptions};
use crate::session::{Session, SessionStore};

type ApiResult = Result<ApiResponse, ApiError>;

#[derive(Clone)]
pub struct ApiService {
    client: ApiClient,
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for ApiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiService")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl ApiService {
    pub fn new(client: ApiClient, store: Arc<dyn SessionStore>) -> Self {
        Self { client, store }
    }

    /// Networked service using the default transport and observer.
    pub fn from_config(config: &Config, store: Arc<dyn SessionStore>) -> Self {
        Self::new(ApiClient::new(config), store)
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub async fn get(&self, path: &str) -> ApiResult {
        self.get_with(path, &RequestOptions::default()).await
    }

    pub async fn get_with(&self, path: &str, options: &RequestOptions) -> ApiResult {
        self.client
            .request::<()>(HttpMethod::Get, path, None, options)
            .await
    }

    pub async fn post<B: Serialize + Sync + ?Sized>(&self, path: &str, body: &B) -> ApiResult {
        self.post_with(path, body, &RequestOptions::default()).await
    }

    pub async fn post_with<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> ApiResult {
        self.client
            .request(HttpMethod::Post, path, Some(body), options)
            .await
    }

    pub async fn put<B: Serialize + Sync + ?Sized>(&self, path: &str, body: &B) -> ApiResult {
        self.put_with(path, body, &RequestOptions::default()).await
    }

    pub async fn put_with<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> ApiResult {
        self.client
            .request(HttpMethod::Put, path, Some(body), options)
            .await
    }

    pub async fn patch<B: Serialize + Sync + ?Sized>(&self, path: &str, body: &B) -> ApiResult {
        self.patch_with(path, body, &RequestOptions::default()).await
    }

    pub async fn patch_with<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> ApiResult {
        self.client
            .request(HttpMethod::Patch, path, Some(body), options)
            .await
    }

    pub async fn delete(&self, path: &str) -> ApiResult {
        self.delete_with(path, &RequestOptions::default()).await
    }

    pub async fn delete_with(&self, path: &str, options: &RequestOptions) -> ApiResult {
        self.client
            .request::<()>(HttpMethod::Delete, path, None, options)
            .await
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { service: self }
    }

    pub fn users(&self) -> UsersApi<'_> {
        UsersApi { service: self }
    }

    pub fn courses(&self) -> CoursesApi<'_> {
        CoursesApi { service: self }
    }

    /// `GET /profile`
    pub async fn profile(&self) -> ApiResult {
        self.get(Endpoint::Profile.path()).await
    }
}

/// Authentication calls.
#[derive(Debug, Clone, Copy)]
pub struct AuthApi<'a> {
    service: &'a ApiService,
}

impl AuthApi<'_> {
    /// `POST /check`
    pub async fn login<C: Serialize + Sync + ?Sized>(&self, credentials: &C) -> ApiResult {
        self.service.post(Endpoint::Login.path(), credentials).await
    }

    /// `POST /register`
    pub async fn register<U: Serialize + Sync + ?Sized>(&self, user_data: &U) -> ApiResult {
        self.service.post(Endpoint::Register.path(), user_data).await
    }

    /// Forget the cached session. No network call.
    pub fn logout(&self) -> Result<(), StoreError> {
        Session::clear(self.service.store.as_ref())?;
        info!("session cleared");
        Ok(())
    }
}

/// User management calls.
#[derive(Debug, Clone, Copy)]
pub struct UsersApi<'a> {
    service: &'a ApiService,
}

impl UsersApi<'_> {
    /// `GET /users/{id}`
    pub async fn get_profile(&self, user_id: impl Display) -> ApiResult {
        self.service
            .get(&format!("{}/{user_id}", Endpoint::Users.path()))
            .await
    }

    /// `PUT /users/{id}`
    pub async fn update_profile<B: Serialize + Sync + ?Sized>(
        &self,
        user_id: impl Display,
        data: &B,
    ) -> ApiResult {
        self.service
            .put(&format!("{}/{user_id}", Endpoint::Users.path()), data)
            .await
    }

    /// `GET /users`
    pub async fn get_all_users(&self) -> ApiResult {
        self.service.get(Endpoint::Users.path()).await
    }
}

/// Course management calls.
#[derive(Debug, Clone, Copy)]
pub struct CoursesApi<'a> {
    service: &'a ApiService,
}

impl CoursesApi<'_> {
    /// `GET /courses`
    pub async fn get_all(&self) -> ApiResult {
        self.service.get(Endpoint::Courses.path()).await
    }

    /// `GET /courses/{id}`
    pub async fn get_by_id(&self, course_id: impl Display) -> ApiResult {
        self.service.get(&course_path(course_id)).await
    }

    /// `POST /courses`
    pub async fn create<B: Serialize + Sync + ?Sized>(&self, course: &B) -> ApiResult {
        self.service.post(Endpoint::Courses.path(), course).await
    }

    /// `PUT /courses/{id}`
    pub async fn update<B: Serialize + Sync + ?Sized>(
        &self,
        course_id: impl Display,
        course: &B,
    ) -> ApiResult {
        self.service.put(&course_path(course_id), course).await
    }

    /// `DELETE /courses/{id}`
    pub async fn delete(&self, course_id: impl Display) -> ApiResult {
        self.service.delete(&course_path(course_id)).await
    }
}

fn course_path(course_id: impl Display) -> String {
    format!("{}/{course_id}", Endpoint::Courses.path())
}
