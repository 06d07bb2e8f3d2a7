use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub role: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "student".to_string()
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateCourse {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct UpdateCourse {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Default)]
pub struct Store {
    users: HashMap<u64, User>,
    passwords: HashMap<String, String>,
    courses: HashMap<Uuid, Course>,
    next_user_id: u64,
    last_login: Option<u64>,
}

pub type Db = Arc<RwLock<Store>>;

type ApiError = (StatusCode, Json<Value>);

fn error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "message": message })))
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/check", post(login))
        .route("/register", post(register))
        .route("/profile", get(profile))
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user).put(update_user))
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> Result<Json<User>, ApiError> {
    let mut store = db.write().await;
    if store.passwords.get(&input.username) != Some(&input.password) {
        return Err(error(StatusCode::UNAUTHORIZED, "invalid credentials"));
    }
    let user = store
        .users
        .values()
        .find(|u| u.username == input.username)
        .cloned()
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "invalid credentials"))?;
    store.last_login = Some(user.id);
    Ok(Json(user))
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<Registration>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let mut store = db.write().await;
    if store.passwords.contains_key(&input.username) {
        return Err(error(StatusCode::CONFLICT, "username already taken"));
    }
    store.next_user_id += 1;
    let user = User {
        id: store.next_user_id,
        username: input.username,
        role: input.role,
    };
    store.passwords.insert(user.username.clone(), input.password);
    store.users.insert(user.id, user.clone());
    Ok((StatusCode::CREATED, Json(user)))
}

async fn profile(State(db): State<Db>) -> Result<Json<User>, ApiError> {
    let store = db.read().await;
    store
        .last_login
        .and_then(|id| store.users.get(&id).cloned())
        .map(Json)
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "not logged in"))
}

async fn list_users(State(db): State<Db>) -> Json<Vec<User>> {
    let store = db.read().await;
    let mut users: Vec<User> = store.users.values().cloned().collect();
    users.sort_by_key(|u| u.id);
    Json(users)
}

async fn get_user(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<User>, ApiError> {
    let store = db.read().await;
    store
        .users
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "user not found"))
}

async fn update_user(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<User>, ApiError> {
    let mut store = db.write().await;
    let Store {
        users, passwords, ..
    } = &mut *store;
    let user = users
        .get_mut(&id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "user not found"))?;
    if let Some(username) = input.username {
        if let Some(password) = passwords.remove(&user.username) {
            passwords.insert(username.clone(), password);
        }
        user.username = username;
    }
    if let Some(role) = input.role {
        user.role = role;
    }
    Ok(Json(user.clone()))
}

async fn list_courses(State(db): State<Db>) -> Json<Vec<Course>> {
    let store = db.read().await;
    Json(store.courses.values().cloned().collect())
}

async fn create_course(
    State(db): State<Db>,
    Json(input): Json<CreateCourse>,
) -> (StatusCode, Json<Course>) {
    let course = Course {
        id: Uuid::new_v4(),
        title: input.title,
        description: input.description,
    };
    db.write().await.courses.insert(course.id, course.clone());
    (StatusCode::CREATED, Json(course))
}

async fn get_course(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Json<Course>, ApiError> {
    let store = db.read().await;
    store
        .courses
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "course not found"))
}

async fn update_course(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCourse>,
) -> Result<Json<Course>, ApiError> {
    let mut store = db.write().await;
    let course = store
        .courses
        .get_mut(&id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "course not found"))?;
    if let Some(title) = input.title {
        course.title = title;
    }
    if let Some(description) = input.description {
        course.description = description;
    }
    Ok(Json(course.clone()))
}

async fn delete_course(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut store = db.write().await;
    store
        .courses
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "course not found"))
}
