//! Shared helpers for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query},
    http::{Request, Response, StatusCode},
    response::IntoResponse,
    routing::get,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tsundoku::config::Config;
use tsundoku::services::{EmailError, Mailer, Signup};
use tsundoku::state::SharedState;

/// Mailer that keeps every token it was asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    pub verifications: Mutex<Vec<(String, String)>>,
    pub resets: Mutex<Vec<(String, String)>>,
    /// When set, every send is rejected by the "provider".
    pub offline: AtomicBool,
}

impl RecordingMailer {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), EmailError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(EmailError::Rejected {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            });
        }
        Ok(())
    }

    pub fn last_verification(&self) -> Option<String> {
        self.verifications
            .lock()
            .unwrap()
            .last()
            .map(|(_, token)| token.clone())
    }

    pub fn last_reset(&self) -> Option<String> {
        self.resets
            .lock()
            .unwrap()
            .last()
            .map(|(_, token)| token.clone())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_verification(&self, email: &str, token: &str) -> Result<(), EmailError> {
        self.check_online()?;
        self.verifications
            .lock()
            .unwrap()
            .push((email.to_string(), token.to_string()));
        Ok(())
    }

    async fn send_password_reset(&self, email: &str, token: &str) -> Result<(), EmailError> {
        self.check_online()?;
        self.resets
            .lock()
            .unwrap()
            .push((email.to_string(), token.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<SharedState>,
    pub mailer: Arc<RecordingMailer>,
    db_path: Option<PathBuf>,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let Some(path) = &self.db_path else {
            return;
        };
        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

/// File behind a `sqlite:` url, if it is not an in-memory database.
fn database_file(db_url: &str) -> Option<PathBuf> {
    if db_url.contains(":memory:") {
        return None;
    }
    let path = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
    let path = path.split('?').next().unwrap_or(path);
    Some(PathBuf::from(path))
}

pub fn test_config(jikan_url: &str) -> Config {
    let db_path =
        std::env::temp_dir().join(format!("tsundoku-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.server.secure_cookies = false;
    config.jikan.base_url = jikan_url.to_string();
    config.jikan.request_timeout_seconds = 5;
    config.observability.metrics_enabled = false;
    config
}

/// App whose catalog points at a closed port; catalog calls fail fast.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_config(test_config("http://127.0.0.1:9")).await
}

pub async fn spawn_app_with_config(config: Config) -> TestApp {
    let db_path = database_file(&config.general.database_path);
    let mailer = Arc::new(RecordingMailer::default());

    let state = Arc::new(
        SharedState::with_mailer(config, mailer.clone())
            .await
            .expect("failed to create state"),
    );

    let app_state = tsundoku::api::create_app_state(state.clone(), None);
    let router = tsundoku::api::router(app_state);

    TestApp {
        router,
        state,
        mailer,
        db_path,
    }
}

impl TestApp {
    pub fn db_path(&self) -> Option<&std::path::Path> {
        self.db_path.as_deref()
    }

    /// Creates a verified account and returns its API key.
    pub async fn create_user(&self, email: &str) -> String {
        self.state
            .auth_service
            .create_verified_user(Signup {
                name: "Tester".to_string(),
                email: email.to_string(),
                password: "correct horse battery".to_string(),
            })
            .await
            .expect("failed to create user")
            .api_key
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, api_key: &str) -> (StatusCode, Value) {
        let response = self
            .send(
                Request::builder()
                    .uri(uri)
                    .header("X-Api-Key", api_key)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        read_json(response).await
    }

    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        api_key: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(key) = api_key {
            builder = builder.header("X-Api-Key", key);
        }

        let response = self
            .send(builder.body(Body::from(body.to_string())).unwrap())
            .await;
        read_json(response).await
    }

    pub async fn delete(&self, uri: &str, api_key: &str) -> (StatusCode, Value) {
        let response = self
            .send(
                Request::builder()
                    .method("DELETE")
                    .uri(uri)
                    .header("X-Api-Key", api_key)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        read_json(response).await
    }
}

pub async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

// ============================================================================
// Jikan stand-in
// ============================================================================

pub fn anime_json(id: i32, title: &str, episodes: Option<i32>, score: Option<f64>) -> Value {
    json!({
        "mal_id": id,
        "title": title,
        "episodes": episodes,
        "score": score,
        "images": {
            "jpg": { "large_image_url": format!("https://cdn.test/anime/{id}.jpg") },
            "webp": { "large_image_url": format!("https://cdn.test/anime/{id}.webp") }
        }
    })
}

pub fn manga_json(id: i32, title: &str, chapters: Option<i32>, volumes: Option<i32>) -> Value {
    json!({
        "mal_id": id,
        "title": title,
        "chapters": chapters,
        "volumes": volumes,
        "score": 8.5,
        "images": {
            "jpg": { "large_image_url": format!("https://cdn.test/manga/{id}.jpg") }
        }
    })
}

fn page(items: Vec<Value>) -> Json<Value> {
    Json(json!({
        "data": items,
        "pagination": { "last_visible_page": 1, "has_next_page": false }
    }))
}

/// Anime ids with a fixed meaning in the stand-in: 404 is missing, 500 errors.
pub const MISSING_ID: i32 = 404;
pub const BROKEN_ID: i32 = 500;

async fn anime_by_id(Path(id): Path<i32>) -> impl IntoResponse {
    match id {
        MISSING_ID => StatusCode::NOT_FOUND.into_response(),
        BROKEN_ID => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => Json(json!({ "data": anime_json(id, &format!("Anime {id}"), Some(12), Some(8.0)) }))
            .into_response(),
    }
}

async fn manga_by_id(Path(id): Path<i32>) -> impl IntoResponse {
    match id {
        MISSING_ID => StatusCode::NOT_FOUND.into_response(),
        BROKEN_ID => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => Json(json!({ "data": manga_json(id, &format!("Manga {id}"), Some(100), Some(10)) }))
            .into_response(),
    }
}

async fn search_anime(Query(query): Query<HashMap<String, String>>) -> impl IntoResponse {
    if query.get("q").map(String::as_str) == Some("explode") {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    page(vec![
        anime_json(1, "Cowboy Bebop", Some(26), Some(8.75)),
        anime_json(5, "Cowboy Bebop: The Movie", Some(1), Some(8.38)),
        anime_json(1, "Cowboy Bebop", Some(26), Some(8.75)),
        anime_json(6, "Trigun", Some(26), Some(8.22)),
    ])
    .into_response()
}

async fn search_manga() -> impl IntoResponse {
    page(vec![
        manga_json(2, "Berserk", None, None),
        manga_json(13, "One Piece", None, None),
    ])
}

async fn top_anime() -> impl IntoResponse {
    page(vec![
        anime_json(52991, "Sousou no Frieren", Some(28), Some(9.3)),
        anime_json(5114, "Fullmetal Alchemist: Brotherhood", Some(64), Some(9.1)),
        anime_json(52991, "Sousou no Frieren", Some(28), Some(9.3)),
    ])
}

async fn top_manga() -> impl IntoResponse {
    page(vec![manga_json(2, "Berserk", None, None)])
}

async fn season_now() -> impl IntoResponse {
    page(vec![
        anime_json(10, "Unscored", Some(12), None),
        anime_json(11, "Seven", Some(12), Some(7.0)),
        anime_json(12, "Nine", Some(12), Some(9.0)),
        anime_json(13, "Eight", Some(12), Some(8.0)),
        anime_json(14, "Six", Some(12), Some(6.0)),
        anime_json(15, "Eight Too", Some(12), Some(8.0)),
        anime_json(16, "Five", Some(12), Some(5.0)),
        anime_json(12, "Nine", Some(12), Some(9.0)),
    ])
}

async fn anime_genres() -> impl IntoResponse {
    page(vec![
        json!({ "mal_id": 1, "name": "Action", "count": 5000 }),
        json!({ "mal_id": 2, "name": "Adventure", "count": 4000 }),
    ])
}

/// Starts the stand-in on a random port and returns its base URL.
pub async fn spawn_jikan_stub() -> String {
    let app = Router::new()
        .route("/anime", get(search_anime))
        .route("/anime/{id}", get(anime_by_id))
        .route("/manga", get(search_manga))
        .route("/manga/{id}", get(manga_by_id))
        .route("/top/anime", get(top_anime))
        .route("/top/manga", get(top_manga))
        .route("/seasons/now", get(season_now))
        .route("/genres/anime", get(anime_genres));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}
