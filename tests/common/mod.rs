#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

use teamflow_backend::api::{create_router, AppState};
use teamflow_backend::config::Config;
use teamflow_backend::infrastructure::db;

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub uploads: TempDir,
}

pub async fn setup_test_db() -> SqlitePool {
    db::init_memory_db()
        .await
        .expect("Failed to create test database")
}

pub async fn setup_test_app() -> TestApp {
    let pool = setup_test_db().await;
    let uploads = tempfile::tempdir().expect("Failed to create upload dir");

    let config = Arc::new(Config {
        database_url: "sqlite::memory:".to_string(),
        cors_origin: "http://localhost:3000".to_string(),
        upload_dir: uploads.path().to_string_lossy().to_string(),
        resend_api_key: None,
        ..Config::default()
    });

    let (events_tx, _) = tokio::sync::broadcast::channel(100);
    let state = AppState::new(
        Some(pool.clone()),
        events_tx,
        reqwest::Client::new(),
        Arc::clone(&config),
    );

    TestApp {
        app: create_router(state, &config),
        pool,
        uploads,
    }
}

pub async fn make_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<String>,
    token: Option<&str>,
) -> (StatusCode, String) {
    let mut request = Request::builder().uri(uri).method(method);

    if body.is_some() {
        request = request.header("content-type", "application/json");
    }
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {}", token));
    }

    let request = request
        .body(Body::from(body.unwrap_or_default()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8(body.to_vec()).unwrap();

    (status, body_str)
}

pub async fn json_request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: &str,
) -> (StatusCode, Value) {
    let (status, body) = make_request(
        app.clone(),
        method,
        uri,
        body.map(|b| b.to_string()),
        Some(token),
    )
    .await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).unwrap_or(Value::String(body))
    };
    (status, value)
}

/// Registers a user and returns the access token from the `access_token`
/// cookie.
pub async fn register_user(app: &Router, email: &str, name: &str) -> String {
    let body = json!({ "email": email, "password": "password123", "name": name }).to_string();
    let request = Request::builder()
        .uri("/api/auth/register")
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|cookie| cookie.strip_prefix("access_token="))
        .and_then(|rest| rest.split(';').next())
        .map(str::to_string)
        .expect("register response sets access_token cookie")
}

pub async fn create_organization(app: &Router, token: &str, name: &str) -> String {
    let (status, org) = json_request(
        app,
        "POST",
        "/api/organizations",
        Some(json!({ "name": name })),
        token,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{org}");
    org["slug"].as_str().unwrap().to_string()
}

pub async fn create_board(app: &Router, token: &str, slug: &str, title: &str) -> String {
    let (status, board) = json_request(
        app,
        "POST",
        "/api/boards",
        Some(json!({ "title": title, "organizationSlug": slug })),
        token,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{board}");
    board["id"].as_str().unwrap().to_string()
}

pub async fn get_board(app: &Router, token: &str, board_id: &str) -> Value {
    let (status, view) = json_request(app, "GET", &format!("/api/boards/{}", board_id), None, token).await;
    assert_eq!(status, StatusCode::OK, "{view}");
    view
}

pub async fn create_card(app: &Router, token: &str, list_id: &str, title: &str) -> Value {
    let (status, card) = json_request(
        app,
        "POST",
        &format!("/api/lists/{}/cards", list_id),
        Some(json!({ "title": title })),
        token,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{card}");
    card
}

/// Id of the list with the given title in a board view.
pub fn list_id(view: &Value, title: &str) -> String {
    view["lists"]
        .as_array()
        .unwrap()
        .iter()
        .find(|list| list["title"] == title)
        .and_then(|list| list["id"].as_str())
        .unwrap()
        .to_string()
}

/// Card titles and orders of a list in a board view, in display order.
pub fn cards_of(view: &Value, title: &str) -> Vec<(String, i64)> {
    view["lists"]
        .as_array()
        .unwrap()
        .iter()
        .find(|list| list["title"] == title)
        .unwrap()["cards"]
        .as_array()
        .unwrap()
        .iter()
        .map(|card| {
            (
                card["title"].as_str().unwrap().to_string(),
                card["order"].as_i64().unwrap(),
            )
        })
        .collect()
}
