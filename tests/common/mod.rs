#![allow(dead_code)]
//! Shared helpers for router-level tests.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use std::sync::Arc;
use task_api::{AppState, db};
use tower::ServiceExt;

/// A fresh app over an in-memory database with the schema applied.
pub async fn test_app_with_page_size(page_size: u32) -> Router {
    let pool = db::connect("sqlite::memory:", 1).await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    task_api::app(AppState::new(Arc::new(pool), page_size))
}

pub async fn test_app() -> Router {
    test_app_with_page_size(10).await
}

/// Send a request and decode the JSON response body (`Null` when empty).
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

/// GET with a `Host` header, as a browser or HTTP client would send it.
pub async fn get_with_host(app: &Router, uri: &str, host: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .header(header::HOST, host)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

pub async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn patch(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PATCH, uri, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, None).await
}

/// Create a user through the API and return its id.
pub async fn create_user(app: &Router, name: &str, email: &str) -> i64 {
    let (status, body) = post(
        app,
        "/api/users/",
        serde_json::json!({ "name": name, "email": email }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

/// Create a task through the API and return its id.
pub async fn create_task(app: &Router, user_id: i64, title: &str) -> i64 {
    let (status, body) = post(
        app,
        "/api/tasks/",
        serde_json::json!({ "title": title, "user": user_id }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

/// Three tasks for `user_id`; only "Task 2" ends up completed.
pub async fn seed_tasks(app: &Router, user_id: i64) -> Vec<i64> {
    let mut ids = Vec::new();
    for title in ["Task 1", "Task 2", "Task 3"] {
        ids.push(create_task(app, user_id, title).await);
    }
    let (status, _) = send(
        app,
        Method::POST,
        &format!("/api/tasks/{}/toggle_completion/", ids[1]),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    ids
}
