//! Helpers for driving the router in-process
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use poll_backend::{routes, session::SessionIssuer, state::AppState, store::MemoryStore};

pub fn app() -> Router {
    let sessions = SessionIssuer::new("integration-secret", chrono::Duration::hours(24));
    let state = AppState::new(Arc::new(MemoryStore::new()), sessions);
    routes::create_routes(state, None)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Register a user and log in, returning `(user_id, token)`.
pub async fn sign_up(app: &Router, name: &str) -> (i64, String) {
    let (status, user) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": name,
            "email": format!("{name}@example.com"),
            "password": "hunter2hunter2",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{user}");

    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": format!("{name}@example.com"), "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    (
        user["id"].as_i64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}

/// Create a poll and return its JSON view.
pub async fn create_poll(app: &Router, token: &str, options: &[&str]) -> Value {
    let (status, poll) = send(
        app,
        Method::POST,
        "/api/polls",
        Some(token),
        Some(json!({ "title": "Lunch", "description": "Where to?", "options": options })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{poll}");
    poll
}

pub fn option_id(poll: &Value, index: usize) -> i64 {
    poll["options"][index]["id"].as_i64().unwrap()
}
