mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{app, create_poll, option_id, send, sign_up};

#[tokio::test]
async fn root_reports_status() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_returns_public_fields_only() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "username": "ann", "email": "ann@example.com", "password": "hunter2hunter2" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "ann");
    assert_eq!(body["email"], "ann@example.com");
    assert!(body["id"].is_i64());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = app();
    sign_up(&app, "ann").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "username": "other", "email": "ann@example.com", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CONFLICT");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = app();
    sign_up(&app, "ann").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ann@example.com", "password": "not-the-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = app();
    let body = json!({ "title": "Lunch", "description": "", "options": ["a", "b"] });

    let (status, _) = send(&app, Method::POST, "/api/polls", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::POST, "/api/polls", Some("garbage"), Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_then_fetch_poll() {
    let app = app();
    let (ann, token) = sign_up(&app, "ann").await;

    let poll = create_poll(&app, &token, &["Pizza", "", "Tacos"]).await;
    assert_eq!(poll["created_by"], ann);
    assert_eq!(poll["options"].as_array().unwrap().len(), 2);
    assert_eq!(poll["options"][0]["text"], "Pizza");
    assert_eq!(poll["options"][0]["order"], 0);
    assert_eq!(poll["options"][1]["text"], "Tacos");
    assert_eq!(poll["options"][1]["order"], 1);

    let uri = format!("/api/polls/{}", poll["id"]);
    let (status, fetched) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Lunch");
    assert_eq!(fetched["options"][1]["vote_count"], 0);

    let (status, polls) = send(&app, Method::GET, "/api/polls", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(polls.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn too_few_options_is_bad_request() {
    let app = app();
    let (_, token) = sign_up(&app, "ann").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/polls",
        Some(token.as_str()),
        Some(json!({ "title": "Lunch", "description": "", "options": ["Pizza", ""] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let app = app();
    let (_, token) = sign_up(&app, "ann").await;

    let (status, _) = send(&app, Method::GET, "/api/polls/not-a-number", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/polls",
        Some(token.as_str()),
        Some(json!({ "title": "Lunch" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_poll_is_not_found() {
    let app = app();
    let (status, _) = send(&app, Method::GET, "/api/polls/4040", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn voting_returns_counts_for_every_option() {
    let app = app();
    let (_, ann) = sign_up(&app, "ann").await;
    let (_, bob) = sign_up(&app, "bob").await;
    let poll = create_poll(&app, &ann, &["Pizza", "Tacos", "Sushi"]).await;
    let uri = format!("/api/polls/{}/vote", poll["id"]);
    let (pizza, tacos, sushi) = (option_id(&poll, 0), option_id(&poll, 1), option_id(&poll, 2));

    send(&app, Method::POST, &uri, Some(ann.as_str()), Some(json!({ "poll_option_id": pizza }))).await;
    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(bob.as_str()),
        Some(json!({ "poll_option_id": pizza })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vote_counts"][pizza.to_string()], 2);

    // ann switches to tacos; the old vote moves rather than duplicating
    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(ann.as_str()),
        Some(json!({ "poll_option_id": tacos })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let counts = body["vote_counts"].as_object().unwrap();
    assert_eq!(counts.len(), 3);
    assert_eq!(counts[&pizza.to_string()], 1);
    assert_eq!(counts[&tacos.to_string()], 1);
    assert_eq!(counts[&sushi.to_string()], 0);
}

#[tokio::test]
async fn voting_with_another_polls_option_is_not_found() {
    let app = app();
    let (_, ann) = sign_up(&app, "ann").await;
    let lunch = create_poll(&app, &ann, &["Pizza", "Tacos"]).await;
    let dinner = create_poll(&app, &ann, &["Soup", "Salad"]).await;

    let uri = format!("/api/polls/{}/vote", lunch["id"]);
    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        Some(ann.as_str()),
        Some(json!({ "poll_option_id": option_id(&dinner, 0) })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, fetched) = send(&app, Method::GET, &format!("/api/polls/{}", dinner["id"]), None, None).await;
    assert_eq!(fetched["options"][0]["vote_count"], 0);
}

#[tokio::test]
async fn only_the_creator_can_update_or_delete() {
    let app = app();
    let (_, ann) = sign_up(&app, "ann").await;
    let (_, bob) = sign_up(&app, "bob").await;
    let poll = create_poll(&app, &ann, &["Pizza", "Tacos"]).await;
    let uri = format!("/api/polls/{}", poll["id"]);
    let edit = json!({ "title": "Dinner", "description": "Changed" });

    let (status, _) = send(&app, Method::PUT, &uri, Some(bob.as_str()), Some(edit.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = send(&app, Method::PUT, &uri, Some(ann.as_str()), Some(edit)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Dinner");
    assert_eq!(updated["description"], "Changed");
    assert_eq!(updated["options"].as_array().unwrap().len(), 2);

    let (status, body) = send(&app, Method::DELETE, &uri, Some(ann.as_str()), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/polls/4040",
        Some(ann.as_str()),
        Some(json!({ "title": "x", "description": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_votes_by_one_user_count_once() {
    let app = app();
    let (_, ann) = sign_up(&app, "ann").await;
    let poll = create_poll(&app, &ann, &["Pizza", "Tacos"]).await;
    let uri = format!("/api/polls/{}/vote", poll["id"]);

    let first = send(
        &app,
        Method::POST,
        &uri,
        Some(ann.as_str()),
        Some(json!({ "poll_option_id": option_id(&poll, 0) })),
    );
    let second = send(
        &app,
        Method::POST,
        &uri,
        Some(ann.as_str()),
        Some(json!({ "poll_option_id": option_id(&poll, 1) })),
    );
    let ((s1, _), (s2, _)) = tokio::join!(first, second);
    assert_eq!(s1, StatusCode::OK);
    assert_eq!(s2, StatusCode::OK);

    let (_, fetched) = send(&app, Method::GET, &format!("/api/polls/{}", poll["id"]), None, None).await;
    let total: i64 = fetched["options"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["vote_count"].as_i64().unwrap())
        .sum();
    assert_eq!(total, 1);
}
