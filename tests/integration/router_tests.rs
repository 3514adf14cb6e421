//! Router tests over the in-memory store

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use bookshare_server::{api, config::AppConfig, repository::Repository, AppState};

fn app() -> Router {
    app_with(AppConfig::default())
}

fn app_with(config: AppConfig) -> Router {
    api::create_router(AppState::new(config, Repository::in_memory()))
}

/// Send a request and decode the JSON body (Null when empty or not JSON)
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn register(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/register",
        None,
        Some(json!({ "username": "a", "email": email, "password": password })),
    )
    .await
}

async fn creator_token(app: &Router, email: &str) -> String {
    let (_, body) = register(app, email, "p").await;
    let token = body["token"].as_str().unwrap().to_string();
    let (status, _) = send(
        app,
        "PUT",
        "/update-user",
        Some(&token),
        Some(json!({ "email": email, "roles": ["VIEW_ALL", "CREATOR"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    token
}

fn ids(books: &Value) -> Vec<String> {
    books
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_register_login_scenario() {
    let app = app();

    let (status, body) = register(&app, "a@x.com", "p").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["user"]["roles"], json!(["VIEW_ALL"]));
    assert_eq!(body["message"], "Successfully registered");

    let (status, body) = register(&app, "a@x.com", "p").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "failed");

    let (status, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "failed");
    assert!(body.get("token").is_none());

    let (status, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "p" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "a@x.com");
    assert!(body["token"].is_string());

    let (status, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "email": "nobody@x.com", "password": "p" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No user found");
}

#[tokio::test]
async fn test_creator_book_lifecycle() {
    let app = app();
    let token = creator_token(&app, "a@x.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/books/",
        Some(&token),
        Some(json!({ "bookDetails": { "title": "Dune", "description": "Sand", "name": "Frank" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["acknowledged"], true);
    let id = body["insertedId"].as_str().unwrap().to_string();

    let (_, fresh) = send(&app, "GET", "/books?new=1", Some(&token), None).await;
    assert_eq!(ids(&fresh), vec![id.clone()]);
    let (_, old) = send(&app, "GET", "/books?old=1", Some(&token), None).await;
    assert!(ids(&old).is_empty());

    let (status, book) = send(&app, "GET", &format!("/book/?id={}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["email"], "a@x.com");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/book/{}", id),
        Some(&token),
        Some(json!({ "bookDetails": { "title": "Dune Messiah" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matchedCount"], 1);

    let (_, book) = send(&app, "GET", "/book?email=a@x.com", Some(&token), None).await;
    assert_eq!(book["title"], "Dune Messiah");
    assert_eq!(book["description"], "Sand");

    let (status, body) = send(&app, "DELETE", "/books/delete", Some(&token), Some(json!({ "id": id }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 1);

    let (status, body) = send(&app, "DELETE", "/books/delete", Some(&token), Some(json!({ "id": id }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 0);

    let (status, _) = send(&app, "GET", &format!("/book?id={}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recency_flags_partition_books() {
    let app = app();
    let token = creator_token(&app, "a@x.com").await;
    let now = Utc::now();

    let mut created = Vec::new();
    for minutes in [9, 11] {
        let (_, body) = send(
            &app,
            "POST",
            "/books",
            Some(&token),
            Some(json!({ "bookDetails": {
                "title": format!("{} minutes", minutes),
                "uploadDate": now - Duration::minutes(minutes),
            } })),
        )
        .await;
        created.push(body["insertedId"].as_str().unwrap().to_string());
    }

    let (_, fresh) = send(&app, "GET", "/books?new=1", Some(&token), None).await;
    assert_eq!(ids(&fresh), vec![created[0].clone()]);

    let (_, fresh) = send(&app, "GET", "/books?New=true", Some(&token), None).await;
    assert_eq!(ids(&fresh), vec![created[0].clone()]);

    let (_, old) = send(&app, "GET", "/books?old=1", Some(&token), None).await;
    assert_eq!(ids(&old), vec![created[1].clone()]);

    let (_, all) = send(&app, "GET", "/books", Some(&token), None).await;
    assert_eq!(ids(&all), created);

    let (_, mine) = send(&app, "GET", "/books?email=b@x.com", Some(&token), None).await;
    assert!(ids(&mine).is_empty());
}

#[tokio::test]
async fn test_update_of_unknown_id_creates_the_book() {
    let app = app();
    let token = creator_token(&app, "a@x.com").await;
    let id = uuid::Uuid::new_v4().to_string();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/book/{}", id),
        Some(&token),
        Some(json!({ "bookDetails": { "title": "Ghost" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["upsertedId"], id.as_str());

    let (_, book) = send(&app, "GET", &format!("/book?id={}", id), Some(&token), None).await;
    assert_eq!(book["title"], "Ghost");
    assert_eq!(book["description"], Value::Null);

    let (status, _) = send(
        &app,
        "PUT",
        "/book/not-a-uuid",
        Some(&token),
        Some(json!({ "bookDetails": { "title": "Ghost" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_view_all_user_cannot_create_but_can_read() {
    let app = app();
    let (_, body) = register(&app, "v@x.com", "p").await;
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/books",
        Some(&token),
        Some(json!({ "bookDetails": { "title": "Dune" } })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "You are not allowed to create books");

    let (status, books) = send(&app, "GET", "/books", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(books, json!([]));
}

#[tokio::test]
async fn test_book_lookup_needs_exactly_one_key() {
    let app = app();
    let (_, body) = register(&app, "v@x.com", "p").await;
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "GET", "/book", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/book?email=v@x.com&id={}", uuid::Uuid::new_v4());
    let (status, _) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rejected_bodies_and_queries_render_error_json() {
    let app = app();

    let (status, body) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({ "email": "a@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "failed");
    assert_eq!(body["code"], 18);
    assert_eq!(body["error"], "BadValue");
    assert!(body["message"].as_str().unwrap().contains("username"));

    let (_, body) = register(&app, "v@x.com", "p").await;
    let token = body["token"].as_str().unwrap().to_string();
    let (status, body) = send(&app, "GET", "/books?new=1&New=1", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "failed");
}

#[tokio::test]
async fn test_empty_query_values_are_ignored() {
    let app = app();
    let token = creator_token(&app, "a@x.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/books",
        Some(&token),
        Some(json!({ "bookDetails": { "description": "no title" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["insertedId"].as_str().unwrap().to_string();

    let (status, all) = send(&app, "GET", "/books?email=", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&all), vec![id.clone()]);

    let uri = format!("/book?email=&id={}", id);
    let (status, book) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["title"], Value::Null);
    assert_eq!(book["description"], "no title");
    assert_eq!(book["email"], "a@x.com");

    let (status, body) = send(&app, "GET", "/user?email=", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "failed");
}

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let app = app();
    let (status, body) = send(&app, "GET", "/books", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized access");

    let (status, _) = send(&app, "PUT", "/update-user", Some("garbage"), Some(json!({ "email": "a@x.com", "roles": ["CREATOR"] }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_check_and_add_user() {
    let app = app();

    let (status, body) = send(
        &app,
        "POST",
        "/addUser",
        None,
        Some(json!({ "email": "c@x.com", "username": "c", "role": ["VIEW_ALL", "CREATOR"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["insertedId"], "c@x.com");

    let (status, _) = send(&app, "POST", "/addUser", None, Some(json!({ "email": "c@x.com" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "GET", "/user?email=c@x.com", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["roles"], json!(["VIEW_ALL", "CREATOR"]));
    let token = body["token"].as_str().unwrap().to_string();

    // the issued token opens CREATOR-gated routes
    let (status, _) = send(
        &app,
        "POST",
        "/books",
        Some(&token),
        Some(json!({ "bookDetails": { "title": "Emma" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/user?email=nobody@x.com", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn test_strict_deletion_requires_creator() {
    let mut config = AppConfig::default();
    config.auth.require_creator_for_delete = true;
    let app = app_with(config);

    let (_, body) = register(&app, "v@x.com", "p").await;
    let token = body["token"].as_str().unwrap().to_string();
    let id = uuid::Uuid::new_v4().to_string();

    let (status, _) = send(&app, "DELETE", "/books/delete", Some(&token), Some(json!({ "id": id }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // default configuration lets any authenticated user delete
    let app = self::app();
    let (_, body) = register(&app, "v@x.com", "p").await;
    let token = body["token"].as_str().unwrap().to_string();
    let (status, body) = send(&app, "DELETE", "/books/delete", Some(&token), Some(json!({ "id": id }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 0);
}

#[tokio::test]
async fn test_health_and_root() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, "GET", "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}
