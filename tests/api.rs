//! API integration tests
//!
//! Each test builds a fresh router over an empty in-memory store (with the
//! default admin seeded) and drives it with in-process requests.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use biblio_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

const ADMIN_EMAIL: &str = "admin@biblio.com";
const ADMIN_PASSWORD: &str = "admin123";

async fn test_app() -> Router {
    let config = AppConfig::default();
    let repository = Repository::in_memory();
    let services = Services::new(repository, config.auth.clone());
    services
        .users
        .seed_admin(&config.admin)
        .await
        .expect("Failed to seed admin");

    api::create_router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

async fn send(
    app: &Router,
    method: Method,
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

    let response = app.clone().oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response was not JSON")
    };
    (status, value)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().expect("no token").to_string()
}

async fn admin_token(app: &Router) -> String {
    login(app, ADMIN_EMAIL, ADMIN_PASSWORD).await
}

/// Register a user and return (id, token)
async fn register_and_login(app: &Router, name: &str, email: &str) -> (String, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/users",
        None,
        Some(json!({ "name": name, "email": email, "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
    let id = body["id"].as_str().expect("no user id").to_string();
    let token = login(app, email, "secret123").await;
    (id, token)
}

/// Create a book as admin and return its id
async fn create_book(app: &Router, token: &str, title: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/books",
        Some(token),
        Some(json!({
            "title": title,
            "author": "Author",
            "genre": "Fiction",
            "publisher": "Publisher",
            "publish_date": "2001-06-15"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "book creation failed: {}", body);
    body["id"].as_str().expect("no book id").to_string()
}

async fn book_available(app: &Router, book_id: &str) -> bool {
    let (status, body) = send(
        app,
        Method::GET,
        &format!("/books/{}?include_inactive=true", book_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["available"].as_bool().expect("no available flag")
}

#[tokio::test]
async fn health_check_is_public() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn unknown_endpoint_answers_404_with_error_body() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": ADMIN_EMAIL, "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn missing_or_garbage_token_is_unauthorized() {
    let app = test_app().await;
    let admin = admin_token(&app).await;
    let book_id = create_book(&app, &admin, "Dune").await;

    let uri = format!("/reservations/books/{}/reserve", book_id);
    let (status, _) = send(&app, Method::POST, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::POST, &uri, Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_email_rejected_and_first_registration_unaffected() {
    let app = test_app().await;
    let (_, _) = register_and_login(&app, "Alice", "alice@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/users",
        None,
        Some(json!({ "name": "Impostor", "email": "alice@example.com", "password": "other" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    // First account still works
    login(&app, "alice@example.com", "secret123").await;
}

#[tokio::test]
async fn registration_requires_all_fields() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/users",
        None,
        Some(json!({ "name": "Alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn reserve_flips_availability_and_return_restores_it() {
    let app = test_app().await;
    let admin = admin_token(&app).await;
    let book_id = create_book(&app, &admin, "Dune").await;
    let (_, alice) = register_and_login(&app, "Alice", "alice@example.com").await;

    assert!(book_available(&app, &book_id).await);

    let (status, reservation) = send(
        &app,
        Method::POST,
        &format!("/reservations/books/{}/reserve", book_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(reservation["returned_at"].is_null());
    assert!(!book_available(&app, &book_id).await);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/reservations/books/{}/return", book_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "returned");
    assert!(body["reservation"]["returned_at"].is_string());
    assert!(book_available(&app, &book_id).await);
}

#[tokio::test]
async fn second_reserve_conflicts_without_changing_state() {
    let app = test_app().await;
    let admin = admin_token(&app).await;
    let book_id = create_book(&app, &admin, "Dune").await;
    let (_, alice) = register_and_login(&app, "Alice", "alice@example.com").await;
    let (_, bob) = register_and_login(&app, "Bob", "bob@example.com").await;

    let uri = format!("/reservations/books/{}/reserve", book_id);
    let (status, _) = send(&app, Method::POST, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::POST, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(!book_available(&app, &book_id).await);

    // Only the first reservation exists
    let (status, history) = send(
        &app,
        Method::GET,
        &format!("/reservations/books/{}", book_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["user_name"], "Alice");
}

#[tokio::test]
async fn return_without_matching_open_reservation_is_rejected() {
    let app = test_app().await;
    let admin = admin_token(&app).await;
    let book_id = create_book(&app, &admin, "Dune").await;
    let (_, alice) = register_and_login(&app, "Alice", "alice@example.com").await;
    let (_, bob) = register_and_login(&app, "Bob", "bob@example.com").await;

    // Nothing reserved yet
    let uri = format!("/reservations/books/{}/return", book_id);
    let (status, _) = send(&app, Method::POST, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(book_available(&app, &book_id).await);

    // Reserved by Alice, returned by Bob
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/reservations/books/{}/reserve", book_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, Method::POST, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!book_available(&app, &book_id).await);
}

#[tokio::test]
async fn rereserving_after_return_creates_distinct_history() {
    let app = test_app().await;
    let admin = admin_token(&app).await;
    let book_id = create_book(&app, &admin, "Dune").await;
    let (_, alice) = register_and_login(&app, "Alice", "alice@example.com").await;

    let reserve_uri = format!("/reservations/books/{}/reserve", book_id);
    let return_uri = format!("/reservations/books/{}/return", book_id);

    let (_, first) = send(&app, Method::POST, &reserve_uri, Some(&alice), None).await;
    send(&app, Method::POST, &return_uri, Some(&alice), None).await;
    let (status, second) = send(&app, Method::POST, &reserve_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(first["id"], second["id"]);

    let (_, history) = send(
        &app,
        Method::GET,
        &format!("/reservations/books/{}", book_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(history.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn reservation_history_is_permission_gated() {
    let app = test_app().await;
    let (alice_id, alice) = register_and_login(&app, "Alice", "alice@example.com").await;
    let (_, bob) = register_and_login(&app, "Bob", "bob@example.com").await;

    // Own history works without any capability
    let uri = format!("/reservations/users/{}", alice_id);
    let (status, body) = send(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    // Another user without read-users is forbidden
    let (status, _) = send(&app, Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The admin holds read-users
    let admin = admin_token(&app).await;
    let (status, _) = send(&app, Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deactivated_user_keeps_reservation_history() {
    let app = test_app().await;
    let admin = admin_token(&app).await;
    let book_id = create_book(&app, &admin, "Dune").await;
    let (alice_id, alice) = register_and_login(&app, "Alice", "alice@example.com").await;

    send(
        &app,
        Method::POST,
        &format!("/reservations/books/{}/reserve", book_id),
        Some(&alice),
        None,
    )
    .await;

    // Alice deactivates her own account
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/users/{}", alice_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Her token no longer passes the gate
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/users/{}", alice_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // History survives with her stored name
    let (status, history) = send(
        &app,
        Method::GET,
        &format!("/reservations/books/{}", book_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["user_name"], "Alice");

    let (status, history) = send(
        &app,
        Method::GET,
        &format!("/reservations/users/{}", alice_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history[0]["book_title"], "Dune");
}

#[tokio::test]
async fn deactivated_book_is_gone_for_reserve_but_kept_in_history() {
    let app = test_app().await;
    let admin = admin_token(&app).await;
    let book_id = create_book(&app, &admin, "Dune").await;
    let (alice_id, alice) = register_and_login(&app, "Alice", "alice@example.com").await;

    send(
        &app,
        Method::POST,
        &format!("/reservations/books/{}/reserve", book_id),
        Some(&alice),
        None,
    )
    .await;

    // Soft delete is allowed even while reserved
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/books/{}", book_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The active-only view no longer resolves it, the opt-in does
    let (status, _) = send(&app, Method::GET, &format!("/books/{}", book_id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/books/{}?include_inactive=true", book_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Reserving or returning it now fails with 404
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/reservations/books/{}/reserve", book_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // History still joins the stored title
    let (_, history) = send(
        &app,
        Method::GET,
        &format!("/reservations/users/{}", alice_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(history[0]["book_title"], "Dune");
}

#[tokio::test]
async fn book_listing_paginates_id_title_projections() {
    let app = test_app().await;
    let admin = admin_token(&app).await;
    create_book(&app, &admin, "Book One").await;
    create_book(&app, &admin, "Book Two").await;
    create_book(&app, &admin, "Book Three").await;

    let (status, body) = send(&app, Method::GET, "/books?page_size=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    // id + title only
    assert_eq!(data[0].as_object().unwrap().len(), 2);
    assert!(data[0]["id"].is_string());
    assert!(data[0]["title"].is_string());
    assert_eq!(body["pagination"]["total_pages"], 2);
    assert_eq!(body["pagination"]["total_items"], 3);

    let (_, body) = send(&app, Method::GET, "/books?page_size=2&page=2", None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn book_listing_tolerates_malformed_pagination() {
    let app = test_app().await;
    let admin = admin_token(&app).await;
    create_book(&app, &admin, "Book One").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/books?page=abc&page_size=zero&available=maybe",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["page_size"], 10);
    assert_eq!(body["pagination"]["total_items"], 1);
}

#[tokio::test]
async fn book_listing_filters_by_title_and_availability() {
    let app = test_app().await;
    let admin = admin_token(&app).await;
    let dune = create_book(&app, &admin, "Dune").await;
    create_book(&app, &admin, "Dune Messiah").await;
    create_book(&app, &admin, "Foundation").await;
    let (_, alice) = register_and_login(&app, "Alice", "alice@example.com").await;

    let (_, body) = send(&app, Method::GET, "/books?title=Dune", None, None).await;
    assert_eq!(body["pagination"]["total_items"], 2);

    send(
        &app,
        Method::POST,
        &format!("/reservations/books/{}/reserve", dune),
        Some(&alice),
        None,
    )
    .await;

    let (_, body) = send(&app, Method::GET, "/books?title=Dune&available=true", None, None).await;
    assert_eq!(body["pagination"]["total_items"], 1);
    assert_eq!(body["data"][0]["title"], "Dune Messiah");
}

#[tokio::test]
async fn book_crud_is_capability_gated() {
    let app = test_app().await;
    let (_, alice) = register_and_login(&app, "Alice", "alice@example.com").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/books",
        Some(&alice),
        Some(json!({
            "title": "Dune",
            "author": "Frank Herbert",
            "genre": "Sci-Fi",
            "publisher": "Chilton",
            "publish_date": "1965-08-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = admin_token(&app).await;
    let book_id = create_book(&app, &admin, "Dune").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/books/{}", book_id),
        Some(&alice),
        Some(json!({ "title": "New Title" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/books/{}", book_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn book_update_patches_only_provided_fields() {
    let app = test_app().await;
    let admin = admin_token(&app).await;
    let book_id = create_book(&app, &admin, "Dune").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/books/{}", book_id),
        Some(&admin),
        Some(json!({ "title": "Dune (Revised)" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Dune (Revised)");
    assert_eq!(body["author"], "Author");
    assert_eq!(body["publisher"], "Publisher");
}

#[tokio::test]
async fn user_reads_and_updates_are_permission_gated() {
    let app = test_app().await;
    let (alice_id, alice) = register_and_login(&app, "Alice", "alice@example.com").await;
    let (_, bob) = register_and_login(&app, "Bob", "bob@example.com").await;

    // Self read is capability-free
    let uri = format!("/users/{}", alice_id);
    let (status, body) = send(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");
    assert!(body.get("password_hash").is_none());

    // Cross-user read without read-users is forbidden
    let (status, _) = send(&app, Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Cross-user update without update-user is forbidden
    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&bob),
        Some(json!({ "name": "Hacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Self update works
    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&alice),
        Some(json!({ "name": "Alice Cooper" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice Cooper");
}

#[tokio::test]
async fn capabilities_cannot_be_self_granted() {
    let app = test_app().await;
    let (alice_id, alice) = register_and_login(&app, "Alice", "alice@example.com").await;
    let (bob_id, _) = register_and_login(&app, "Bob", "bob@example.com").await;

    // The patch is silently dropped without update-user
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/users/{}", alice_id),
        Some(&alice),
        Some(json!({ "permissions": { "can_read_users": true } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["permissions"]["can_read_users"], false);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/users/{}", bob_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // An admin grant takes effect immediately
    let admin = admin_token(&app).await;
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/users/{}", alice_id),
        Some(&admin),
        Some(json!({ "permissions": { "can_read_users": true } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["permissions"]["can_read_users"], true);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/users/{}", bob_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
