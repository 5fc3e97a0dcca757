//! API integration tests
//!
//! Run against a live server with a seeded admin account:
//! `cargo test -- --ignored`

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:5000";

fn admin_credentials() -> (String, String) {
    (
        std::env::var("TEST_ADMIN_EMAIL").unwrap_or_else(|_| "admin@library.com".to_string()),
        std::env::var("TEST_ADMIN_PASSWORD").unwrap_or_else(|_| "adminpass".to_string()),
    )
}

/// Unique suffix so repeated runs never collide on identity
fn unique_suffix() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos()
}

/// Register a fresh user and return (id, email, token)
async fn register_user(client: &Client) -> (i64, String, String) {
    let suffix = unique_suffix();
    let email = format!("reader{}@example.com", suffix);

    let response = client
        .post(format!("{}/api/auth/register", BASE_URL))
        .json(&json!({
            "username": format!("reader{}", suffix),
            "email": email,
            "password": "secret1",
            "first_name": "Test",
            "last_name": "Reader"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse register response");
    let id = body["id"].as_i64().expect("No user id in response");
    let token = body["token"].as_str().expect("No token in response").to_string();
    (id, email, token)
}

/// Helper to get an authenticated admin client
async fn get_admin_token(client: &Client) -> String {
    let (email, password) = admin_credentials();
    let response = client
        .post(format!("{}/api/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "OK");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_register_and_login() {
    let client = Client::new();
    let suffix = unique_suffix();
    let email = format!("Alice{}@Example.com", suffix);

    let response = client
        .post(format!("{}/api/auth/register", BASE_URL))
        .json(&json!({
            "username": format!("alice{}", suffix),
            "email": email,
            "password": "secret1",
            "first_name": "A",
            "last_name": "L"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["role"], "user");
    assert!(body["token"].is_string());
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());
    let user_id = body["id"].as_i64().expect("No user id");

    // Login is case-insensitive on email and resolves to the same account
    let response = client
        .post(format!("{}/api/auth/login", BASE_URL))
        .json(&json!({
            "email": email.to_uppercase(),
            "password": "secret1"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["id"].as_i64(), Some(user_id));

    // Wrong password is rejected without revealing which credential failed
    let response = client
        .post(format!("{}/api/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_register_duplicate_email_case_insensitive() {
    let client = Client::new();
    let suffix = unique_suffix();
    let email = format!("Bob{}@Example.com", suffix);

    let response = client
        .post(format!("{}/api/auth/register", BASE_URL))
        .json(&json!({
            "username": format!("bob{}", suffix),
            "email": email,
            "password": "secret1",
            "first_name": "B",
            "last_name": "O"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    // Same email, different case, different username
    let response = client
        .post(format!("{}/api/auth/register", BASE_URL))
        .json(&json!({
            "username": format!("bob{}x", suffix),
            "email": email.to_lowercase(),
            "password": "secret1",
            "first_name": "B",
            "last_name": "O"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    // Same username, different email
    let response = client
        .post(format!("{}/api/auth/register", BASE_URL))
        .json(&json!({
            "username": format!("bob{}", suffix),
            "email": format!("other{}@example.com", suffix),
            "password": "secret1",
            "first_name": "B",
            "last_name": "O"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_register_rejects_short_password() {
    let client = Client::new();
    let suffix = unique_suffix();

    let response = client
        .post(format!("{}/api/auth/register", BASE_URL))
        .json(&json!({
            "username": format!("shorty{}", suffix),
            "email": format!("shorty{}@example.com", suffix),
            "password": "five5",
            "first_name": "S",
            "last_name": "P"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_login_unknown_email() {
    let client = Client::new();

    let response = client
        .post(format!("{}/api/auth/login", BASE_URL))
        .json(&json!({
            "email": format!("nobody{}@example.com", unique_suffix()),
            "password": "whatever"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_get_current_user() {
    let client = Client::new();
    let (id, email, token) = register_user(&client).await;

    let response = client
        .get(format!("{}/api/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["id"].as_i64(), Some(id));
    assert_eq!(body["email"].as_str(), Some(email.to_lowercase().as_str()));
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/api/auth/me", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);

    let response = client
        .get(format!("{}/api/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_create_book_requires_admin() {
    let client = Client::new();
    let (_, _, token) = register_user(&client).await;

    let response = client
        .post(format!("{}/api/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Forbidden Book",
            "author": "Nobody"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_book_crud_and_borrow_flow() {
    let client = Client::new();
    let token = get_admin_token(&client).await;
    let (user_id, _, _) = register_user(&client).await;

    // Create book
    let response = client
        .post(format!("{}/api/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Test Book",
            "author": "Test Author",
            "isbn": format!("978-{}", unique_suffix()),
            "total_copies": 1
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let book_id = body["id"].as_i64().expect("No book id");
    assert_eq!(body["available_copies"].as_i64(), Some(1));

    // Borrow it
    let response = client
        .post(format!("{}/api/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "user_id": user_id,
            "book_id": book_id
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let borrow_id = body["id"].as_i64().expect("No borrow id");
    assert_eq!(body["returned"].as_bool(), Some(false));

    // The single copy is out; a second borrow conflicts
    let response = client
        .post(format!("{}/api/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "user_id": user_id,
            "book_id": book_id
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // The borrow shows up in the user's history
    let response = client
        .get(format!("{}/api/users/{}/borrows", BASE_URL, user_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body
        .as_array()
        .expect("Expected array")
        .iter()
        .any(|b| b["id"].as_i64() == Some(borrow_id)));

    // Return it
    let response = client
        .post(format!("{}/api/borrows/{}/return", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "returned");

    // A second return conflicts
    let response = client
        .post(format!("{}/api/borrows/{}/return", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Cleanup: delete the book
    let response = client
        .delete(format!("{}/api/books/{}?force=true", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_deactivated_account_cannot_login() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let (user_id, email, _) = register_user(&client).await;

    // Deactivate the account
    let response = client
        .put(format!("{}/api/users/{}/status", BASE_URL, user_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({ "is_active": false }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // Correct password, but the account is deactivated
    let response = client
        .post(format!("{}/api/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "secret1"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);

    // Reactivate and login succeeds again
    let response = client
        .put(format!("{}/api/users/{}/status", BASE_URL, user_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({ "is_active": true }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/api/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "secret1"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[ignore]
async fn test_list_users_requires_admin() {
    let client = Client::new();
    let (_, _, token) = register_user(&client).await;

    let response = client
        .get(format!("{}/api/users", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let admin_token = get_admin_token(&client).await;
    let response = client
        .get(format!("{}/api/users", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
}
