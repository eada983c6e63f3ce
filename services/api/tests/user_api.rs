//! HTTP tests for registration, tokens and the profile endpoints

mod common;

use axum::http::{Method, StatusCode};
use common::{PASSWORD, TestApp};
use serde_json::json;

const CREATE_URL: &str = "/api/user/create";
const TOKEN_URL: &str = "/api/user/token";
const ME_URL: &str = "/api/user/me";

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, body) = app.request(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_user_success() {
    let app = TestApp::new();
    let (status, body) = app
        .request(
            Method::POST,
            CREATE_URL,
            None,
            Some(json!({ "email": "Test@EXAMPLE.com", "password": PASSWORD, "name": "Test" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "Test@example.com");
    assert_eq!(body["name"], "Test");
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_create_user_with_existing_email_fails() {
    let app = TestApp::new();
    app.register("test@example.com").await;

    let (status, body) = app
        .request(
            Method::POST,
            CREATE_URL,
            None,
            Some(json!({ "email": "test@example.com", "password": PASSWORD, "name": "Again" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "user with this email already exists.");
}

#[tokio::test]
async fn test_create_user_with_short_password_fails() {
    let app = TestApp::new();
    let (status, _) = app
        .request(
            Method::POST,
            CREATE_URL,
            None,
            Some(json!({ "email": "test@example.com", "password": "pw", "name": "Test" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // nothing was stored, so the address is still free
    let (status, _) = app
        .request(
            Method::POST,
            CREATE_URL,
            None,
            Some(json!({ "email": "test@example.com", "password": PASSWORD, "name": "Test" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_create_user_without_email_fails() {
    let app = TestApp::new();
    let (status, _) = app
        .request(
            Method::POST,
            CREATE_URL,
            None,
            Some(json!({ "email": "", "password": PASSWORD, "name": "Test" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_user_with_mistyped_email_fails() {
    let app = TestApp::new();
    let (status, body) = app
        .request(
            Method::POST,
            CREATE_URL,
            None,
            Some(json!({ "email": 42, "password": PASSWORD, "name": "Test" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn test_token_for_valid_credentials() {
    let app = TestApp::new();
    let token = app.register("test@example.com").await;

    assert!(!token.is_empty());
}

#[tokio::test]
async fn test_token_rejects_bad_credentials() {
    let app = TestApp::new();
    app.register("test@example.com").await;

    for payload in [
        json!({ "email": "test@example.com", "password": "wrongpass" }),
        json!({ "email": "nobody@example.com", "password": PASSWORD }),
        json!({ "email": "test@example.com", "password": "" }),
    ] {
        let (status, body) = app
            .request(Method::POST, TOKEN_URL, None, Some(payload))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("token").is_none());
    }
}

#[tokio::test]
async fn test_profile_requires_authentication() {
    let app = TestApp::new();

    let (status, _) = app.request(Method::GET, ME_URL, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(Method::GET, ME_URL, Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_retrieve_profile() {
    let app = TestApp::new();
    let token = app.register("test@example.com").await;

    let (status, body) = app.get(ME_URL, &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "email": "test@example.com", "name": "Test User" }));
}

#[tokio::test]
async fn test_post_to_profile_not_allowed() {
    let app = TestApp::new();
    let token = app.register("test@example.com").await;

    let (status, _) = app.post(ME_URL, &token, json!({})).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_update_profile() {
    let app = TestApp::new();
    let token = app.register("test@example.com").await;

    let (status, body) = app
        .patch(
            ME_URL,
            &token,
            json!({ "name": "Updated name", "password": "newpassword123" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Updated name");

    let (status, _) = app
        .request(
            Method::POST,
            TOKEN_URL,
            None,
            Some(json!({ "email": "test@example.com", "password": "newpassword123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_full_update_requires_every_field() {
    let app = TestApp::new();
    let token = app.register("test@example.com").await;

    let (status, _) = app.put(ME_URL, &token, json!({ "name": "Only name" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_profile_removes_everything() {
    let app = TestApp::new();
    let token = app.register("test@example.com").await;
    app.create_recipe(&token, json!({ "tags": [{ "name": "Vegan" }] }))
        .await;

    let (status, _) = app.delete(ME_URL, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // the token no longer resolves to a user
    let (status, _) = app.get(ME_URL, &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(
            Method::POST,
            TOKEN_URL,
            None,
            Some(json!({ "email": "test@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
