//! Shared harness for the HTTP tests: the full router over the in-memory
//! store, with images written to a temporary directory.

#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc};

use api::{
    jwt::{JwtConfig, JwtService},
    routes::create_router,
    state::AppState,
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use common::storage::LocalStorage;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

pub const PASSWORD: &str = "testpass123";

/// Smallest prefix `image::guess_format` recognizes as PNG
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";

const BOUNDARY: &str = "recipe-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    media: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let media = TempDir::new().unwrap();
        let storage = Arc::new(LocalStorage::new(media.path()));
        let jwt_service = JwtService::new(JwtConfig {
            secret: "test-secret".to_string(),
            token_expiry: 3600,
        });

        let state = AppState::with_memory(storage, jwt_service);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            media,
        }
    }

    /// Where a stored image key lands on disk
    pub fn media_path(&self, key: &str) -> PathBuf {
        self.media.path().join(key)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn request(
        &self,
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

        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Register a user and return a bearer token for them
    pub async fn register(&self, email: &str) -> String {
        let (status, _) = self
            .request(
                Method::POST,
                "/api/user/create",
                None,
                Some(json!({ "email": email, "password": PASSWORD, "name": "Test User" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .request(
                Method::POST,
                "/api/user/token",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        body["token"].as_str().unwrap().to_string()
    }

    /// Create a recipe with sensible defaults merged with `fields`
    pub async fn create_recipe(&self, token: &str, fields: Value) -> Value {
        let mut payload = json!({
            "title": "Sample recipe",
            "time_minutes": 22,
            "price": "5.25",
            "description": "Sample description",
            "link": "http://example.com/recipe.pdf",
        });
        if let (Some(payload), Some(fields)) = (payload.as_object_mut(), fields.as_object()) {
            for (key, value) in fields {
                payload.insert(key.clone(), value.clone());
            }
        }

        let (status, body) = self.post("/api/recipe/recipes", token, payload).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body
    }

    /// POST a single-file multipart form
    pub async fn upload(
        &self,
        uri: &str,
        token: &str,
        field: &str,
        filename: &str,
        data: &[u8],
    ) -> (StatusCode, Value) {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();

        self.send(request).await
    }
}

/// Names of the tags or ingredients in a recipe body, in order
pub fn names(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["name"].as_str().unwrap().to_string())
        .collect()
}
