#![allow(dead_code)]

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use testdesk::service::UserService;
use testdesk::{app, AppState, MemoryStore, Settings, StoreKind};
use tower::ServiceExt;

pub const ROOT_EMAIL: &str = "root@example.com";
pub const ROOT_PASSWORD: &str = "rootpassword";

pub struct TestApp {
    pub router: Router,
    pub root_token: String,
}

pub fn settings() -> Settings {
    Settings {
        store: StoreKind::Memory,
        secret_key: "integration-secret".into(),
        first_superuser_email: Some(ROOT_EMAIL.into()),
        first_superuser_password: Some(ROOT_PASSWORD.into()),
        media_dir: std::env::temp_dir().join("testdesk-media"),
        poll_sweep_interval_secs: 0,
        ..Settings::default()
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_settings(settings()).await
    }

    pub async fn with_settings(settings: Settings) -> Self {
        let store = Arc::new(MemoryStore::new());
        UserService::create_initial_user(store.as_ref(), &settings).await.unwrap();
        let router = app(AppState::new(store, settings));
        let mut t = TestApp {
            router,
            root_token: String::new(),
        };
        t.root_token = t.login(ROOT_EMAIL, ROOT_PASSWORD).await;
        t
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header("authorization", format!("Bearer {}", t));
        }
        let req = match body {
            Some(b) => req
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&b).unwrap()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let (status, _, value) = self.request(req).await;
        (status, value)
    }

    /// Send a prepared request and return the raw response parts.
    pub async fn request(&self, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, headers, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Upload one multipart field as the root user.
    pub async fn upload(&self, uri: &str, field: &str, file_name: &str, content_type: &str, data: &[u8]) -> (StatusCode, Value) {
        const BOUNDARY: &str = "testdesk-boundary";
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
            b = BOUNDARY
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("authorization", format!("Bearer {}", self.root_token))
            .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
            .body(Body::from(body))
            .unwrap();
        let (status, _, value) = self.request(req).await;
        (status, value)
    }

    pub async fn root(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, uri, Some(&self.root_token), body).await
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/login/access-token",
                None,
                Some(json!({"email": email, "password": password})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        assert_eq!(body["tokenType"], "bearer");
        body["accessToken"].as_str().unwrap().to_string()
    }

    /// Create a user through the admin endpoint and return its id.
    pub async fn create_user(&self, email: &str, roles: &[&str]) -> i64 {
        let (status, body) = self
            .root(
                Method::POST,
                "/api/users",
                Some(json!({"email": email, "password": "password123", "roles": roles})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"]["id"].as_i64().unwrap()
    }
}
