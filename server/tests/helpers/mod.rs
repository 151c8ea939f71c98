//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full axum
//! router over a fresh in-memory store, plus utilities for seeding users and
//! minting tokens.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, Method, Request, Response};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use hub_common::{AccountStatus, Role};
use hub_server::api::{create_router, AppState};
use hub_server::auth::jwt;
use hub_server::config::Config;
use hub_server::db::{MemoryStore, NewUser, Store};
use serde_json::{json, Value};
use tower::ServiceExt;

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub config: Arc<Config>,
}

impl TestApp {
    /// Create a new test app with the default test configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default_for_test())
    }

    /// Create a test app with a custom config.
    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), config.clone());
        let router = create_router(state);

        Self {
            router,
            store,
            config: Arc::new(config),
        }
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// Mint a valid token for `subject`.
    pub fn token(&self, subject: &str) -> String {
        jwt::issue_token(
            subject,
            Some(&format!("{subject}@campus.test")),
            Some(subject),
            &self.config.jwt_secret,
            self.config.jwt_expiry,
        )
        .expect("Failed to issue token")
    }

    /// Send a request, optionally authenticated and with a JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Self::request(method, uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.oneshot(request).await
    }

    /// Insert a user with the given role and return a token for them.
    pub async fn create_user(&self, id: &str, role: Role) -> String {
        self.store
            .provision_user(NewUser {
                id: id.to_string(),
                name: format!("User {id}"),
                email: Some(format!("{id}@campus.test")),
                role,
            })
            .await
            .expect("Failed to provision test user");
        self.token(id)
    }

    /// Change a seeded user's account status directly in the store.
    pub async fn set_status(&self, id: &str, status: AccountStatus) {
        self.store
            .set_user_status(id, status, None)
            .await
            .expect("Failed to set test user status");
    }
}

// ============================================================================
// Data helpers
// ============================================================================

/// Create a thread as `token` and return its ID.
pub async fn create_thread(app: &TestApp, token: &str, title: &str) -> String {
    let resp = app
        .send(
            Method::POST,
            "/api/forum/threads",
            Some(token),
            Some(json!({ "title": title, "body": "Does anyone have notes?", "tags": ["study"] })),
        )
        .await;
    assert_eq!(resp.status(), 201, "Thread creation should return 201");
    body_to_json(resp).await["id"]
        .as_str()
        .expect("thread id")
        .to_string()
}

/// Create an event starting tomorrow as `token` and return its ID.
pub async fn create_event(app: &TestApp, token: &str, capacity: Option<i32>) -> String {
    let resp = app
        .send(
            Method::POST,
            "/api/events",
            Some(token),
            Some(json!({
                "title": "Hackathon",
                "description": "24 hours of building",
                "starts_at": Utc::now() + Duration::days(1),
                "location": "Engineering building",
                "category": "tech",
                "capacity": capacity,
            })),
        )
        .await;
    assert_eq!(resp.status(), 201, "Event creation should return 201");
    body_to_json(resp).await["id"]
        .as_str()
        .expect("event id")
        .to_string()
}

/// A valid organizer request body.
pub fn organizer_request_body() -> Value {
    json!({
        "organization_type": "Student club",
        "organization_name": "Robotics Society",
        "role": "Treasurer",
        "justification": "We run monthly build nights and need to publish them.",
    })
}

/// Collect a response body and parse it as JSON.
pub async fn body_to_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}
