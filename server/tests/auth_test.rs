//! HTTP Integration Tests for Authentication
//!
//! Tests token handling, the development identity fallback, user
//! provisioning and fail-closed behavior when the store is down.
//!
//! Run with: `cargo test --test auth_test -- --nocapture`

mod helpers;

use axum::body::Body;
use axum::http::Method;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use helpers::{body_to_json, TestApp};
use hub_common::{AccountStatus, Role};
use hub_server::auth::jwt;
use hub_server::config::Config;
use hub_server::db::Store;

fn dev_config() -> Config {
    Config {
        dev_auth_fallback: true,
        ..Config::default_for_test()
    }
}

// ============================================================================
// Token handling
// ============================================================================

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();

    let resp = app.send(Method::GET, "/api/me", None, None).await;
    assert_eq!(resp.status(), 401);
    let json = body_to_json(resp).await;
    assert_eq!(json["error"], "MISSING_AUTH");
}

#[tokio::test]
async fn test_public_routes_need_no_token() {
    let app = TestApp::new();

    let resp = app.send(Method::GET, "/api/events", None, None).await;
    assert_eq!(resp.status(), 200);
    let resp = app.send(Method::GET, "/api/resources", None, None).await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_valid_token_provisions_student() {
    let app = TestApp::new();
    let token = app.token("new-student");

    let resp = app.send(Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(resp.status(), 200);
    let json = body_to_json(resp).await;
    assert_eq!(json["id"], "new-student");
    assert_eq!(json["role"], "student");
    assert_eq!(json["status"], "active");
    assert_eq!(json["email"], "new-student@campus.test");
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let app = TestApp::new();
    let token = app.token("cookie-user");

    let req = TestApp::request(Method::GET, "/api/me")
        .header("Cookie", format!("session={token}"))
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(body_to_json(resp).await["id"], "cookie-user");
}

#[tokio::test]
async fn test_non_bearer_header_is_rejected() {
    let app = TestApp::new();

    let req = TestApp::request(Method::GET, "/api/me")
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await;
    assert_eq!(resp.status(), 401);
    assert_eq!(body_to_json(resp).await["error"], "INVALID_AUTH_HEADER");
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let app = TestApp::new();
    let token = jwt::issue_token("late", None, None, &app.config.jwt_secret, -60).unwrap();

    let resp = app.send(Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(resp.status(), 401);
    assert_eq!(body_to_json(resp).await["error"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let app = TestApp::new();
    let token = jwt::issue_token("mallory", None, None, "some-other-secret", 3600).unwrap();

    let resp = app.send(Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(resp.status(), 401);
    assert_eq!(body_to_json(resp).await["error"], "INVALID_TOKEN");
}

// ============================================================================
// Development fallback
// ============================================================================

#[tokio::test]
async fn test_malformed_token_rejected_by_default() {
    let app = TestApp::new();

    let resp = app
        .send(Method::GET, "/api/me", Some("not-a-jwt"), None)
        .await;
    assert_eq!(resp.status(), 401, "Fallback is off unless configured");
}

#[tokio::test]
async fn test_malformed_token_synthesizes_dev_user_when_enabled() {
    let app = TestApp::with_config(dev_config());

    let resp = app
        .send(Method::GET, "/api/me", Some("not-a-jwt"), None)
        .await;
    assert_eq!(resp.status(), 200);
    let json = body_to_json(resp).await;
    assert_eq!(json["id"], "dev-user");
    assert_eq!(json["role"], "student");
}

#[tokio::test]
async fn test_unverified_payload_subject_used_when_enabled() {
    let app = TestApp::with_config(dev_config());
    let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"alice","name":"Alice"}"#);
    let token = format!("eyJhbGciOiJub25lIn0.{payload}.sig");

    let resp = app.send(Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(resp.status(), 200);
    let json = body_to_json(resp).await;
    assert_eq!(json["id"], "alice");
    assert_eq!(json["name"], "Alice");
}

#[tokio::test]
async fn test_dev_header_only_with_fallback() {
    let app = TestApp::new();
    let req = TestApp::request(Method::GET, "/api/me")
        .header("x-dev-user-id", "bob")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.oneshot(req).await.status(), 401);

    let app = TestApp::with_config(dev_config());
    let req = TestApp::request(Method::GET, "/api/me")
        .header("x-dev-user-id", "bob")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(body_to_json(resp).await["id"], "bob");
}

// ============================================================================
// Role lookup
// ============================================================================

#[tokio::test]
async fn test_store_outage_fails_closed() {
    let app = TestApp::new();
    let token = app.create_user("mod", Role::Moderator).await;
    app.store.set_offline(true);

    let resp = app
        .send(Method::GET, "/api/admin/users", Some(&token), None)
        .await;
    assert_eq!(resp.status(), 503, "Role lookup failure must deny");
    assert_eq!(body_to_json(resp).await["error"], "SERVICE_UNAVAILABLE");

    let resp = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(resp.status(), 503);
}

#[tokio::test]
async fn test_banned_user_is_forbidden_everywhere() {
    let app = TestApp::new();
    let token = app.create_user("spammer", Role::Student).await;
    app.set_status("spammer", AccountStatus::Banned).await;

    for uri in ["/api/me", "/api/forum/threads", "/api/organizer-requests/mine"] {
        let resp = app.send(Method::GET, uri, Some(&token), None).await;
        assert_eq!(resp.status(), 403, "{uri} should reject banned accounts");
        assert_eq!(body_to_json(resp).await["error"], "ACCOUNT_BANNED");
    }
}

#[tokio::test]
async fn test_bootstrap_admin_is_provisioned_as_admin() {
    let app = TestApp::with_config(Config {
        bootstrap_admins: vec!["dean".into()],
        ..Config::default_for_test()
    });
    let token = app.token("dean");

    let resp = app.send(Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(body_to_json(resp).await["role"], "admin");

    let resp = app
        .send(Method::GET, "/api/admin/audit-log", Some(&token), None)
        .await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_role_comes_from_store_not_token() {
    let app = TestApp::new();
    let token = app.create_user("promoted", Role::Student).await;

    let resp = app
        .send(Method::GET, "/api/admin/users", Some(&token), None)
        .await;
    assert_eq!(resp.status(), 403);

    app.store
        .set_user_role("promoted", Role::Moderator, None)
        .await
        .unwrap();
    let resp = app
        .send(Method::GET, "/api/admin/users", Some(&token), None)
        .await;
    assert_eq!(resp.status(), 200, "Same token, new role");
}
