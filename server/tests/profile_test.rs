//! HTTP Integration Tests for Profiles and Resources
//!
//! Tests profile edits, public profiles, resource sharing and pins.
//!
//! Run with: `cargo test --test profile_test -- --nocapture`

mod helpers;

use axum::http::Method;
use helpers::{body_to_json, create_event, TestApp};
use hub_common::Role;
use serde_json::json;

async fn share_resource(app: &TestApp, token: &str) -> String {
    let resp = app
        .send(
            Method::POST,
            "/api/resources",
            Some(token),
            Some(json!({
                "title": "Calculus cheat sheet",
                "description": "Derivatives and integrals",
                "url": "https://example.edu/calc.pdf",
                "category": "Math",
                "tags": ["calculus", "Calculus", "exam"],
            })),
        )
        .await;
    assert_eq!(resp.status(), 201);
    let json = body_to_json(resp).await;
    assert_eq!(json["category"], "math");
    assert_eq!(json["tags"], json!(["calculus", "exam"]));
    json["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_profile_edit_and_public_view() {
    let app = TestApp::new();
    let token = app.create_user("zoe", Role::Student).await;
    let other = app.create_user("amy", Role::Student).await;

    let resp = app
        .send(
            Method::PATCH,
            "/api/me",
            Some(&token),
            Some(json!({
                "name": "Zoe K.",
                "bio": "Biology major",
                "avatar_url": "https://example.edu/zoe.png",
            })),
        )
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(body_to_json(resp).await["name"], "Zoe K.");

    let resp = app
        .send(Method::GET, "/api/users/zoe", Some(&other), None)
        .await;
    assert_eq!(resp.status(), 200);
    let json = body_to_json(resp).await;
    assert_eq!(json["bio"], "Biology major");
    assert!(json.get("email").is_none(), "Public profile hides email");
}

#[tokio::test]
async fn test_profile_validation() {
    let app = TestApp::new();
    let token = app.create_user("bo", Role::Student).await;

    let resp = app
        .send(
            Method::PATCH,
            "/api/me",
            Some(&token),
            Some(json!({ "avatar_url": "ftp://example.edu/a.png" })),
        )
        .await;
    assert_eq!(resp.status(), 400);

    for avatar_url in ["https://exa%%mple.edu/a.png", "https://[::1/a.png", "http://:@/x"] {
        let resp = app
            .send(
                Method::PATCH,
                "/api/me",
                Some(&token),
                Some(json!({ "avatar_url": avatar_url })),
            )
            .await;
        assert_eq!(resp.status(), 400, "{avatar_url} is not a valid link");
    }

    let resp = app
        .send(Method::PATCH, "/api/me", Some(&token), Some(json!({ "name": "   " })))
        .await;
    assert_eq!(resp.status(), 400);

    let resp = app
        .send(Method::PATCH, "/api/me", Some(&token), Some(json!({})))
        .await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_me_lists_pins_and_rsvps() {
    let app = TestApp::new();
    let token = app.create_user("cal", Role::Student).await;
    let moderator = app.create_user("mod", Role::Moderator).await;
    let resource_id = share_resource(&app, &token).await;
    let event_id = create_event(&app, &moderator, None).await;

    let resp = app
        .send(
            Method::PUT,
            &format!("/api/resources/{resource_id}/pin"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(resp.status(), 200);
    let json = body_to_json(resp).await;
    assert_eq!(json["pinned"], true);
    assert_eq!(json["pin_count"], 1);

    app.send(
        Method::PUT,
        &format!("/api/events/{event_id}/rsvp"),
        Some(&token),
        None,
    )
    .await;

    let me = body_to_json(app.send(Method::GET, "/api/me", Some(&token), None).await).await;
    assert_eq!(me["pinned_resources"], json!([resource_id]));
    assert_eq!(me["rsvped_events"], json!([event_id]));

    let resp = app
        .send(
            Method::DELETE,
            &format!("/api/resources/{resource_id}/pin"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body_to_json(resp).await["pin_count"], 0);
}

#[tokio::test]
async fn test_resource_url_must_be_http() {
    let app = TestApp::new();
    let token = app.create_user("dee", Role::Student).await;

    let resp = app
        .send(
            Method::POST,
            "/api/resources",
            Some(&token),
            Some(json!({
                "title": "Sketchy",
                "url": "javascript:alert(1)",
                "category": "misc",
            })),
        )
        .await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_blank_resource_fields_are_rejected() {
    let app = TestApp::new();
    let token = app.create_user("gia", Role::Student).await;

    let resp = app
        .send(
            Method::POST,
            "/api/resources",
            Some(&token),
            Some(json!({
                "title": "   ",
                "url": "https://example.edu/notes.pdf",
                "category": "  ",
            })),
        )
        .await;
    assert_eq!(resp.status(), 400);
    assert_eq!(body_to_json(resp).await["error"], "VALIDATION_ERROR");

    let resp = app
        .send(
            Method::POST,
            "/api/resources",
            Some(&token),
            Some(json!({
                "title": "Broken link",
                "url": "https://[::1/notes.pdf",
                "category": "notes",
            })),
        )
        .await;
    assert_eq!(resp.status(), 400);

    let resp = app.send(Method::GET, "/api/resources", None, None).await;
    assert_eq!(body_to_json(resp).await["total"], 0);
}

#[tokio::test]
async fn test_moderator_deletes_others_resource_with_audit() {
    let app = TestApp::new();
    let owner = app.create_user("eve", Role::Student).await;
    let other = app.create_user("fin", Role::Student).await;
    let moderator = app.create_user("mod", Role::Moderator).await;
    let resource_id = share_resource(&app, &owner).await;
    let uri = format!("/api/resources/{resource_id}");

    assert_eq!(app.send(Method::DELETE, &uri, Some(&other), None).await.status(), 403);
    assert_eq!(app.send(Method::DELETE, &uri, Some(&moderator), None).await.status(), 204);
    assert_eq!(app.send(Method::GET, &uri, None, None).await.status(), 404);

    let resp = app
        .send(Method::GET, "/api/admin/audit-log", Some(&moderator), None)
        .await;
    assert_eq!(body_to_json(resp).await["items"][0]["action"], "resource.deleted");
}
