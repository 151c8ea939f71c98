//! HTTP Integration Tests for the Forum
//!
//! Tests upvote toggling, reply counters, locked threads, moderator-only
//! actions and suspended accounts.
//!
//! Run with: `cargo test --test forum_test -- --nocapture`

mod helpers;

use axum::http::Method;
use futures::future::join_all;
use helpers::{body_to_json, create_thread, TestApp};
use hub_common::{AccountStatus, Role};
use serde_json::json;

// ============================================================================
// Upvotes
// ============================================================================

#[tokio::test]
async fn test_upvote_toggle_twice_restores_state() {
    let app = TestApp::new();
    let token = app.create_user("ana", Role::Student).await;
    let thread_id = create_thread(&app, &token, "Linear algebra notes").await;
    let uri = format!("/api/forum/threads/{thread_id}/upvote");

    let resp = app.send(Method::POST, &uri, Some(&token), None).await;
    assert_eq!(resp.status(), 200);
    let json = body_to_json(resp).await;
    assert_eq!(json["upvotes"], 1);
    assert_eq!(json["has_upvoted"], true);
    assert_eq!(json["upvoted_by"], json!(["ana"]));

    let resp = app.send(Method::POST, &uri, Some(&token), None).await;
    let json = body_to_json(resp).await;
    assert_eq!(json["upvotes"], 0);
    assert_eq!(json["has_upvoted"], false);
    assert_eq!(json["upvoted_by"], json!([]));
}

#[tokio::test]
async fn test_concurrent_upvotes_keep_count_in_sync() {
    let app = TestApp::new();
    let author = app.create_user("author", Role::Student).await;
    let thread_id = create_thread(&app, &author, "Exam schedule").await;
    let uri = format!("/api/forum/threads/{thread_id}/upvote");

    let mut tokens = Vec::new();
    for i in 0..12 {
        tokens.push(app.create_user(&format!("voter-{i}"), Role::Student).await);
    }
    let responses = join_all(
        tokens
            .iter()
            .map(|token| app.send(Method::POST, &uri, Some(token), None)),
    )
    .await;
    assert!(responses.iter().all(|r| r.status() == 200));

    let resp = app
        .send(
            Method::GET,
            &format!("/api/forum/threads/{thread_id}"),
            Some(&author),
            None,
        )
        .await;
    let json = body_to_json(resp).await;
    assert_eq!(json["upvotes"], 12);
    assert_eq!(json["upvoted_by"].as_array().unwrap().len(), 12);
}

// ============================================================================
// Replies
// ============================================================================

#[tokio::test]
async fn test_deleting_reply_decrements_reply_count_by_one() {
    let app = TestApp::new();
    let token = app.create_user("ben", Role::Student).await;
    let thread_id = create_thread(&app, &token, "Lab partners").await;
    let replies_uri = format!("/api/forum/threads/{thread_id}/replies");

    let mut reply_ids = Vec::new();
    for body in ["Count me in", "Me too", "Which lab?"] {
        let resp = app
            .send(Method::POST, &replies_uri, Some(&token), Some(json!({ "body": body })))
            .await;
        assert_eq!(resp.status(), 201);
        reply_ids.push(body_to_json(resp).await["id"].as_str().unwrap().to_string());
    }

    let thread_uri = format!("/api/forum/threads/{thread_id}");
    let before = body_to_json(app.send(Method::GET, &thread_uri, Some(&token), None).await).await;
    assert_eq!(before["reply_count"], 3);

    let resp = app
        .send(
            Method::DELETE,
            &format!("{replies_uri}/{}", reply_ids[1]),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(resp.status(), 204);

    let after = body_to_json(app.send(Method::GET, &thread_uri, Some(&token), None).await).await;
    assert_eq!(after["reply_count"], 2);
    assert_eq!(after["replies"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_editing_reply_marks_it_edited() {
    let app = TestApp::new();
    let token = app.create_user("cleo", Role::Student).await;
    let thread_id = create_thread(&app, &token, "Library hours").await;
    let replies_uri = format!("/api/forum/threads/{thread_id}/replies");

    let resp = app
        .send(Method::POST, &replies_uri, Some(&token), Some(json!({ "body": "Open till 10" })))
        .await;
    let reply_id = body_to_json(resp).await["id"].as_str().unwrap().to_string();

    let resp = app
        .send(
            Method::PATCH,
            &format!("{replies_uri}/{reply_id}"),
            Some(&token),
            Some(json!({ "body": "Open till 11 during finals" })),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let json = body_to_json(resp).await;
    assert_eq!(json["edited"], true);
    assert_eq!(json["body"], "Open till 11 during finals");
}

#[tokio::test]
async fn test_student_cannot_delete_others_reply() {
    let app = TestApp::new();
    let owner = app.create_user("owner", Role::Student).await;
    let other = app.create_user("other", Role::Student).await;
    let moderator = app.create_user("mod", Role::Moderator).await;
    let thread_id = create_thread(&app, &owner, "Parking permits").await;
    let replies_uri = format!("/api/forum/threads/{thread_id}/replies");

    let resp = app
        .send(Method::POST, &replies_uri, Some(&owner), Some(json!({ "body": "Ask admin office" })))
        .await;
    let reply_uri = format!(
        "{replies_uri}/{}",
        body_to_json(resp).await["id"].as_str().unwrap()
    );

    let resp = app.send(Method::DELETE, &reply_uri, Some(&other), None).await;
    assert_eq!(resp.status(), 403);

    let resp = app.send(Method::DELETE, &reply_uri, Some(&moderator), None).await;
    assert_eq!(resp.status(), 204);

    let resp = app
        .send(Method::GET, "/api/admin/audit-log", Some(&moderator), None)
        .await;
    let json = body_to_json(resp).await;
    assert_eq!(json["items"][0]["action"], "reply.deleted");
}

// ============================================================================
// Moderation
// ============================================================================

#[tokio::test]
async fn test_locked_thread_rejects_student_replies() {
    let app = TestApp::new();
    let student = app.create_user("dana", Role::Student).await;
    let moderator = app.create_user("mod", Role::Moderator).await;
    let thread_id = create_thread(&app, &student, "Heated debate").await;

    let resp = app
        .send(
            Method::PUT,
            &format!("/api/forum/threads/{thread_id}/lock"),
            Some(&moderator),
            Some(json!({ "locked": true })),
        )
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(body_to_json(resp).await["locked"], true);

    let replies_uri = format!("/api/forum/threads/{thread_id}/replies");
    let resp = app
        .send(Method::POST, &replies_uri, Some(&student), Some(json!({ "body": "But wait" })))
        .await;
    assert_eq!(resp.status(), 409);
    assert_eq!(body_to_json(resp).await["error"], "THREAD_LOCKED");

    let resp = app
        .send(
            Method::POST,
            &replies_uri,
            Some(&moderator),
            Some(json!({ "body": "Thread closed, see rules." })),
        )
        .await;
    assert_eq!(resp.status(), 201, "Staff may still reply");
}

#[tokio::test]
async fn test_author_cannot_edit_locked_thread_but_staff_can() {
    let app = TestApp::new();
    let author = app.create_user("hal", Role::Student).await;
    let moderator = app.create_user("mod", Role::Moderator).await;
    let thread_id = create_thread(&app, &author, "Parking permits").await;
    let uri = format!("/api/forum/threads/{thread_id}");

    app.send(
        Method::PUT,
        &format!("{uri}/lock"),
        Some(&moderator),
        Some(json!({ "locked": true })),
    )
    .await;

    let resp = app
        .send(Method::PATCH, &uri, Some(&author), Some(json!({ "title": "Edited" })))
        .await;
    assert_eq!(resp.status(), 409);
    assert_eq!(body_to_json(resp).await["error"], "THREAD_LOCKED");

    let resp = app
        .send(
            Method::PATCH,
            &uri,
            Some(&moderator),
            Some(json!({ "title": "Parking permits (closed)" })),
        )
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(body_to_json(resp).await["title"], "Parking permits (closed)");

    let resp = app
        .send(Method::GET, "/api/admin/audit-log", Some(&moderator), None)
        .await;
    let json = body_to_json(resp).await;
    assert_eq!(json["items"][0]["action"], "thread.edited");
    assert_eq!(json["items"][1]["action"], "thread.locked");
}

#[tokio::test]
async fn test_staff_delete_is_not_applied_when_audit_write_fails() {
    let app = TestApp::new();
    let author = app.create_user("ida", Role::Student).await;
    let moderator = app.create_user("mod", Role::Moderator).await;
    let thread_id = create_thread(&app, &author, "Spam thread").await;
    let uri = format!("/api/forum/threads/{thread_id}");

    app.store.set_audit_offline(true);
    let resp = app.send(Method::DELETE, &uri, Some(&moderator), None).await;
    assert_eq!(resp.status(), 503);
    assert_eq!(
        app.send(Method::GET, &uri, Some(&author), None).await.status(),
        200,
        "Thread survives a failed audit write"
    );

    app.store.set_audit_offline(false);
    let resp = app.send(Method::DELETE, &uri, Some(&moderator), None).await;
    assert_eq!(resp.status(), 204, "Retry succeeds once the audit log is back");

    let resp = app
        .send(Method::GET, "/api/admin/audit-log", Some(&moderator), None)
        .await;
    let json = body_to_json(resp).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["items"][0]["action"], "thread.deleted");
}

#[tokio::test]
async fn test_pin_requires_moderator_and_pinned_lists_first() {
    let app = TestApp::new();
    let student = app.create_user("eli", Role::Student).await;
    let moderator = app.create_user("mod", Role::Moderator).await;
    let first = create_thread(&app, &student, "Welcome week").await;
    let _second = create_thread(&app, &student, "Lost and found").await;
    let pin_uri = format!("/api/forum/threads/{first}/pin");

    let resp = app
        .send(Method::PUT, &pin_uri, Some(&student), Some(json!({ "pinned": true })))
        .await;
    assert_eq!(resp.status(), 403);
    assert_eq!(body_to_json(resp).await["error"], "FORBIDDEN");

    let resp = app
        .send(Method::PUT, &pin_uri, Some(&moderator), Some(json!({ "pinned": true })))
        .await;
    assert_eq!(resp.status(), 200);

    let resp = app
        .send(Method::GET, "/api/forum/threads", Some(&student), None)
        .await;
    let json = body_to_json(resp).await;
    assert_eq!(json["total"], 2);
    assert_eq!(json["items"][0]["id"], first.as_str());
    assert_eq!(json["items"][0]["pinned"], true);
}

#[tokio::test]
async fn test_suspended_user_can_read_but_not_post() {
    let app = TestApp::new();
    let token = app.create_user("fay", Role::Student).await;
    let thread_id = create_thread(&app, &token, "Before suspension").await;
    app.set_status("fay", AccountStatus::Suspended).await;

    let resp = app
        .send(Method::GET, "/api/forum/threads", Some(&token), None)
        .await;
    assert_eq!(resp.status(), 200);

    let resp = app
        .send(
            Method::POST,
            "/api/forum/threads",
            Some(&token),
            Some(json!({ "title": "After", "body": "Should fail" })),
        )
        .await;
    assert_eq!(resp.status(), 403);
    assert_eq!(body_to_json(resp).await["error"], "ACCOUNT_SUSPENDED");

    let resp = app
        .send(
            Method::POST,
            &format!("/api/forum/threads/{thread_id}/upvote"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn test_thread_validation_and_search() {
    let app = TestApp::new();
    let token = app.create_user("gus", Role::Student).await;

    let resp = app
        .send(
            Method::POST,
            "/api/forum/threads",
            Some(&token),
            Some(json!({ "title": "", "body": "No title" })),
        )
        .await;
    assert_eq!(resp.status(), 400);
    assert_eq!(body_to_json(resp).await["error"], "VALIDATION_ERROR");

    let resp = app
        .send(
            Method::POST,
            "/api/forum/threads",
            Some(&token),
            Some(json!({ "title": "    ", "body": "Blank title" })),
        )
        .await;
    assert_eq!(resp.status(), 400, "Whitespace-only title is empty");

    let thread_id = create_thread(&app, &token, "Organic chemistry tutor").await;
    let resp = app
        .send(
            Method::PATCH,
            &format!("/api/forum/threads/{thread_id}"),
            Some(&token),
            Some(json!({ "title": " \t " })),
        )
        .await;
    assert_eq!(resp.status(), 400);

    let resp = app
        .send(
            Method::POST,
            &format!("/api/forum/threads/{thread_id}/replies"),
            Some(&token),
            Some(json!({ "body": "   " })),
        )
        .await;
    assert_eq!(resp.status(), 400);

    create_thread(&app, &token, "Football tickets").await;

    let resp = app
        .send(
            Method::GET,
            "/api/forum/threads?search=CHEMISTRY",
            Some(&token),
            None,
        )
        .await;
    let json = body_to_json(resp).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["items"][0]["title"], "Organic chemistry tutor");
}
