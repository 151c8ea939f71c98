//! Community Forum
//!
//! Threads, replies and upvotes, plus the pin/lock moderation switches.

pub mod handlers;
pub mod types;

use axum::routing::{get, patch, post, put};
use axum::Router;

use crate::api::AppState;

pub use types::ForumError;

/// Forum routes. Mounted behind `require_auth`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/forum/threads",
            get(handlers::list_threads).post(handlers::create_thread),
        )
        .route(
            "/api/forum/threads/{id}",
            get(handlers::get_thread)
                .patch(handlers::update_thread)
                .delete(handlers::delete_thread),
        )
        .route("/api/forum/threads/{id}/pin", put(handlers::set_pinned))
        .route("/api/forum/threads/{id}/lock", put(handlers::set_locked))
        .route(
            "/api/forum/threads/{id}/upvote",
            post(handlers::toggle_thread_upvote),
        )
        .route(
            "/api/forum/threads/{id}/replies",
            get(handlers::list_replies).post(handlers::create_reply),
        )
        .route(
            "/api/forum/threads/{id}/replies/{reply_id}",
            patch(handlers::update_reply).delete(handlers::delete_reply),
        )
        .route(
            "/api/forum/threads/{id}/replies/{reply_id}/upvote",
            post(handlers::toggle_reply_upvote),
        )
}
