//! API Router and Application State
//!
//! Central routing configuration and shared state.

pub mod error;

use axum::{
    extract::State, http::StatusCode, middleware::from_fn_with_state, routing::get, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{admin, auth, config::Config, db::Store, events, forum, organizer, resources, users};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend
    pub store: Arc<dyn Store>,
    /// Server configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// `?limit=&offset=` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    const DEFAULT_LIMIT: i64 = 20;

    /// Clamp to the configured page size; negative offsets become zero.
    #[must_use]
    pub fn resolve(&self, config: &Config) -> (i64, i64) {
        (
            config.clamp_limit(self.limit.unwrap_or(Self::DEFAULT_LIMIT)),
            self.offset.unwrap_or(0).max(0),
        )
    }
}

/// One page of results.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(users::router())
        .merge(forum::router())
        .merge(events::router())
        .merge(resources::router())
        .merge(organizer::router())
        .nest("/api/admin", admin::router())
        .layer(from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Public listings
        .merge(events::public_router())
        .merge(resources::public_router())
        .merge(protected_routes)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Whether the store answered
    store: bool,
    /// Backend in use
    backend: &'static str,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store = state.store.ping().await.is_ok();
    let backend = if state.config.has_database() {
        "postgres"
    } else {
        "memory"
    };
    let (status, label) = if store {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthResponse {
            status: label,
            store,
            backend,
        }),
    )
}
