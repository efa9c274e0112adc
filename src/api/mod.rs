// HTTP surface: route table, shared state and the health probe.

pub mod auth;
pub mod configurations;
pub mod groups;
pub mod templates;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::github::GithubClient;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    /// None until a client secret is configured; auth endpoints report
    /// that instead of failing the whole server.
    pub github: Option<GithubClient>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/groups", get(groups::list).post(groups::create))
        .route(
            "/api/groups/:id",
            get(groups::fetch).put(groups::update).delete(groups::remove),
        )
        .route(
            "/api/configurations",
            get(configurations::list).post(configurations::create),
        )
        .route(
            "/api/configurations/with-groups",
            get(configurations::list_with_groups),
        )
        .route(
            "/api/configurations/copy-template",
            post(configurations::copy_template),
        )
        .route(
            "/api/configurations/:id",
            get(configurations::fetch)
                .put(configurations::update)
                .delete(configurations::remove),
        )
        .route(
            "/api/templates",
            get(templates::list).post(templates::create),
        )
        .route("/api/templates/stats/overview", get(templates::stats))
        .route(
            "/api/templates/:id",
            get(templates::fetch).delete(templates::remove),
        )
        .route("/api/templates/:id/like", post(templates::toggle_like))
        .route("/api/templates/:id/likes", get(templates::like_status))
        .route("/api/auth/github/callback", post(auth::github_callback))
        .route("/api/auth/user", get(auth::current_user))
        .route("/api/auth/logout", post(auth::logout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339(),
        "service": "dstack-config-server",
    }))
}
