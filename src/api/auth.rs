// GitHub OAuth endpoints. Tokens live on the client; the server only
// exchanges codes and proxies user lookups.

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::{EditorError, Result};
use crate::github::GithubClient;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackBody {
    pub code: Option<String>,
    pub state: Option<String>,
}

fn configured_client(state: &AppState) -> Result<&GithubClient> {
    state.github.as_ref().ok_or_else(|| {
        EditorError::Internal(
            "GitHub OAuth not configured. Please set GITHUB_CLIENT_SECRET environment variable."
                .to_string(),
        )
    })
}

pub async fn github_callback(
    State(state): State<AppState>,
    Json(body): Json<CallbackBody>,
) -> Result<impl IntoResponse> {
    let code = body
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| EditorError::ValidationError("Missing authorization code".to_string()))?;
    let client = configured_client(&state)?;

    let session = client.exchange_code(code, body.state.as_deref()).await?;
    Ok(Json(session))
}

pub async fn current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(EditorError::Unauthorized)?;
    let client = configured_client(&state)?;

    let user = client.fetch_user(token).await?;
    Ok(Json(user))
}

/// Logout is client-side token removal; GitHub has no revocation API for
/// OAuth app tokens.
pub async fn logout() -> impl IntoResponse {
    Json(json!({ "message": "Logout successful" }))
}
