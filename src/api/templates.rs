// Community template endpoints: browse, share, like, delete, stats.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::{EditorError, Result};
use crate::store::{self, Author, NewTemplate, TemplateFilter, TemplateSort, TemplateStore};

use super::AppState;

/// GitHub sends numeric user ids; stored author ids are strings. Accept
/// both shapes in request bodies.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl UserId {
    fn as_string(&self) -> String {
        match self {
            UserId::Number(n) => n.to_string(),
            UserId::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserBody {
    pub id: UserId,
    pub name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub profile_url: Option<String>,
}

impl UserBody {
    fn to_author(&self) -> Author {
        Author {
            id: self.id.as_string(),
            name: self.name.clone(),
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
            profile_url: self.profile_url.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub category: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub sort: TemplateSort,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub emoji: Option<String>,
    pub category: Option<String>,
    pub yaml_content: Option<String>,
    pub filename: Option<String>,
    pub author: Option<UserBody>,
}

#[derive(Debug, Deserialize)]
pub struct UserActionBody {
    pub user: Option<UserBody>,
}

#[derive(Debug, Deserialize)]
pub struct LikesQuery {
    pub user_id: Option<String>,
}

fn request_meta(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());
    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    (ip, user_agent)
}

fn required_user(user: Option<&UserBody>) -> Result<Author> {
    user.map(UserBody::to_author).ok_or(EditorError::Unauthorized)
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.store.list_templates(&TemplateFilter {
        page: query.page,
        limit: query.limit,
        category: query.category,
        author: query.author,
        featured: query.featured,
        sort: query.sort,
    })?;
    Ok(Json(page))
}

pub async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let template = state
        .store
        .get_template(id)?
        .ok_or_else(|| EditorError::NotFound("Template not found".to_string()))?;

    state.store.increment_view_count(id)?;
    let (ip, user_agent) = request_meta(&headers);
    state
        .store
        .record_event(id, "view", None, ip.as_deref(), user_agent.as_deref())?;

    Ok(Json(template))
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse> {
    let title = body
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let yaml_content = body.yaml_content.as_deref().filter(|c| !c.trim().is_empty());
    let (title, yaml_content) = match (title, yaml_content) {
        (Some(title), Some(yaml_content)) => (title, yaml_content),
        _ => {
            return Err(EditorError::ValidationError(
                "Title and YAML content are required".to_string(),
            ))
        }
    };
    let author = required_user(body.author.as_ref())?;

    let content_hash = store::content_hash(title, yaml_content);
    if let Some((existing_id, existing_title)) = state.store.find_template_by_hash(&content_hash)? {
        return Ok((
            StatusCode::CONFLICT,
            Json(json!({
                "error": "Duplicate template",
                "message": format!(
                    "A template with the title \"{existing_title}\" and identical content already exists"
                ),
                "existing_id": existing_id,
            })),
        )
            .into_response());
    }

    let id = state.store.create_template(&NewTemplate {
        title,
        description: body.description.as_deref(),
        emoji: body.emoji.as_deref().unwrap_or("📝"),
        category: body.category.as_deref(),
        yaml_content,
        filename: body.filename.as_deref().unwrap_or("dstack.yml"),
        author: &author,
        content_hash: &content_hash,
    })?;

    let (ip, user_agent) = request_meta(&headers);
    state.store.record_event(
        id,
        "share",
        Some(&author.id),
        ip.as_deref(),
        user_agent.as_deref(),
    )?;

    let template = state
        .store
        .get_template(id)?
        .ok_or_else(|| EditorError::NotFound("Template not found".to_string()))?;
    Ok((StatusCode::CREATED, Json(template)).into_response())
}

pub async fn toggle_like(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<UserActionBody>,
) -> Result<impl IntoResponse> {
    let user = required_user(body.user.as_ref())?;

    if state.store.get_template(id)?.is_none() {
        return Err(EditorError::NotFound("Template not found".to_string()));
    }

    let liked = state.store.toggle_like(id, &user)?;
    let (ip, user_agent) = request_meta(&headers);
    let action = if liked { "like" } else { "unlike" };
    state
        .store
        .record_event(id, action, Some(&user.id), ip.as_deref(), user_agent.as_deref())?;

    let message = if liked {
        "Template liked"
    } else {
        "Template unliked"
    };
    Ok(Json(json!({ "liked": liked, "message": message })))
}

pub async fn like_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<LikesQuery>,
) -> Result<impl IntoResponse> {
    let status = state
        .store
        .like_status(id, query.user_id.as_deref())?
        .ok_or_else(|| EditorError::NotFound("Template not found".to_string()))?;
    Ok(Json(status))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UserActionBody>,
) -> Result<impl IntoResponse> {
    let user = required_user(body.user.as_ref())?;

    let author_id = state
        .store
        .template_author(id)?
        .ok_or_else(|| EditorError::NotFound("Template not found".to_string()))?;
    if author_id != user.id {
        return Err(EditorError::Forbidden(
            "Not authorized to delete this template".to_string(),
        ));
    }

    state.store.delete_template(id)?;
    Ok(Json(json!({ "message": "Template deleted successfully" })))
}

pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let stats = state.store.stats_overview()?;
    Ok(Json(stats))
}
