// Group endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::error::{EditorError, Result};
use crate::store::{groups::slugify, GroupStore};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct GroupBody {
    pub name: Option<String>,
    pub description: Option<String>,
}

fn required_name(body: &GroupBody) -> Result<String> {
    match &body.name {
        Some(name) if !name.trim().is_empty() => Ok(name.trim().to_string()),
        _ => Err(EditorError::ValidationError(
            "Group name is required".to_string(),
        )),
    }
}

fn clean_description(body: &GroupBody) -> Option<String> {
    body.description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let groups = state.store.get_groups()?;
    Ok(Json(groups))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<GroupBody>,
) -> Result<impl IntoResponse> {
    let name = required_name(&body)?;
    let id = slugify(&name);

    if state.store.get_group(&id)?.is_some() {
        return Err(EditorError::Conflict(
            "A group with this name already exists".to_string(),
        ));
    }

    state
        .store
        .create_group(&id, &name, clean_description(&body).as_deref())?;
    let group = state
        .store
        .get_group(&id)?
        .ok_or_else(|| EditorError::NotFound("Group not found".to_string()))?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let group = state
        .store
        .get_group(&id)?
        .ok_or_else(|| EditorError::NotFound("Group not found".to_string()))?;
    Ok(Json(group))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<GroupBody>,
) -> Result<impl IntoResponse> {
    let name = required_name(&body)?;

    if state.store.get_group(&id)?.is_none() {
        return Err(EditorError::NotFound("Group not found".to_string()));
    }

    state
        .store
        .update_group(&id, &name, clean_description(&body).as_deref())?;
    let group = state
        .store
        .get_group(&id)?
        .ok_or_else(|| EditorError::NotFound("Group not found".to_string()))?;
    Ok(Json(group))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    if id == "default" {
        return Err(EditorError::ValidationError(
            "Cannot delete the default group".to_string(),
        ));
    }
    if state.store.get_group(&id)?.is_none() {
        return Err(EditorError::NotFound("Group not found".to_string()));
    }

    state.store.delete_group(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
