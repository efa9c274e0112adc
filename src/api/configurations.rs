// Configuration endpoints. YAML content is validated before it is stored.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{EditorError, Result};
use crate::store::{ConfigurationStore, GroupStore, NewConfiguration, TemplateStore};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub group_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigurationBody {
    pub name: Option<String>,
    pub group_id: Option<String>,
    pub yaml_content: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_template_copy: bool,
    pub source_template_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CopyTemplateBody {
    pub name: Option<String>,
    pub group_id: Option<String>,
    pub template_id: Option<i64>,
    pub description: Option<String>,
}

fn required_trimmed(value: &Option<String>, message: &str) -> Result<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(EditorError::ValidationError(message.to_string())),
    }
}

// YAML bodies are stored exactly as submitted; only the emptiness check trims.
fn required_yaml(value: &Option<String>) -> Result<&str> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(EditorError::ValidationError(
            "YAML content is required".to_string(),
        )),
    }
}

fn validate_yaml(content: &str) -> Result<()> {
    serde_yaml::from_str::<serde_yaml::Value>(content)
        .map(|_| ())
        .map_err(|err| EditorError::ValidationError(format!("Invalid YAML content: {err}")))
}

fn clean_description(description: &Option<String>) -> Option<String> {
    description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

/// Group existence and per-group name uniqueness checks shared by the two
/// creation paths.
fn check_group_and_name(state: &AppState, group_id: &str, name: &str) -> Result<()> {
    if state.store.get_group(group_id)?.is_none() {
        return Err(EditorError::ValidationError(
            "Group does not exist".to_string(),
        ));
    }
    if state.store.configuration_name_exists(group_id, name)? {
        return Err(EditorError::Conflict(
            "A configuration with this name already exists in the selected group".to_string(),
        ));
    }
    Ok(())
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let configs = state.store.get_configurations(query.group_id.as_deref())?;
    Ok(Json(configs))
}

pub async fn list_with_groups(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let configs = state.store.get_configurations_with_groups()?;
    Ok(Json(configs))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<ConfigurationBody>,
) -> Result<impl IntoResponse> {
    let name = required_trimmed(&body.name, "Configuration name is required")?;
    let yaml_content = required_yaml(&body.yaml_content)?;
    validate_yaml(yaml_content)?;

    let group_id = body.group_id.as_deref().unwrap_or("default");
    check_group_and_name(&state, group_id, &name)?;

    let id = Uuid::new_v4().to_string();
    state.store.create_configuration(&NewConfiguration {
        id: &id,
        name: &name,
        group_id,
        yaml_content,
        description: clean_description(&body.description).as_deref(),
        is_template_copy: body.is_template_copy,
        source_template_id: body.source_template_id.as_deref(),
    })?;

    let config = state
        .store
        .get_configuration(&id)?
        .ok_or_else(|| EditorError::NotFound("Configuration not found".to_string()))?;
    Ok((StatusCode::CREATED, Json(config)))
}

pub async fn copy_template(
    State(state): State<AppState>,
    Json(body): Json<CopyTemplateBody>,
) -> Result<impl IntoResponse> {
    let name = required_trimmed(&body.name, "Configuration name is required")?;
    let template_id = body
        .template_id
        .ok_or_else(|| EditorError::ValidationError("Template ID is required".to_string()))?;

    let template = state
        .store
        .get_template(template_id)?
        .ok_or_else(|| EditorError::NotFound("Template not found".to_string()))?;

    let group_id = body.group_id.as_deref().unwrap_or("default");
    check_group_and_name(&state, group_id, &name)?;

    let description = clean_description(&body.description)
        .unwrap_or_else(|| format!("Copied from {} template", template.title));
    let id = Uuid::new_v4().to_string();
    let source_template_id = template_id.to_string();
    state.store.create_configuration(&NewConfiguration {
        id: &id,
        name: &name,
        group_id,
        yaml_content: &template.yaml_content,
        description: Some(&description),
        is_template_copy: true,
        source_template_id: Some(&source_template_id),
    })?;

    let config = state
        .store
        .get_configuration(&id)?
        .ok_or_else(|| EditorError::NotFound("Configuration not found".to_string()))?;
    Ok((StatusCode::CREATED, Json(config)))
}

pub async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let config = state
        .store
        .get_configuration(&id)?
        .ok_or_else(|| EditorError::NotFound("Configuration not found".to_string()))?;
    Ok(Json(config))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ConfigurationBody>,
) -> Result<impl IntoResponse> {
    let name = required_trimmed(&body.name, "Configuration name is required")?;
    let yaml_content = required_yaml(&body.yaml_content)?;
    validate_yaml(yaml_content)?;

    if state.store.get_configuration(&id)?.is_none() {
        return Err(EditorError::NotFound("Configuration not found".to_string()));
    }

    state.store.update_configuration(
        &id,
        &name,
        yaml_content,
        clean_description(&body.description).as_deref(),
    )?;
    let config = state
        .store
        .get_configuration(&id)?
        .ok_or_else(|| EditorError::NotFound("Configuration not found".to_string()))?;
    Ok(Json(config))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    if state.store.get_configuration(&id)?.is_none() {
        return Err(EditorError::NotFound("Configuration not found".to_string()));
    }
    state.store.delete_configuration(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
