//! Tag API endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::is_truthy;
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::{CreateTagRequest, Tag, UpdateTagRequest};
use crate::AppState;

/// Query parameters for the tag list endpoint.
#[derive(Debug, Deserialize)]
pub struct TagListQuery {
    /// When 1, only return tags attached to at least one recipe
    #[serde(default)]
    pub assigned_only: Option<i32>,
}

/// GET /api/tags - List the user's tags.
pub async fn list_tags(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<TagListQuery>,
) -> Result<Json<Vec<Tag>>, AppError> {
    let tags = state
        .repo
        .list_tags(user.id, is_truthy(params.assigned_only))
        .await?;
    Ok(Json(tags))
}

/// POST /api/tags - Create a new tag.
pub async fn create_tag(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<Tag>), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Tag name is required".to_string()));
    }

    let tag = state.repo.create_tag(user.id, request.name.trim()).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// PUT/PATCH /api/tags/:id - Update a tag.
pub async fn update_tag(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTagRequest>,
) -> Result<Json<Tag>, AppError> {
    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation(
                "Tag name must not be blank".to_string(),
            ));
        }
    }

    let tag = state.repo.update_tag(user.id, id, &request).await?;
    Ok(Json(tag))
}

/// DELETE /api/tags/:id - Delete a tag.
pub async fn delete_tag(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.repo.delete_tag(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
