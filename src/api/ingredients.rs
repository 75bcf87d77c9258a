//! Ingredient API endpoints.

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
use crate::models::{CreateIngredientRequest, Ingredient, UpdateIngredientRequest};
use crate::AppState;

/// Query parameters for the ingredient list endpoint.
#[derive(Debug, Deserialize)]
pub struct IngredientListQuery {
    /// When 1, only return ingredients attached to at least one recipe
    #[serde(default)]
    pub assigned_only: Option<i32>,
}

/// GET /api/ingredients - List the user's ingredients.
pub async fn list_ingredients(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<IngredientListQuery>,
) -> Result<Json<Vec<Ingredient>>, AppError> {
    let ingredients = state
        .repo
        .list_ingredients(user.id, is_truthy(params.assigned_only))
        .await?;
    Ok(Json(ingredients))
}

/// POST /api/ingredients - Create a new ingredient.
pub async fn create_ingredient(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<CreateIngredientRequest>,
) -> Result<(StatusCode, Json<Ingredient>), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation(
            "Ingredient name is required".to_string(),
        ));
    }

    let ingredient = state
        .repo
        .create_ingredient(user.id, request.name.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(ingredient)))
}

/// PUT/PATCH /api/ingredients/:id - Update an ingredient.
pub async fn update_ingredient(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateIngredientRequest>,
) -> Result<Json<Ingredient>, AppError> {
    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation(
                "Ingredient name must not be blank".to_string(),
            ));
        }
    }

    let ingredient = state.repo.update_ingredient(user.id, id, &request).await?;
    Ok(Json(ingredient))
}

/// DELETE /api/ingredients/:id - Delete an ingredient.
pub async fn delete_ingredient(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.repo.delete_ingredient(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
