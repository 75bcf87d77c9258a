//! Recipe API endpoints.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::parse_id_list;
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::{
    CreateRecipeRequest, Recipe, RecipeImage, RecipeSummary, UpdateRecipeRequest,
};
use crate::AppState;

/// Query parameters for the recipe list endpoint.
#[derive(Debug, Deserialize)]
pub struct RecipeListQuery {
    /// Comma-separated tag ids to filter by
    #[serde(default)]
    pub tags: Option<String>,
    /// Comma-separated ingredient ids to filter by
    #[serde(default)]
    pub ingredients: Option<String>,
}

/// GET /api/recipes - List the user's recipes (summaries, newest first).
pub async fn list_recipes(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<RecipeListQuery>,
) -> Result<Json<Vec<RecipeSummary>>, AppError> {
    let tag_ids = parse_id_list(params.tags.as_deref())?;
    let ingredient_ids = parse_id_list(params.ingredients.as_deref())?;

    let recipes = state
        .repo
        .list_recipes(user.id, &tag_ids, &ingredient_ids)
        .await?;

    Ok(Json(recipes.into_iter().map(RecipeSummary::from).collect()))
}

/// GET /api/recipes/:id - Get a single recipe with full detail.
pub async fn get_recipe(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Recipe>, AppError> {
    match state.repo.get_recipe(user.id, id).await? {
        Some(recipe) => Ok(Json(recipe)),
        None => Err(AppError::NotFound(format!("Recipe {} not found", id))),
    }
}

/// POST /api/recipes - Create a new recipe.
pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<Recipe>), AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    validate_price(request.price)?;
    validate_names(request.tags.iter().map(|t| t.name.as_str()), "Tag")?;
    validate_names(
        request.ingredients.iter().map(|i| i.name.as_str()),
        "Ingredient",
    )?;

    let recipe = state.repo.create_recipe(user.id, &request).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// PUT/PATCH /api/recipes/:id - Update a recipe.
pub async fn update_recipe(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRecipeRequest>,
) -> Result<Json<Recipe>, AppError> {
    if let Some(title) = &request.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Title must not be blank".to_string()));
        }
    }
    if let Some(price) = request.price {
        validate_price(price)?;
    }
    if let Some(tags) = &request.tags {
        validate_names(tags.iter().map(|t| t.name.as_str()), "Tag")?;
    }
    if let Some(ingredients) = &request.ingredients {
        validate_names(ingredients.iter().map(|i| i.name.as_str()), "Ingredient")?;
    }

    let recipe = state.repo.update_recipe(user.id, id, &request).await?;
    Ok(Json(recipe))
}

/// DELETE /api/recipes/:id - Delete a recipe.
pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.repo.delete_recipe(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/recipes/:id/upload-image - Attach an image to a recipe.
///
/// Expects a multipart body with an `image` file part. The file is stored
/// under `MEDIA_ROOT/uploads/recipe/<uuid>.<ext>` and served at `/media/...`.
pub async fn upload_recipe_image(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<RecipeImage>, AppError> {
    // Ownership check before anything is written to disk
    if state.repo.get_recipe(user.id, id).await?.is_none() {
        return Err(AppError::NotFound(format!("Recipe {} not found", id)));
    }

    let mut stored: Option<String> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }

        let ext = field
            .file_name()
            .and_then(|name| {
                std::path::Path::new(name)
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "bin".to_string());

        let data = field.bytes().await?;
        if data.is_empty() {
            return Err(AppError::Validation(
                "Uploaded image is empty".to_string(),
            ));
        }

        let relative = format!("uploads/recipe/{}.{}", Uuid::new_v4(), ext);
        let path = state.config.media_root.join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;

        stored = Some(format!("/media/{}", relative));
        break;
    }

    let Some(image) = stored else {
        return Err(AppError::Validation(
            "An image file is required".to_string(),
        ));
    };

    let result = state.repo.set_recipe_image(user.id, id, &image).await?;
    Ok(Json(result))
}

fn validate_names<'a>(
    names: impl Iterator<Item = &'a str>,
    kind: &str,
) -> Result<(), AppError> {
    for name in names {
        if name.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "{} name must not be blank",
                kind
            )));
        }
    }
    Ok(())
}

/// Prices persist as NUMERIC(5, 2); reject values the column cannot hold
/// before they reach the database.
fn validate_price(price: Decimal) -> Result<(), AppError> {
    if price.abs() >= Decimal::from(1000) {
        return Err(AppError::Validation(
            "Price must be less than 1000".to_string(),
        ));
    }
    if price.normalize().scale() > 2 {
        return Err(AppError::Validation(
            "Price supports at most two decimal places".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_price_accepts_column_range() {
        assert!(validate_price(Decimal::new(525, 2)).is_ok()); // 5.25
        assert!(validate_price(Decimal::new(99999, 2)).is_ok()); // 999.99
        assert!(validate_price(Decimal::new(5250, 3)).is_ok()); // 5.250
    }

    #[test]
    fn test_validate_price_rejects_overflow() {
        // 1234.56 has too many integral digits for NUMERIC(5, 2)
        assert!(validate_price(Decimal::new(123456, 2)).is_err());
        assert!(validate_price(Decimal::from(1000)).is_err());
        assert!(validate_price(Decimal::from(-1000)).is_err());
    }

    #[test]
    fn test_validate_price_rejects_excess_precision() {
        assert!(validate_price(Decimal::new(5255, 3)).is_err()); // 5.255
    }
}
