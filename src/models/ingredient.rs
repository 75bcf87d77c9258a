//! Ingredient model, scoped to the owning user like tags.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An ingredient that can be attached to recipes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
}

/// Request body for creating an ingredient. Also used as the nested
/// ingredient payload inside recipe create/update bodies.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateIngredientRequest {
    pub name: String,
}

/// Request body for updating an ingredient.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateIngredientRequest {
    #[serde(default)]
    pub name: Option<String>,
}
