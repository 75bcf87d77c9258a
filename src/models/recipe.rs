//! Recipe model and request bodies.
//!
//! The list endpoint returns summaries; the detail endpoint additionally
//! carries the description, image path and creation timestamp.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CreateIngredientRequest, CreateTagRequest, Ingredient, Tag};

/// A recipe with its attached tags and ingredients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub time_minutes: i32,
    /// Serialized as a decimal string, e.g. "5.25"
    pub price: Decimal,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub date_added: DateTime<Utc>,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<Ingredient>,
}

/// Summary projection returned by the recipe list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<Ingredient>,
}

impl From<Recipe> for RecipeSummary {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags: recipe.tags,
            ingredients: recipe.ingredients,
        }
    }
}

/// Response body for the image upload endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeImage {
    pub id: Uuid,
    pub image: String,
}

/// Request body for creating a new recipe.
///
/// Nested tags/ingredients are get-or-created for the authenticated user and
/// attached to the recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecipeRequest {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub tags: Vec<CreateTagRequest>,
    #[serde(default)]
    pub ingredients: Vec<CreateIngredientRequest>,
}

/// Request body for updating an existing recipe.
///
/// When `tags` or `ingredients` is present, the attachment set is replaced
/// wholesale; absent fields are left untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRecipeRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub time_minutes: Option<i32>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<CreateTagRequest>>,
    #[serde(default)]
    pub ingredients: Option<Vec<CreateIngredientRequest>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_recipe() -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            title: "Sample Recipe".to_string(),
            description: "Sample description".to_string(),
            time_minutes: 22,
            price: Decimal::from_str("5.25").unwrap(),
            link: "http://example.com/recipe.pdf".to_string(),
            image: None,
            date_added: Utc::now(),
            tags: vec![],
            ingredients: vec![],
        }
    }

    #[test]
    fn test_price_serializes_as_string() {
        let json = serde_json::to_value(sample_recipe()).unwrap();
        assert_eq!(json["price"], "5.25");
    }

    #[test]
    fn test_summary_has_no_description() {
        let summary = RecipeSummary::from(sample_recipe());
        let json = serde_json::to_value(summary).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["title"], "Sample Recipe");
        assert_eq!(json["time_minutes"], 22);
    }

    #[test]
    fn test_create_request_accepts_nested_tags() {
        let body = serde_json::json!({
            "title": "Sample Recipe",
            "time_minutes": 30,
            "price": "10.00",
            "tags": [{"name": "Vegan"}, {"name": "Dessert"}]
        });
        let request: CreateRecipeRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.tags.len(), 2);
        assert_eq!(request.tags[0].name, "Vegan");
        assert!(request.ingredients.is_empty());
        assert_eq!(request.description, "");
    }
}
