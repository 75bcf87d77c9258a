//! Tag model. Tags label recipes and are scoped to their owning user.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tag for filtering recipes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

/// Request body for creating a tag. Also used as the nested tag payload
/// inside recipe create/update bodies.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
}

/// Request body for updating a tag.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTagRequest {
    #[serde(default)]
    pub name: Option<String>,
}
