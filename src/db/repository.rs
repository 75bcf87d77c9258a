//! Database repository for CRUD operations.
//!
//! All reads and writes are scoped to the owning user; a row owned by someone
//! else behaves exactly like a missing row. Nested tag/ingredient attachment
//! runs inside transactions.

use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    CreateRecipeRequest, Ingredient, Recipe, RecipeImage, Tag, UpdateIngredientRequest,
    UpdateRecipeRequest, UpdateTagRequest, UpdateUserRequest, User,
};

const USER_COLUMNS: &str = "id, email, name, password_hash, is_active, is_staff, created_at";

const RECIPE_COLUMNS: &str = "id, title, description, time_minutes, price, link, image, date_added";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: PgPool,
}

impl Repository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== USER OPERATIONS ====================

    /// Create a new user. The password must already be hashed.
    pub async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let id = Uuid::new_v4();

        let result = sqlx::query(&format!(
            "INSERT INTO users (id, email, name, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(user_from_row(&row)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                AppError::Validation("A user with this email already exists".to_string()),
            ),
            Err(err) => Err(err.into()),
        }
    }

    /// Get a user by email (the login identifier).
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Update the given user's profile fields. Absent fields are untouched.
    pub async fn update_user(
        &self,
        id: Uuid,
        request: &UpdateUserRequest,
        password_hash: Option<String>,
    ) -> Result<User, AppError> {
        let result = sqlx::query(&format!(
            "UPDATE users SET \
                email = COALESCE($2, email), \
                name = COALESCE($3, name), \
                password_hash = COALESCE($4, password_hash) \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&request.email)
        .bind(&request.name)
        .bind(&password_hash)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(row)) => Ok(user_from_row(&row)),
            Ok(None) => Err(AppError::NotFound(format!("User {} not found", id))),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                AppError::Validation("A user with this email already exists".to_string()),
            ),
            Err(err) => Err(err.into()),
        }
    }

    // ==================== TOKEN OPERATIONS ====================

    /// Return the user's existing token key, creating one if none exists.
    pub async fn get_or_create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let existing = sqlx::query("SELECT key FROM auth_tokens WHERE user_id = $1 LIMIT 1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = existing {
            return Ok(row.get("key"));
        }

        let key = crate::auth::generate_token_key();
        sqlx::query("INSERT INTO auth_tokens (key, user_id) VALUES ($1, $2)")
            .bind(&key)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(key)
    }

    /// Resolve a token key to its user.
    pub async fn get_user_by_token(&self, key: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT u.id, u.email, u.name, u.password_hash, u.is_active, u.is_staff, u.created_at \
             FROM users u JOIN auth_tokens t ON t.user_id = u.id WHERE t.key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    // ==================== RECIPE OPERATIONS ====================

    /// List the user's recipes, newest first, optionally restricted to those
    /// holding any of the given tag/ingredient ids.
    pub async fn list_recipes(
        &self,
        user_id: Uuid,
        tag_ids: &[Uuid],
        ingredient_ids: &[Uuid],
    ) -> Result<Vec<Recipe>, AppError> {
        let mut sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE user_id = $1");
        let mut next_param = 2;

        if !tag_ids.is_empty() {
            sql.push_str(&format!(
                " AND id IN (SELECT recipe_id FROM recipe_tags WHERE tag_id = ANY(${next_param}))"
            ));
            next_param += 1;
        }
        if !ingredient_ids.is_empty() {
            sql.push_str(&format!(
                " AND id IN (SELECT recipe_id FROM recipe_ingredients \
                 WHERE ingredient_id = ANY(${next_param}))"
            ));
        }
        sql.push_str(" ORDER BY date_added DESC, id");

        let mut query = sqlx::query(&sql).bind(user_id);
        if !tag_ids.is_empty() {
            query = query.bind(tag_ids.to_vec());
        }
        if !ingredient_ids.is_empty() {
            query = query.bind(ingredient_ids.to_vec());
        }

        let rows = query.fetch_all(&self.pool).await?;

        let mut recipes = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut recipe = recipe_from_row(row);
            self.load_recipe_relations(&mut recipe).await?;
            recipes.push(recipe);
        }
        Ok(recipes)
    }

    /// Get one of the user's recipes by ID.
    pub async fn get_recipe(&self, user_id: Uuid, id: Uuid) -> Result<Option<Recipe>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let mut recipe = recipe_from_row(&row);
                self.load_recipe_relations(&mut recipe).await?;
                Ok(Some(recipe))
            }
            None => Ok(None),
        }
    }

    /// Create a recipe. Nested tags/ingredients are get-or-created for the
    /// user and attached, all in one transaction.
    pub async fn create_recipe(
        &self,
        user_id: Uuid,
        request: &CreateRecipeRequest,
    ) -> Result<Recipe, AppError> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "INSERT INTO recipes (id, user_id, title, description, time_minutes, price, link) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.time_minutes)
        .bind(request.price)
        .bind(&request.link)
        .fetch_one(&mut *tx)
        .await?;

        let mut recipe = recipe_from_row(&row);

        for tag in &request.tags {
            let tag = get_or_create_tag(&mut tx, user_id, &tag.name).await?;
            attach_tag(&mut tx, id, tag.id).await?;
        }
        for ingredient in &request.ingredients {
            let ingredient = get_or_create_ingredient(&mut tx, user_id, &ingredient.name).await?;
            attach_ingredient(&mut tx, id, ingredient.id).await?;
        }

        tx.commit().await?;

        // Reload so the response carries the same name-sorted collections as
        // every subsequent fetch
        self.load_recipe_relations(&mut recipe).await?;
        Ok(recipe)
    }

    /// Update one of the user's recipes. When nested tags/ingredients are
    /// present, the attachment set is cleared and rebuilt.
    pub async fn update_recipe(
        &self,
        user_id: Uuid,
        id: Uuid,
        request: &UpdateRecipeRequest,
    ) -> Result<Recipe, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "UPDATE recipes SET \
                title = COALESCE($3, title), \
                description = COALESCE($4, description), \
                time_minutes = COALESCE($5, time_minutes), \
                price = COALESCE($6, price), \
                link = COALESCE($7, link) \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.time_minutes)
        .bind(request.price)
        .bind(&request.link)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", id)))?;

        let mut recipe = recipe_from_row(&row);

        if let Some(tags) = &request.tags {
            sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for tag in tags {
                let tag = get_or_create_tag(&mut tx, user_id, &tag.name).await?;
                attach_tag(&mut tx, id, tag.id).await?;
            }
        }
        if let Some(ingredients) = &request.ingredients {
            sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for ingredient in ingredients {
                let ingredient =
                    get_or_create_ingredient(&mut tx, user_id, &ingredient.name).await?;
                attach_ingredient(&mut tx, id, ingredient.id).await?;
            }
        }

        tx.commit().await?;

        self.load_recipe_relations(&mut recipe).await?;
        Ok(recipe)
    }

    /// Delete one of the user's recipes.
    pub async fn delete_recipe(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Recipe {} not found", id)));
        }
        Ok(())
    }

    /// Record the stored image path for one of the user's recipes.
    pub async fn set_recipe_image(
        &self,
        user_id: Uuid,
        id: Uuid,
        image: &str,
    ) -> Result<RecipeImage, AppError> {
        let row = sqlx::query(
            "UPDATE recipes SET image = $3 WHERE id = $1 AND user_id = $2 RETURNING id, image",
        )
        .bind(id)
        .bind(user_id)
        .bind(image)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", id)))?;

        Ok(RecipeImage {
            id: row.get("id"),
            image: row.get::<Option<String>, _>("image").unwrap_or_default(),
        })
    }

    /// Load a recipe's attached tags and ingredients.
    async fn load_recipe_relations(&self, recipe: &mut Recipe) -> Result<(), AppError> {
        let tag_rows = sqlx::query(
            "SELECT t.id, t.name FROM tags t \
             JOIN recipe_tags rt ON rt.tag_id = t.id \
             WHERE rt.recipe_id = $1 ORDER BY t.name",
        )
        .bind(recipe.id)
        .fetch_all(&self.pool)
        .await?;
        recipe.tags = tag_rows.iter().map(tag_from_row).collect();

        let ingredient_rows = sqlx::query(
            "SELECT i.id, i.name FROM ingredients i \
             JOIN recipe_ingredients ri ON ri.ingredient_id = i.id \
             WHERE ri.recipe_id = $1 ORDER BY i.name",
        )
        .bind(recipe.id)
        .fetch_all(&self.pool)
        .await?;
        recipe.ingredients = ingredient_rows.iter().map(ingredient_from_row).collect();

        Ok(())
    }

    // ==================== TAG OPERATIONS ====================

    /// List the user's tags, name descending. With `assigned_only`, restrict
    /// to tags attached to at least one recipe.
    pub async fn list_tags(&self, user_id: Uuid, assigned_only: bool) -> Result<Vec<Tag>, AppError> {
        let sql = if assigned_only {
            "SELECT id, name FROM tags WHERE user_id = $1 \
             AND id IN (SELECT tag_id FROM recipe_tags) ORDER BY name DESC"
        } else {
            "SELECT id, name FROM tags WHERE user_id = $1 ORDER BY name DESC"
        };

        let rows = sqlx::query(sql).bind(user_id).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(tag_from_row).collect())
    }

    /// Create a new tag for the user.
    pub async fn create_tag(&self, user_id: Uuid, name: &str) -> Result<Tag, AppError> {
        let id = Uuid::new_v4();

        let result = sqlx::query(
            "INSERT INTO tags (id, user_id, name) VALUES ($1, $2, $3) RETURNING id, name",
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(tag_from_row(&row)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                AppError::Validation(format!("Tag '{}' already exists", name)),
            ),
            Err(err) => Err(err.into()),
        }
    }

    /// Update one of the user's tags.
    pub async fn update_tag(
        &self,
        user_id: Uuid,
        id: Uuid,
        request: &UpdateTagRequest,
    ) -> Result<Tag, AppError> {
        let row = sqlx::query(
            "UPDATE tags SET name = COALESCE($3, name) \
             WHERE id = $1 AND user_id = $2 RETURNING id, name",
        )
        .bind(id)
        .bind(user_id)
        .bind(&request.name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tag {} not found", id)))?;

        Ok(tag_from_row(&row))
    }

    /// Delete one of the user's tags.
    pub async fn delete_tag(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tag {} not found", id)));
        }
        Ok(())
    }

    // ==================== INGREDIENT OPERATIONS ====================

    /// List the user's ingredients, name descending. With `assigned_only`,
    /// restrict to ingredients attached to at least one recipe.
    pub async fn list_ingredients(
        &self,
        user_id: Uuid,
        assigned_only: bool,
    ) -> Result<Vec<Ingredient>, AppError> {
        let sql = if assigned_only {
            "SELECT id, name FROM ingredients WHERE user_id = $1 \
             AND id IN (SELECT ingredient_id FROM recipe_ingredients) ORDER BY name DESC"
        } else {
            "SELECT id, name FROM ingredients WHERE user_id = $1 ORDER BY name DESC"
        };

        let rows = sqlx::query(sql).bind(user_id).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(ingredient_from_row).collect())
    }

    /// Create a new ingredient for the user.
    pub async fn create_ingredient(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<Ingredient, AppError> {
        let id = Uuid::new_v4();

        let result = sqlx::query(
            "INSERT INTO ingredients (id, user_id, name) VALUES ($1, $2, $3) RETURNING id, name",
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(ingredient_from_row(&row)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                AppError::Validation(format!("Ingredient '{}' already exists", name)),
            ),
            Err(err) => Err(err.into()),
        }
    }

    /// Update one of the user's ingredients.
    pub async fn update_ingredient(
        &self,
        user_id: Uuid,
        id: Uuid,
        request: &UpdateIngredientRequest,
    ) -> Result<Ingredient, AppError> {
        let row = sqlx::query(
            "UPDATE ingredients SET name = COALESCE($3, name) \
             WHERE id = $1 AND user_id = $2 RETURNING id, name",
        )
        .bind(id)
        .bind(user_id)
        .bind(&request.name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ingredient {} not found", id)))?;

        Ok(ingredient_from_row(&row))
    }

    /// Delete one of the user's ingredients.
    pub async fn delete_ingredient(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM ingredients WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Ingredient {} not found", id)));
        }
        Ok(())
    }
}

// ==================== ROW MAPPING & TX HELPERS ====================

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        password_hash: row.get("password_hash"),
        is_active: row.get("is_active"),
        is_staff: row.get("is_staff"),
        created_at: row.get("created_at"),
    }
}

fn recipe_from_row(row: &PgRow) -> Recipe {
    Recipe {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        time_minutes: row.get("time_minutes"),
        price: row.get("price"),
        link: row.get("link"),
        image: row.get("image"),
        date_added: row.get("date_added"),
        tags: Vec::new(),
        ingredients: Vec::new(),
    }
}

fn tag_from_row(row: &PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
    }
}

fn ingredient_from_row(row: &PgRow) -> Ingredient {
    Ingredient {
        id: row.get("id"),
        name: row.get("name"),
    }
}

/// Get or create a tag owned by the user, inside the given transaction.
async fn get_or_create_tag(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Uuid,
    name: &str,
) -> Result<Tag, AppError> {
    let row = sqlx::query(
        "INSERT INTO tags (id, user_id, name) VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, name) DO UPDATE SET name = EXCLUDED.name \
         RETURNING id, name",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(name)
    .fetch_one(&mut **tx)
    .await?;

    Ok(tag_from_row(&row))
}

/// Get or create an ingredient owned by the user, inside the given transaction.
async fn get_or_create_ingredient(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Uuid,
    name: &str,
) -> Result<Ingredient, AppError> {
    let row = sqlx::query(
        "INSERT INTO ingredients (id, user_id, name) VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, name) DO UPDATE SET name = EXCLUDED.name \
         RETURNING id, name",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(name)
    .fetch_one(&mut **tx)
    .await?;

    Ok(ingredient_from_row(&row))
}

async fn attach_tag(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    recipe_id: Uuid,
    tag_id: Uuid,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(recipe_id)
    .bind(tag_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn attach_ingredient(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    recipe_id: Uuid,
    ingredient_id: Uuid,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO recipe_ingredients (recipe_id, ingredient_id) VALUES ($1, $2) \
         ON CONFLICT DO NOTHING",
    )
    .bind(recipe_id)
    .bind(ingredient_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
