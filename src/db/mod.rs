//! Database module for Postgres persistence.
//!
//! Postgres is the source of truth for all application data. Startup waits
//! for the database to become reachable, then applies migrations.

mod repository;

pub use repository::*;

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use crate::config::Config;

/// How often to retry the initial connection.
const CONNECT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Give up after this many failed connection attempts.
const MAX_CONNECT_ATTEMPTS: u32 = 30;

/// Initialize the database: wait for it to accept connections, then run
/// migrations. This mirrors the container startup contract
/// (wait-for-database, migrate, serve).
pub async fn init_database(config: &Config) -> Result<PgPool, sqlx::Error> {
    let pool = wait_for_database(config).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Connect to Postgres, retrying at a fixed interval until the database is
/// reachable or the attempt budget is exhausted.
async fn wait_for_database(config: &Config) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::new()
        .host(&config.db_host)
        .port(config.db_port)
        .database(&config.db_name)
        .username(&config.db_user)
        .password(&config.db_password);

    let mut attempt = 1u32;
    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .connect_with(options.clone())
            .await
        {
            Ok(pool) => {
                if attempt > 1 {
                    tracing::info!("Database available after {} attempts", attempt);
                }
                return Ok(pool);
            }
            Err(err) if attempt < MAX_CONNECT_ATTEMPTS => {
                tracing::info!(
                    "Database unavailable (attempt {}/{}): {}. Retrying in 1s...",
                    attempt,
                    MAX_CONNECT_ATTEMPTS,
                    err
                );
                tokio::time::sleep(CONNECT_RETRY_INTERVAL).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Run database migrations. All statements are idempotent.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL DEFAULT '',
            password_hash TEXT NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            is_staff BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS auth_tokens (
            key TEXT PRIMARY KEY,
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recipes (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            time_minutes INTEGER NOT NULL,
            price NUMERIC(5, 2) NOT NULL,
            link TEXT NOT NULL DEFAULT '',
            image TEXT,
            date_added TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            UNIQUE (user_id, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ingredients (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            UNIQUE (user_id, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recipe_tags (
            recipe_id UUID NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            tag_id UUID NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            PRIMARY KEY (recipe_id, tag_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recipe_ingredients (
            recipe_id UUID NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            ingredient_id UUID NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
            PRIMARY KEY (recipe_id, ingredient_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Indexes for common queries
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_recipes_user_date ON recipes(user_id, date_added)",
        "CREATE INDEX IF NOT EXISTS idx_tags_user ON tags(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_ingredients_user ON ingredients(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_auth_tokens_user ON auth_tokens(user_id)",
    ];
    for stmt in indexes {
        sqlx::query(stmt).execute(pool).await?;
    }

    Ok(())
}
