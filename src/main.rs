//! Recipe API Backend
//!
//! A REST backend for the recipe catalogue application with Postgres
//! persistence and token authentication. Startup follows the container
//! contract: wait for the database, apply migrations, then serve on :5080.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Recipe API Backend");
    tracing::info!(
        "Database: {}@{}:{}/{}",
        config.db_user,
        config.db_host,
        config.db_port,
        config.db_name
    );
    tracing::info!("Media root: {:?}", config.media_root);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Ensure the media directory exists (the static-assets volume mount)
    tokio::fs::create_dir_all(config.media_root.join("uploads/recipe")).await?;

    // Wait for the database, then run migrations
    let pool = db::init_database(&config).await?;
    let repo = Arc::new(Repository::new(pool));

    // Create application state
    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone state for the auth layer
    let auth_state = state.clone();

    // Routes requiring a valid token
    let protected_routes = Router::new()
        // User profile
        .route(
            "/user/me",
            get(api::me).put(api::update_me).patch(api::update_me),
        )
        // Recipes
        .route("/recipes", get(api::list_recipes).post(api::create_recipe))
        .route(
            "/recipes/{id}",
            get(api::get_recipe)
                .put(api::update_recipe)
                .patch(api::update_recipe)
                .delete(api::delete_recipe),
        )
        .route("/recipes/{id}/upload-image", post(api::upload_recipe_image))
        // Tags
        .route("/tags", get(api::list_tags).post(api::create_tag))
        .route(
            "/tags/{id}",
            axum::routing::put(api::update_tag)
                .patch(api::update_tag)
                .delete(api::delete_tag),
        )
        // Ingredients
        .route(
            "/ingredients",
            get(api::list_ingredients).post(api::create_ingredient),
        )
        .route(
            "/ingredients/{id}",
            axum::routing::put(api::update_ingredient)
                .patch(api::update_ingredient)
                .delete(api::delete_ingredient),
        )
        // Apply token auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::token_auth_layer(auth_state.clone(), req, next)
        }));

    // Public routes (registration and token issuance)
    let public_routes = Router::new()
        .route("/user/create", post(api::register_user))
        .route("/user/token", post(api::obtain_token));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    // Uploaded media, served from the static-assets volume
    let media_service = ServeDir::new(&state.config.media_root);

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .merge(health_routes)
        .nest_service("/media", media_service)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
