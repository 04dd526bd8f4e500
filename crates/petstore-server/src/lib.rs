//! Pet store server library logic.

pub mod api;
pub mod api_pets;
pub mod api_upload;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Extension, Json, Router,
};
use petstore_db::{DbPool, SchemaError};
use petstore_pets::PetError;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Directory for uploaded pet images.
    pub upload_dir: String,
    /// Directory of bundled sample images.
    pub static_images_dir: String,
    /// `image_url` for pets created without a usable upload.
    pub default_image_url: String,
}

/// Errors that can occur while preparing the database at startup.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to get database connection: {0}")]
    Connection(#[from] r2d2::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("failed to seed sample pets: {0}")]
    Seed(#[from] PetError),
}

/// Creates the `pets` table if needed and seeds the catalog if it is empty.
///
/// Returns the number of sample pets inserted.
pub fn init_db(pool: &DbPool) -> Result<usize, InitError> {
    let conn = pool.get()?;
    petstore_db::ensure_schema(&conn)?;
    Ok(petstore_pets::seed_sample_pets(&conn)?)
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    tracing::info!(path = %state.upload_dir, "serving uploaded files at /uploads");
    tracing::info!(path = %state.static_images_dir, "serving static images at /static/images");

    Router::new()
        .route("/", get(api::home_handler))
        .route("/health", get(health))
        .route(
            "/pets",
            get(api_pets::list_pets_handler).post(api_pets::create_pet_handler),
        )
        .route(
            "/pets/{id}",
            get(api_pets::get_pet_handler).delete(api_pets::delete_pet_handler),
        )
        .nest_service("/uploads", ServeDir::new(&state.upload_dir))
        .nest_service("/static/images", ServeDir::new(&state.static_images_dir))
        .layer(DefaultBodyLimit::max(api_upload::MAX_UPLOAD_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
