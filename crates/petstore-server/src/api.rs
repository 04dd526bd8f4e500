//! Shared API plumbing for the pet store server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use petstore_pets::PetError;
use serde_json::{json, Value};
use thiserror::Error;

/// Message returned for every lookup or delete of an unknown pet.
pub const PET_NOT_FOUND: &str = "Pet not found";

/// API error type mapping to HTTP status codes.
///
/// Every variant renders as `{"error": <message>}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl ApiError {
    pub(crate) fn pet_not_found() -> Self {
        ApiError::NotFound(PET_NOT_FOUND.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Maps a [`PetError`] to an [`ApiError`], logging anything but a miss.
///
/// `NotFound` → 404, everything else → 500.
pub(crate) fn pet_err_to_api(e: PetError) -> ApiError {
    match e {
        PetError::NotFound(_) => ApiError::pet_not_found(),
        PetError::Database(err) => {
            tracing::error!(error = %err, "pet query failed");
            ApiError::InternalServerError(format!("db query failed: {}", err))
        }
    }
}

/// Handler for `GET /`.
pub async fn home_handler() -> Json<Value> {
    Json(json!({
        "message": "Pet Store API is running!"
    }))
}
