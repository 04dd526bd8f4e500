//! Pet catalog handlers.

use crate::api::{pet_err_to_api, ApiError};
use crate::api_upload::{store_image, UploadedImage};
use crate::AppState;
use axum::{
    extract::{Extension, Form, FromRequest, Multipart, Path, Request},
    http::{header, HeaderMap, StatusCode},
    response::Json,
};
use petstore_pets::{create_pet, delete_pet, get_pet, list_pets, NewPet, Pet};
use serde_json::{json, Value};
use std::sync::Arc;

/// Text and file fields of a create-pet form, before defaults are applied.
///
/// When a field is repeated, the first occurrence is kept.
#[derive(Debug, Default)]
pub struct PetForm {
    pub name: Option<String>,
    pub pet_type: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub image: Option<UploadedImage>,
}

impl PetForm {
    fn text_slot(&mut self, field: &str) -> Option<&mut Option<String>> {
        match field {
            "name" => Some(&mut self.name),
            "type" => Some(&mut self.pet_type),
            "price" => Some(&mut self.price),
            "description" => Some(&mut self.description),
            _ => None,
        }
    }

    /// Builds a form from decoded `application/x-www-form-urlencoded` pairs.
    /// Such a body cannot carry an image.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = PetForm::default();
        for (name, value) in pairs {
            if let Some(slot) = form.text_slot(&name) {
                slot.get_or_insert(value);
            }
        }
        form
    }

    /// Reads every multipart field; unknown fields are skipped.
    ///
    /// An `image` part without a filename is treated as a plain form field
    /// and ignored.
    pub async fn from_multipart(multipart: &mut Multipart) -> Result<Self, ApiError> {
        let mut form = PetForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("multipart error: {}", e)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == "image" {
                let Some(file_name) = field.file_name().map(str::to_string) else {
                    continue;
                };
                if form.image.is_some() {
                    continue;
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {}", e)))?;
                form.image = Some(UploadedImage {
                    file_name,
                    data: data.to_vec(),
                });
                continue;
            }

            let Some(slot) = form.text_slot(&name) else {
                continue;
            };
            if slot.is_some() {
                continue;
            }
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read field '{}': {}", name, e)))?;
            slot.get_or_insert(value);
        }

        Ok(form)
    }

    /// Decodes the request body according to its content type.
    ///
    /// Multipart and url-encoded bodies are read as forms. Any other body
    /// carries no form fields, so every field takes its default.
    pub async fn from_request(request: Request) -> Result<Self, ApiError> {
        match media_type(request.headers()).as_deref() {
            Some("multipart/form-data") => {
                let mut multipart = Multipart::from_request(request, &())
                    .await
                    .map_err(|rejection| {
                        ApiError::BadRequest(format!("invalid form: {}", rejection.body_text()))
                    })?;
                Self::from_multipart(&mut multipart).await
            }
            Some("application/x-www-form-urlencoded") => {
                let Form(pairs) = Form::<Vec<(String, String)>>::from_request(request, &())
                    .await
                    .map_err(|rejection| {
                        ApiError::BadRequest(format!("invalid form: {}", rejection.body_text()))
                    })?;
                Ok(Self::from_pairs(pairs))
            }
            _ => Ok(PetForm::default()),
        }
    }
}

/// Lowercased media type of the request, without parameters.
fn media_type(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let essence = value.split(';').next().unwrap_or("").trim();
    Some(essence.to_ascii_lowercase())
}

/// Parses a path id. Only plain decimal digits name a pet; anything else,
/// including a sign, is reported as not found.
pub fn parse_pet_id(raw: &str) -> Result<i64, ApiError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::pet_not_found());
    }
    raw.parse().map_err(|_| ApiError::pet_not_found())
}

/// Coerces the submitted price to an integer. A missing price is zero.
pub fn parse_price(raw: Option<&str>) -> Result<i64, ApiError> {
    match raw {
        None => Ok(0),
        Some(raw) => raw.trim().parse::<i64>().map_err(|e| {
            ApiError::BadRequest(format!("invalid price '{}': {}", raw, e))
        }),
    }
}

/// GET /pets
pub async fn list_pets_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<Pet>>, ApiError> {
    let pets = tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for list_pets");
            ApiError::InternalServerError(format!("db connection failed: {}", e))
        })?;
        list_pets(&conn).map_err(pet_err_to_api)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(pets))
}

/// GET /pets/{id}
pub async fn get_pet_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Pet>, ApiError> {
    let id = parse_pet_id(&id)?;

    let pet = tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for get_pet");
            ApiError::InternalServerError(format!("db connection failed: {}", e))
        })?;
        get_pet(&conn, id).map_err(pet_err_to_api)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(pet))
}

/// POST /pets
///
/// Reads `name`, `type`, `price` and `description` from a multipart or
/// url-encoded form, plus an optional `image` file from a multipart one.
/// Any failure while creating the pet is reported as 400 with the underlying
/// message.
pub async fn create_pet_handler(
    Extension(state): Extension<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<Pet>), ApiError> {
    let form = PetForm::from_request(request).await?;
    let price = parse_price(form.price.as_deref())?;
    let image_url = store_image(&state.upload_dir, form.image, &state.default_image_url).await?;

    let new_pet = NewPet {
        name: form.name.unwrap_or_else(|| "Unnamed".to_string()),
        pet_type: form.pet_type.unwrap_or_else(|| "dog".to_string()),
        price,
        description: Some(form.description.unwrap_or_default()),
        image_url: Some(image_url),
    };

    let pet = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::BadRequest(format!("db connection failed: {}", e)))?;
        create_pet(&conn, &new_pet).map_err(|e| ApiError::BadRequest(e.to_string()))
    })
    .await
    .map_err(|e| ApiError::BadRequest(format!("task join error: {}", e)))?
    .inspect_err(|e| tracing::error!(error = %e, "create_pet failed"))?;

    tracing::info!(pet_id = pet.id, name = %pet.name, "pet created");

    Ok((StatusCode::CREATED, Json(pet)))
}

/// DELETE /pets/{id}
pub async fn delete_pet_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_pet_id(&id)?;

    tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for delete_pet");
            ApiError::InternalServerError(format!("db connection failed: {}", e))
        })?;
        delete_pet(&conn, id).map_err(pet_err_to_api)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    tracing::info!(pet_id = id, "pet deleted");

    Ok(Json(json!({"message": "Pet deleted successfully"})))
}
