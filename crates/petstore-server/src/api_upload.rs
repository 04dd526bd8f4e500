//! Image upload handling for pet creation.
//!
//! Uploaded files are stored under a server-chosen name so that clients can
//! neither overwrite each other nor escape the upload directory. A missing
//! or disallowed extension is not an error: the pet simply gets the default
//! image.

use crate::api::ApiError;
use std::path::Path;
use uuid::Uuid;

/// Maximum upload size: 10 MiB. Enforced as the request body limit.
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Extensions accepted for uploaded images, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// URL prefix under which the upload directory is served.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// An image file received in a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Filename as sent by the client, unsanitized.
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Reduces a client-supplied filename to a safe final path component.
///
/// Directory parts are dropped, every character outside `[A-Za-z0-9._-]` is
/// replaced with `_` and leading dots are stripped, so the result is never a
/// hidden file or a `..` component.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or("");
    let mapped: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    mapped.trim_start_matches('.').to_string()
}

/// Returns true when `file_name` ends in one of [`ALLOWED_EXTENSIONS`].
pub fn has_allowed_extension(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Builds a collision-free storage name: `<random hex>_<sanitized name>`.
pub fn storage_filename(sanitized: &str) -> String {
    format!("{}_{}", Uuid::new_v4().simple(), sanitized)
}

/// Stores an uploaded image and returns the `image_url` for the new pet.
///
/// Returns `default_image_url` without touching the disk when there is no
/// upload or its extension is not allowed. Otherwise the upload directory is
/// created if needed and the file is written under a fresh storage name.
pub async fn store_image(
    upload_dir: &str,
    upload: Option<UploadedImage>,
    default_image_url: &str,
) -> Result<String, ApiError> {
    let Some(upload) = upload else {
        return Ok(default_image_url.to_string());
    };

    let sanitized = sanitize_filename(&upload.file_name);
    if !has_allowed_extension(&sanitized) {
        tracing::info!(
            original_filename = %upload.file_name,
            "upload extension not allowed, using default image"
        );
        return Ok(default_image_url.to_string());
    }

    let filename = storage_filename(&sanitized);

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to create upload dir: {}", e)))?;

    let file_path = Path::new(upload_dir).join(&filename);
    tokio::fs::write(&file_path, &upload.data)
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to write file: {}", e)))?;

    tracing::info!(
        original_filename = %upload.file_name,
        stored_as = %filename,
        size_bytes = upload.data.len(),
        "pet image uploaded"
    );

    Ok(format!("{}/{}", UPLOADS_URL_PREFIX, filename))
}
