//! Shared helpers for multipart image uploads.

use axum::extract::Multipart;

use crate::error::AppError;

pub(crate) const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub(crate) fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Bucket-relative object path extracted from a stored public URL, dropping
/// any cache-busting query suffix.
pub(crate) fn object_path_from_url(url: &str, bucket: &str) -> Option<String> {
    let marker = format!("/{bucket}/");
    let start = url.find(&marker)? + marker.len();
    let path = url[start..].split('?').next()?;
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

pub(crate) struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub extension: &'static str,
}

/// Reads one image field out of a multipart stream, validating type and size.
pub(crate) async fn read_image_field(
    field: axum::extract::multipart::Field<'_>,
) -> Result<ImageUpload, AppError> {
    let content_type = field.content_type().unwrap_or_default().to_string();
    let extension = extension_for(&content_type).ok_or_else(|| {
        AppError::BadRequest("Images must be PNG, JPEG, WebP or GIF.".to_string())
    })?;
    let bytes = field
        .bytes()
        .await
        .map_err(|err| AppError::BadRequest(format!("Failed to read upload: {err}")))?;
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AppError::BadRequest(
            "Image exceeds the 5 MB size limit.".to_string(),
        ));
    }
    Ok(ImageUpload {
        bytes: bytes.to_vec(),
        content_type,
        extension,
    })
}

/// Next multipart field, with malformed payloads mapped to 400.
pub(crate) async fn next_field<'a>(
    multipart: &'a mut Multipart,
) -> Result<Option<axum::extract::multipart::Field<'a>>, AppError> {
    multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("Invalid multipart payload: {err}")))
}
