//! Profile pages, self-service profile updates and avatar management.

use axum::{
    extract::{Extension, Multipart, Path, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        auth::{MessageResponse, UserIdentity},
        profile::{AvatarResponse, ProfileDataUpdate, ProfilePublic, ProfileUpdate},
    },
    state::AppState,
};

use super::uploads::{next_field, object_path_from_url, read_image_field, ImageUpload};

const AVATAR_BUCKET: &str = "avatars";

pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ProfilePublic>, AppError> {
    let profile = state
        .store
        .profile_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found.".to_string()))?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    if payload.is_empty() {
        return Err(AppError::BadRequest(
            "No profile fields to update.".to_string(),
        ));
    }
    let matched = state
        .store
        .update_profile_fields(identity.id, &payload)
        .await?;
    if !matched {
        return Err(AppError::NotFound("Profile not found.".to_string()));
    }
    Ok(Json(MessageResponse::new("Profile updated successfully.")))
}

/// Username and e-mail changes. E-mail goes through the platform's admin API
/// and triggers a re-confirmation mail.
pub async fn update_profile_data(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<ProfileDataUpdate>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;

    if payload.username != identity.username {
        if state
            .store
            .find_profile_id_by_username(&payload.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "This username is already taken.".to_string(),
            ));
        }
        state
            .store
            .update_username(identity.id, &payload.username)
            .await?;
    }

    let mut message = "Profile updated successfully.".to_string();
    if let Some(new_email) = payload
        .new_email
        .as_deref()
        .filter(|email| !email.eq_ignore_ascii_case(&identity.email))
    {
        state
            .auth
            .admin_update_email(identity.id, new_email)
            .await?;
        message = "Profile updated. Please confirm your new e-mail address.".to_string();
    }

    Ok(Json(MessageResponse::new(message)))
}

async fn read_avatar_upload(multipart: &mut Multipart) -> Result<ImageUpload, AppError> {
    while let Some(field) = next_field(multipart).await? {
        match field.name().unwrap_or_default() {
            "avatar" | "file" => return read_image_field(field).await,
            _ => continue,
        }
    }
    Err(AppError::BadRequest(
        "Missing avatar file in the upload.".to_string(),
    ))
}

pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    mut multipart: Multipart,
) -> Result<Json<AvatarResponse>, AppError> {
    let upload = read_avatar_upload(&mut multipart).await?;

    let previous = state.store.avatar_url(identity.id).await?;
    let path = format!("{}/{}.{}", identity.id, Uuid::new_v4(), upload.extension);

    state
        .storage
        .upload(AVATAR_BUCKET, &path, upload.bytes, &upload.content_type, true)
        .await
        .map_err(|err| AppError::Storage(err.into()))?;

    // Cache-busting suffix so clients re-fetch after a change.
    let public_url = format!(
        "{}?t={}",
        state.storage.public_url(AVATAR_BUCKET, &path),
        Utc::now().timestamp_millis()
    );
    state
        .store
        .set_avatar_url(identity.id, Some(&public_url))
        .await?;

    // Old object removal is best-effort; an orphan is cheaper than a failed
    // avatar change.
    if let Some(old_path) = previous
        .as_deref()
        .and_then(|url| object_path_from_url(url, AVATAR_BUCKET))
    {
        if old_path != path {
            if let Err(err) = state.storage.remove(AVATAR_BUCKET, &old_path).await {
                tracing::warn!(user_id = %identity.id, "Failed to remove old avatar: {:?}", err);
            }
        }
    }

    Ok(Json(AvatarResponse {
        message: "Avatar updated successfully.".to_string(),
        avatar_url: Some(public_url),
    }))
}

pub async fn delete_avatar(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> Result<Json<AvatarResponse>, AppError> {
    let current = state
        .store
        .avatar_url(identity.id)
        .await?
        .ok_or_else(|| AppError::NotFound("No avatar to remove.".to_string()))?;

    if let Some(path) = object_path_from_url(&current, AVATAR_BUCKET) {
        if let Err(err) = state.storage.remove(AVATAR_BUCKET, &path).await {
            tracing::warn!(user_id = %identity.id, "Failed to remove avatar object: {:?}", err);
        }
    }
    state.store.set_avatar_url(identity.id, None).await?;

    Ok(Json(AvatarResponse {
        message: "Avatar removed successfully.".to_string(),
        avatar_url: None,
    }))
}
