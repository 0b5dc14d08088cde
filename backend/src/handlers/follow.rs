//! Follow relationships. Creation and removal go through platform RPCs so
//! the counters on both profiles stay consistent with the rows.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        auth::{MessageResponse, UserIdentity},
        follow::{FollowStats, FollowingStatus},
        profile::MemberProfile,
    },
    state::AppState,
};

async fn resolve_user_id(state: &AppState, username: &str) -> Result<Uuid, AppError> {
    state
        .store
        .find_profile_id_by_username(username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
}

pub async fn follow(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(username): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let target = resolve_user_id(&state, &username).await?;
    if target == identity.id {
        return Err(AppError::BadRequest(
            "You cannot follow yourself.".to_string(),
        ));
    }
    // Duplicate follows surface as a unique violation, mapped to 409.
    state.store.handle_follow(identity.id, target).await?;
    Ok(Json(MessageResponse::new(format!(
        "You are now following {username}."
    ))))
}

pub async fn unfollow(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(username): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let target = resolve_user_id(&state, &username).await?;
    state.store.handle_unfollow(identity.id, target).await?;
    Ok(Json(MessageResponse::new(format!(
        "You unfollowed {username}."
    ))))
}

pub async fn stats(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<FollowStats>, AppError> {
    let target = resolve_user_id(&state, &username).await?;
    let stats = state
        .store
        .follow_stats(target)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;
    Ok(Json(stats))
}

pub async fn followers(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<MemberProfile>>, AppError> {
    let target = resolve_user_id(&state, &username).await?;
    Ok(Json(state.store.followers(target).await?))
}

pub async fn following(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<MemberProfile>>, AppError> {
    let target = resolve_user_id(&state, &username).await?;
    Ok(Json(state.store.following(target).await?))
}

pub async fn is_following(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(username): Path<String>,
) -> Result<Json<FollowingStatus>, AppError> {
    let target = resolve_user_id(&state, &username).await?;
    let is_following = state.store.is_following(identity.id, target).await?;
    Ok(Json(FollowingStatus { is_following }))
}

/// Removes `username` from the caller's followers.
pub async fn remove_follower(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(username): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let target = resolve_user_id(&state, &username).await?;
    let removed = state.store.remove_follower(target, identity.id).await?;
    if removed == 0 {
        return Err(AppError::NotFound(
            "This user does not follow you.".to_string(),
        ));
    }
    Ok(Json(MessageResponse::new(format!(
        "{username} no longer follows you."
    ))))
}
