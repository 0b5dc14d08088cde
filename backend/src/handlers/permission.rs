//! Creation-permission checks, mounted under `/permission`.
//!
//! Thin wrappers over the platform-evaluated permission RPCs so the frontend
//! can grey out the compose button before the user writes anything. The same
//! RPCs gate the actual create handlers; these endpoints are advisory only.

use axum::{
    extract::{Extension, Path, State},
    Json,
};

use crate::{
    error::AppError,
    models::{
        auth::UserIdentity,
        permission::{PermissionResponse, TopicPermissionCheck},
    },
    state::AppState,
};

pub async fn check_topic_creation(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<TopicPermissionCheck>,
) -> Result<Json<PermissionResponse>, AppError> {
    let allowed = state
        .store
        .can_create_topic(identity.id, &payload.category_slug)
        .await?;
    Ok(Json(PermissionResponse { allowed }))
}

pub async fn check_comment_creation(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(topic_id): Path<i64>,
) -> Result<Json<PermissionResponse>, AppError> {
    let allowed = state
        .store
        .can_create_comment(identity.id, topic_id)
        .await?;
    Ok(Json(PermissionResponse { allowed }))
}
