//! Administrative entry point. The only dedicated route is the admin login;
//! everything else admin-facing reuses the regular routes behind the
//! `require_admin` layer.

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppError,
    models::auth::{LoginRequest, SessionUser},
    state::AppState,
};

/// Same contract as `POST /auth/login`, but non-admin accounts are rejected
/// with 403 before any cookie is issued.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let (session, identity) =
        super::auth::authenticate(&state, &payload.email, &payload.password).await?;

    if !identity.is_admin() {
        return Err(AppError::Forbidden(
            "Administrator access required.".to_string(),
        ));
    }

    if let Err(err) = state.store.touch_last_login(identity.id, Utc::now()).await {
        tracing::warn!(user_id = %identity.id, "Failed to update last_login: {:?}", err);
    }

    let cookies = super::auth::login_cookies(&state, &session, payload.keep_logged);
    Ok((cookies, Json(SessionUser::from(identity))))
}
