//! Account lifecycle: registration, login/logout, session introspection,
//! password recovery and account deletion.

use axum::{
    extract::{Extension, State},
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppError,
    models::auth::{
        AccountDeleteRequest, LoginRequest, MessageResponse, PasswordChangeRequest,
        PasswordRecoveryRequest, PasswordUpdateRequest, RegisterRequest, SessionUser,
        UserIdentity,
    },
    platform::{AuthSession, PlatformError},
    services::session::{ACCESS_TOKEN_TTL, REFRESH_TOKEN_TTL},
    state::AppState,
    utils::cookies::{
        build_auth_cookie, build_clear_cookie, ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME,
    },
};

pub(crate) type SetCookies = AppendHeaders<Vec<(axum::http::HeaderName, String)>>;

/// Set-Cookie headers for a fresh login. The refresh cookie is only issued
/// when the user opted into a persistent session.
pub(crate) fn login_cookies(
    state: &AppState,
    session: &AuthSession,
    keep_logged: bool,
) -> SetCookies {
    let options = state.config.cookie_options();
    let mut headers = vec![(
        SET_COOKIE,
        build_auth_cookie(
            ACCESS_COOKIE_NAME,
            &session.access_token,
            ACCESS_TOKEN_TTL,
            options,
        ),
    )];
    if keep_logged {
        headers.push((
            SET_COOKIE,
            build_auth_cookie(
                REFRESH_COOKIE_NAME,
                &session.refresh_token,
                REFRESH_TOKEN_TTL,
                options,
            ),
        ));
    }
    AppendHeaders(headers)
}

fn clear_cookies(state: &AppState) -> SetCookies {
    let options = state.config.cookie_options();
    AppendHeaders(vec![
        (SET_COOKIE, build_clear_cookie(ACCESS_COOKIE_NAME, options)),
        (SET_COOKIE, build_clear_cookie(REFRESH_COOKIE_NAME, options)),
    ])
}

fn classify_signup_error(err: PlatformError) -> AppError {
    if err.is_already_registered() {
        AppError::Conflict("This e-mail address is already registered.".to_string())
    } else if err.is_weak_password() {
        AppError::BadRequest("Password does not meet the minimum requirements.".to_string())
    } else {
        err.into()
    }
}

fn classify_signin_error(err: PlatformError) -> AppError {
    if err.is_invalid_credentials() {
        AppError::Unauthenticated("Invalid e-mail or password.".to_string())
    } else {
        err.into()
    }
}

/// Signs the caller in and resolves the full identity for the response body.
pub(crate) async fn authenticate(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<(AuthSession, UserIdentity), AppError> {
    let session = state
        .auth
        .sign_in(email, password)
        .await
        .map_err(classify_signin_error)?;
    let identity = state
        .sessions()
        .identity_for_token(&session.access_token)
        .await?;
    Ok((session, identity))
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    payload.validate()?;

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

    let redirect_to = payload
        .email_redirect_to
        .unwrap_or_else(|| format!("{}/auth/confirm", state.config.frontend_url()));
    let user = state
        .auth
        .sign_up(&payload.email, &payload.password, &redirect_to)
        .await
        .map_err(classify_signup_error)?;

    // The profile row and the auth account must exist together; roll the
    // account back if the insert fails.
    if let Err(err) = state.store.insert_profile(user.id, &payload.username).await {
        if let Err(rollback_err) = state.auth.admin_delete_user(user.id).await {
            tracing::error!(
                user_id = %user.id,
                "Failed to roll back auth account after profile insert failure: {:?}",
                rollback_err
            );
        }
        return Err(err.into());
    }

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(
            "Registration successful. Please confirm your e-mail address.",
        )),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let (session, identity) = authenticate(&state, &payload.email, &payload.password).await?;

    // last_login is informational; a failed write must not block the login.
    if let Err(err) = state.store.touch_last_login(identity.id, Utc::now()).await {
        tracing::warn!(user_id = %identity.id, "Failed to update last_login: {:?}", err);
    }

    let cookies = login_cookies(&state, &session, payload.keep_logged);
    Ok((cookies, Json(SessionUser::from(identity))))
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        clear_cookies(&state),
        Json(MessageResponse::new("Logged out successfully.")),
    )
}

/// Optional-session introspection: `null` for anonymous callers.
pub async fn session(identity: Option<Extension<UserIdentity>>) -> Json<Option<SessionUser>> {
    Json(identity.map(|Extension(identity)| SessionUser::from(identity)))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<PasswordRecoveryRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    let redirect_to = format!("{}/reset-password", state.config.frontend_url());
    state
        .auth
        .send_recovery_email(&payload.email, &redirect_to)
        .await?;
    Ok(Json(MessageResponse::new(
        "If the e-mail address exists, a recovery link has been sent.",
    )))
}

/// Recovery flow: the caller presents the access token from the reset link.
pub async fn change_password(
    State(state): State<AppState>,
    Json(payload): Json<PasswordChangeRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    let identity = state
        .sessions()
        .identity_for_token(&payload.access_token)
        .await
        .map_err(|_| {
            AppError::Unauthenticated("Invalid or expired recovery token.".to_string())
        })?;
    state
        .auth
        .admin_update_password(identity.id, &payload.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password updated successfully.")))
}

/// Authenticated flow: the identity comes from the session middleware.
pub async fn update_password(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<PasswordUpdateRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    state
        .auth
        .admin_update_password(identity.id, &payload.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password updated successfully.")))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<AccountDeleteRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Deleting an account requires the current password, not just a cookie.
    state
        .auth
        .sign_in(&identity.email, &payload.password)
        .await
        .map_err(|err| {
            if err.is_invalid_credentials() {
                AppError::Unauthenticated("Password is incorrect.".to_string())
            } else {
                err.into()
            }
        })?;

    state.auth.admin_delete_user(identity.id).await?;
    Ok((
        clear_cookies(&state),
        Json(MessageResponse::new("Account deleted successfully.")),
    ))
}
