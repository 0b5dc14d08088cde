//! Session middleware.
//!
//! All three layers resolve the same cookie pair and apply the cookie side
//! effects on their own response: a renewed session re-issues the access
//! cookie, a terminally expired session clears both cookies. `attach_session`
//! leaves anonymous requests through; the `require_*` layers reject them.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::AppError,
    models::auth::UserIdentity,
    services::session::{SessionOutcome, ACCESS_TOKEN_TTL},
    state::AppState,
    utils::cookies::{
        build_auth_cookie, build_clear_cookie, extract_cookie_value, ACCESS_COOKIE_NAME,
        REFRESH_COOKIE_NAME,
    },
};

/// Session resolution plus the Set-Cookie values it produced.
struct ResolvedSession {
    identity: Option<UserIdentity>,
    set_cookies: Vec<String>,
}

fn parse_bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(rest.trim_start())
    } else {
        None
    }
}

async fn resolve_session(state: &AppState, headers: &HeaderMap) -> ResolvedSession {
    let sessions = state.sessions();
    let cookie_options = state.config.cookie_options();

    // A valid Authorization bearer token wins over cookies; an invalid one
    // falls through to the cookie ladder.
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer_token)
    {
        if let Ok(identity) = sessions.identity_for_token(token).await {
            return ResolvedSession {
                identity: Some(identity),
                set_cookies: Vec::new(),
            };
        }
    }

    let cookie_header = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok());
    let access_token = cookie_header.and_then(|raw| extract_cookie_value(raw, ACCESS_COOKIE_NAME));
    let refresh_token =
        cookie_header.and_then(|raw| extract_cookie_value(raw, REFRESH_COOKIE_NAME));
    let had_cookies = access_token.is_some() || refresh_token.is_some();

    let outcome = sessions
        .resolve_cookies(access_token.as_deref(), refresh_token.as_deref())
        .await;

    match outcome {
        SessionOutcome::Valid(identity) => ResolvedSession {
            identity: Some(identity),
            set_cookies: Vec::new(),
        },
        SessionOutcome::Renewed {
            identity,
            access_token,
        } => ResolvedSession {
            identity: Some(identity),
            // The refresh cookie keeps its original expiry; only the access
            // cookie is re-issued.
            set_cookies: vec![build_auth_cookie(
                ACCESS_COOKIE_NAME,
                &access_token,
                ACCESS_TOKEN_TTL,
                cookie_options,
            )],
        },
        SessionOutcome::Expired => ResolvedSession {
            identity: None,
            set_cookies: if had_cookies {
                vec![
                    build_clear_cookie(ACCESS_COOKIE_NAME, cookie_options),
                    build_clear_cookie(REFRESH_COOKIE_NAME, cookie_options),
                ]
            } else {
                Vec::new()
            },
        },
        // A platform outage fails closed: no identity, but the cookies are
        // left alone so the session survives the blip.
        SessionOutcome::Unverified => ResolvedSession {
            identity: None,
            set_cookies: Vec::new(),
        },
    }
}

fn apply_cookies(response: &mut Response, cookies: &[String]) {
    for cookie in cookies {
        if let Ok(value) = HeaderValue::from_str(cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
}

/// Resolves the session if one exists; anonymous requests pass through.
pub async fn attach_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = resolve_session(&state, request.headers()).await;
    if let Some(identity) = resolved.identity {
        request.extensions_mut().insert(identity);
    }
    let mut response = next.run(request).await;
    apply_cookies(&mut response, &resolved.set_cookies);
    response
}

/// Rejects anonymous requests with 401. Cookie side effects still apply so
/// a stale session gets cleared even on the rejection.
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = resolve_session(&state, request.headers()).await;
    let Some(identity) = resolved.identity else {
        let mut response =
            AppError::Unauthenticated("Authentication required.".to_string()).into_response();
        apply_cookies(&mut response, &resolved.set_cookies);
        return response;
    };
    request.extensions_mut().insert(identity);
    let mut response = next.run(request).await;
    apply_cookies(&mut response, &resolved.set_cookies);
    response
}

/// `require_user` plus an administrative role.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = resolve_session(&state, request.headers()).await;
    let Some(identity) = resolved.identity else {
        let mut response =
            AppError::Unauthenticated("Authentication required.".to_string()).into_response();
        apply_cookies(&mut response, &resolved.set_cookies);
        return response;
    };
    if !identity.is_admin() {
        let mut response =
            AppError::Forbidden("Administrator access required.".to_string()).into_response();
        apply_cookies(&mut response, &resolved.set_cookies);
        return response;
    }
    request.extensions_mut().insert(identity);
    let mut response = next.run(request).await;
    apply_cookies(&mut response, &resolved.set_cookies);
    response
}
