pub mod config;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod platform;
pub mod services;
pub mod state;
pub mod utils;
pub mod validation;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::state::AppState;

/// Routes reachable without a session.
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/auth/change-password", put(handlers::auth::change_password))
        .route("/admin/login", post(handlers::admin::login))
        .route("/profile/{username}", get(handlers::profile::get_profile))
        .route("/categories", get(handlers::category::list_categories))
        .route(
            "/categories/topics/category/{category}",
            get(handlers::category::topics_by_category),
        )
        .route("/posts/{id}", get(handlers::topic::get_topic))
        .route("/posts/slug/{slug}", get(handlers::topic::get_topic_by_slug))
        .route("/follow/stats/{username}", get(handlers::follow::stats))
        .route("/follow/followers/{username}", get(handlers::follow::followers))
        .route("/follow/following/{username}", get(handlers::follow::following))
        .route("/forum/stats", get(handlers::forum::stats))
        .route("/forum/posts/recent", get(handlers::forum::recent_posts))
        .route("/forum/online", get(handlers::forum::online_users))
        .route("/user/all", get(handlers::user::list_users))
        .route("/user/ws/ping", get(handlers::user::presence_ws))
        .route(
            "/statistic/profile/{username}/stats",
            get(handlers::statistic::user_stats),
        )
        .route(
            "/statistic/profile/{username}/topics",
            get(handlers::statistic::user_topics),
        )
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(docs::ApiDoc::openapi()) }),
        )
}

/// Session introspection: the session is attached when present, anonymous
/// callers get `null` instead of a 401.
fn session_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/session", get(handlers::auth::session))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::session::attach_session,
        ))
}

fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/update-password", patch(handlers::auth::update_password))
        .route("/auth/delete-account", delete(handlers::auth::delete_account))
        .route("/profile/update", put(handlers::profile::update_profile))
        .route(
            "/profile/update-data",
            patch(handlers::profile::update_profile_data),
        )
        .route(
            "/profile/user/avatar",
            patch(handlers::profile::upload_avatar).delete(handlers::profile::delete_avatar),
        )
        .route("/posts", post(handlers::topic::create_topic))
        .route(
            "/posts/{id}",
            patch(handlers::topic::update_topic).delete(handlers::topic::delete_topic),
        )
        .route("/posts/{id}/comments", post(handlers::topic::create_comment))
        .route(
            "/posts/comments/{id}",
            patch(handlers::topic::update_comment).delete(handlers::topic::delete_comment),
        )
        .route(
            "/follow/{username}",
            post(handlers::follow::follow).delete(handlers::follow::unfollow),
        )
        .route(
            "/follow/is-following/{username}",
            get(handlers::follow::is_following),
        )
        .route(
            "/follow/remove-follower/{username}",
            delete(handlers::follow::remove_follower),
        )
        .route("/user/ping", post(handlers::user::ping))
        .route(
            "/permission/topics/check-permission",
            post(handlers::permission::check_topic_creation),
        )
        .route(
            "/permission/comments/{topic_id}/check-permission",
            get(handlers::permission::check_comment_creation),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::session::require_user,
        ))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        // Session cookies ride on cross-origin requests.
        .allow_credentials(true)
}

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(public_routes())
        .merge(session_routes(state.clone()))
        .merge(user_routes(state.clone()))
        .layer(axum_middleware::from_fn(middleware::request_id::request_id))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state))
        .with_state(state)
}
