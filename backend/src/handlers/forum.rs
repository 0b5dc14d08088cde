//! Forum-wide read endpoints: stats, recent posts, online users.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    models::forum::{ForumStats, OnlineUser, RecentPost},
    services::presence::PresenceTracker,
    state::AppState,
};

pub async fn stats(State(state): State<AppState>) -> Result<Json<ForumStats>, AppError> {
    let (active_members, total_topics, total_comments, newest_member) = tokio::try_join!(
        state.store.count_profiles(),
        state.store.count_topics(),
        state.store.count_comments(),
        state.store.newest_member(),
    )?;

    Ok(Json(ForumStats {
        active_members,
        total_topics,
        total_posts: total_topics + total_comments,
        newest_member,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    limit: Option<i64>,
}

const DEFAULT_RECENT_LIMIT: i64 = 5;
const MAX_RECENT_LIMIT: i64 = 20;

pub async fn recent_posts(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<RecentPost>>, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT);
    Ok(Json(state.store.recent_posts(limit).await?))
}

pub async fn online_users(State(state): State<AppState>) -> Result<Json<Vec<OnlineUser>>, AppError> {
    let tracker = PresenceTracker::new(state.presence.clone(), state.hub.clone());
    Ok(Json(tracker.list_online().await?))
}
