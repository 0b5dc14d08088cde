//! Per-user activity statistics.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;

use crate::{
    error::AppError,
    models::{category::TopicSummary, statistic::UserStats},
    state::AppState,
};

fn per_day(count: i64, days: i64) -> f64 {
    count as f64 / days.max(1) as f64
}

fn percentage(count: i64, total: i64) -> f64 {
    if total <= 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

pub async fn user_stats(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserStats>, AppError> {
    let user_id = state
        .store
        .find_profile_id_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;
    let activity = state
        .store
        .activity_profile(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    let (topics_count, total_topics, total_comments, last_topic_date, last_post_date) = tokio::try_join!(
        state.store.count_topics_by_author(user_id),
        state.store.count_topics(),
        state.store.count_comments(),
        state.store.last_topic_at(user_id),
        state.store.last_comment_at(user_id),
    )?;

    let member_days = (Utc::now() - activity.joined_at).num_days();

    Ok(Json(UserStats {
        topics_count,
        topics_per_day: per_day(topics_count, member_days),
        topics_percentage: percentage(topics_count, total_topics),
        last_topic_date,
        messages_count: activity.messages_count,
        messages_per_day: per_day(activity.messages_count, member_days),
        messages_percentage: percentage(activity.messages_count, total_comments),
        last_post_date,
        followers_count: activity.followers_count,
        member_since: activity.joined_at,
        last_login: activity.last_login,
    }))
}

pub async fn user_topics(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<TopicSummary>>, AppError> {
    let user_id = state
        .store
        .find_profile_id_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;
    Ok(Json(state.store.topics_by_author(user_id).await?))
}
