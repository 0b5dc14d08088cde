//! Category listing and per-category topic pages.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppError,
    models::{
        category::{Category, TopicSummary},
        PageQuery, Paginated,
    },
    state::AppState,
};

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.store.list_categories().await?))
}

/// Newest-first topic page for one category. Requesting a page past the end
/// is a 404 rather than a silently empty list.
pub async fn topics_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<TopicSummary>>, AppError> {
    if !state.store.category_exists(&category).await? {
        return Err(AppError::NotFound("Category not found.".to_string()));
    }

    let (topics, total_count) = state
        .store
        .topics_by_category(&category, page.offset(), page.limit())
        .await?;
    if topics.is_empty() && page.page() > 1 {
        return Err(AppError::NotFound("Page not found.".to_string()));
    }

    Ok(Json(Paginated {
        data: topics,
        total_count,
    }))
}
