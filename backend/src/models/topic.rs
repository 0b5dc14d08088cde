//! Topic and comment DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::profile::MemberProfile;

/// Bare topic row as stored by the platform.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Topic {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub category: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Image attached to a topic or comment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageRef {
    pub id: i64,
    pub url: String,
}

/// Fully shaped topic: author summary, images, and one page of comments.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopicDetail {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub author: MemberProfile,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// A topic page plus the total comment count for pagination.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopicPage {
    pub data: TopicDetail,
    pub total_comments: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Comment {
    pub id: i64,
    pub topic_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub author: MemberProfile,
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

/// Insert payload for a new topic.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NewTopic {
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub category: String,
    pub slug: String,
}

/// Author-scoped partial update; serialized into the platform PATCH body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct TopicUpdate {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub content: Option<String>,
}

impl TopicUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CommentUpdate {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub content: String,
}
