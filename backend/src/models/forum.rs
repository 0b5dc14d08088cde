//! Forum-wide DTOs: statistics, recent posts, and the online-user list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::auth::UserRole;
use super::profile::MemberProfile;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberSummary {
    pub username: String,
    #[serde(default)]
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForumStats {
    pub active_members: i64,
    pub total_topics: i64,
    /// Topics plus comments.
    pub total_posts: i64,
    pub newest_member: Option<MemberSummary>,
}

/// Row returned by the `get_recent_posts` RPC.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecentPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub author: MemberProfile,
    #[serde(default)]
    pub comment_count: i64,
}

/// Presence entry joined with the profile summary, as broadcast to
/// WebSocket clients and returned by `GET /forum/online`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OnlineUser {
    pub last_seen_at: DateTime<Utc>,
    pub profile: MemberProfile,
}
