//! Per-user activity statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Profile columns feeding the statistics computation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityProfile {
    pub joined_at: DateTime<Utc>,
    #[serde(default)]
    pub messages_count: i64,
    #[serde(default)]
    pub followers_count: i64,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub topics_count: i64,
    pub topics_per_day: f64,
    /// Share of all forum topics authored by this user, in percent.
    pub topics_percentage: f64,
    pub last_topic_date: Option<DateTime<Utc>>,
    pub messages_count: i64,
    pub messages_per_day: f64,
    pub messages_percentage: f64,
    pub last_post_date: Option<DateTime<Utc>>,
    pub followers_count: i64,
    pub member_since: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}
