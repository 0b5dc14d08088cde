use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FollowStats {
    #[serde(default)]
    pub followers_count: i64,
    #[serde(default)]
    pub following_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FollowingStatus {
    pub is_following: bool,
}
