//! Profile DTOs: public profile pages, self-service updates, avatars.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::auth::UserRole;

/// Compact author/member summary embedded in topics, comments, follower
/// lists and the online-user list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberProfile {
    pub username: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Public profile page payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfilePublic {
    pub username: String,
    #[serde(default)]
    pub role: UserRole,
    pub joined_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub avatar_url: Option<String>,
    pub gender: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub discord: Option<String>,
    pub steam: Option<String>,
    #[serde(default)]
    pub followers_count: i64,
    #[serde(default)]
    pub following_count: i64,
    #[serde(default)]
    pub messages_count: i64,
}

/// Self-service profile update. Only these fields may be written by the
/// owner; username/e-mail changes go through `ProfileDataUpdate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct ProfileUpdate {
    #[validate(url(message = "must be a valid URL"))]
    pub website: Option<String>,
    pub gender: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub location: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub discord: Option<String>,
    pub steam: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.website.is_none()
            && self.gender.is_none()
            && self.birthdate.is_none()
            && self.location.is_none()
            && self.facebook.is_none()
            && self.instagram.is_none()
            && self.discord.is_none()
            && self.steam.is_none()
    }
}

/// Username and (optionally) e-mail change for the logged-in user.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ProfileDataUpdate {
    #[validate(custom(function = "crate::validation::validate_username"))]
    pub username: String,
    #[validate(email(message = "must be a valid e-mail address"))]
    pub new_email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AvatarResponse {
    pub message: String,
    pub avatar_url: Option<String>,
}

/// Row of the paginated member directory (`GET /user/all`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileListItem {
    pub username: String,
    #[serde(default)]
    pub role: UserRole,
    pub joined_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub messages_count: i64,
}
