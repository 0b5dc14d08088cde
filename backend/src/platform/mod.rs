//! Seam to the external auth/database/storage platform.
//!
//! Everything the application persists or verifies goes through the traits
//! in this module. The production implementation (`Supabase`) speaks the
//! platform's REST APIs; tests substitute in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    category::{Category, TopicSummary},
    follow::FollowStats,
    forum::{MemberSummary, OnlineUser, RecentPost},
    profile::{MemberProfile, ProfileListItem, ProfilePublic, ProfileUpdate},
    statistic::ActivityProfile,
    topic::{Comment, NewTopic, Topic, TopicDetail, TopicUpdate},
};

mod supabase;

pub use supabase::Supabase;

#[derive(Debug, Error)]
pub enum PlatformError {
    /// The platform answered with a non-success status.
    #[error("platform API error (status {status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },
    /// A `.single()`-style lookup matched no rows.
    #[error("no rows returned")]
    RowNotFound,
    #[error("platform transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode platform response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl PlatformError {
    fn message_contains(&self, needle: &str) -> bool {
        match self {
            PlatformError::Api { message, .. } => message.to_lowercase().contains(needle),
            _ => false,
        }
    }

    fn code_is(&self, expected: &str) -> bool {
        matches!(self, PlatformError::Api { code: Some(code), .. } if code == expected)
    }

    /// Postgres unique-constraint violation surfaced through the table API.
    pub fn is_unique_violation(&self) -> bool {
        self.code_is("23505") || self.message_contains("duplicate key")
    }

    /// Wrong e-mail/password at sign-in.
    pub fn is_invalid_credentials(&self) -> bool {
        self.code_is("invalid_credentials") || self.message_contains("invalid login credentials")
    }

    /// Sign-up with an e-mail that already has an account.
    pub fn is_already_registered(&self) -> bool {
        self.code_is("user_already_exists") || self.message_contains("already registered")
    }

    /// Password rejected by the platform's strength policy.
    pub fn is_weak_password(&self) -> bool {
        self.code_is("weak_password")
            || self.message_contains("password should be at least 6 characters")
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, PlatformError::Api { status: 429, .. })
    }
}

pub type PlatformResult<T> = Result<T, PlatformError>;

/// Account as known to the platform's auth API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

/// Token pair minted by sign-in or refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: AuthUser,
}

/// Credential store and token authority.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Creates an account and sends the confirmation e-mail.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
    ) -> PlatformResult<AuthUser>;

    async fn sign_in(&self, email: &str, password: &str) -> PlatformResult<AuthSession>;

    /// Validates an access token and returns its subject.
    async fn get_user(&self, access_token: &str) -> PlatformResult<AuthUser>;

    /// Exchanges a refresh token for a fresh session.
    async fn refresh_session(&self, refresh_token: &str) -> PlatformResult<AuthSession>;

    async fn send_recovery_email(&self, email: &str, redirect_to: &str) -> PlatformResult<()>;

    /// Admin API: set a new password for the given account.
    async fn admin_update_password(&self, user_id: Uuid, new_password: &str)
        -> PlatformResult<()>;

    /// Admin API: change the account e-mail (triggers re-confirmation).
    async fn admin_update_email(&self, user_id: Uuid, new_email: &str) -> PlatformResult<()>;

    async fn admin_delete_user(&self, user_id: Uuid) -> PlatformResult<()>;
}

/// Row-level table and RPC operations backing the domain services.
#[async_trait]
pub trait ForumStore: Send + Sync {
    // --- profiles ---
    async fn find_profile_id_by_username(&self, username: &str) -> PlatformResult<Option<Uuid>>;
    async fn insert_profile(&self, id: Uuid, username: &str) -> PlatformResult<()>;
    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> PlatformResult<()>;
    /// Profile columns joined onto the auth account during token validation.
    async fn identity_profile(&self, id: Uuid)
        -> PlatformResult<Option<crate::models::auth::IdentityProfile>>;
    async fn profile_by_username(&self, username: &str) -> PlatformResult<Option<ProfilePublic>>;
    /// Returns `false` when no row matched (unknown id).
    async fn update_profile_fields(&self, id: Uuid, fields: &ProfileUpdate)
        -> PlatformResult<bool>;
    async fn update_username(&self, id: Uuid, username: &str) -> PlatformResult<()>;
    async fn avatar_url(&self, id: Uuid) -> PlatformResult<Option<String>>;
    async fn set_avatar_url(&self, id: Uuid, url: Option<&str>) -> PlatformResult<()>;
    async fn count_profiles(&self) -> PlatformResult<i64>;
    async fn newest_member(&self) -> PlatformResult<Option<MemberSummary>>;
    async fn list_profiles(
        &self,
        offset: i64,
        limit: i64,
    ) -> PlatformResult<(Vec<ProfileListItem>, i64)>;
    async fn activity_profile(&self, id: Uuid) -> PlatformResult<Option<ActivityProfile>>;

    // --- categories & topics ---
    async fn category_exists(&self, slug: &str) -> PlatformResult<bool>;
    async fn list_categories(&self) -> PlatformResult<Vec<Category>>;
    async fn topics_by_category(
        &self,
        slug: &str,
        offset: i64,
        limit: i64,
    ) -> PlatformResult<(Vec<TopicSummary>, i64)>;
    /// Opaque permission decision, evaluated server-side.
    async fn can_create_topic(&self, user_id: Uuid, category_slug: &str) -> PlatformResult<bool>;
    async fn can_create_comment(&self, user_id: Uuid, topic_id: i64) -> PlatformResult<bool>;
    async fn insert_topic(&self, topic: &NewTopic) -> PlatformResult<Topic>;
    async fn topic_by_id(&self, id: i64) -> PlatformResult<Option<TopicDetail>>;
    async fn topic_by_slug(&self, slug: &str) -> PlatformResult<Option<TopicDetail>>;
    async fn count_comments_for_topic(&self, topic_id: i64) -> PlatformResult<i64>;
    async fn comments_for_topic(
        &self,
        topic_id: i64,
        offset: i64,
        limit: i64,
    ) -> PlatformResult<Vec<Comment>>;
    /// Author-scoped update; `false` when no row matched (wrong author or id).
    async fn update_topic(
        &self,
        topic_id: i64,
        author_id: Uuid,
        updates: &TopicUpdate,
    ) -> PlatformResult<bool>;
    /// Author-scoped delete; returns the number of rows removed.
    async fn delete_topic(&self, topic_id: i64, author_id: Uuid) -> PlatformResult<u64>;
    async fn insert_comment(
        &self,
        topic_id: i64,
        author_id: Uuid,
        content: &str,
    ) -> PlatformResult<i64>;
    async fn comment_by_id(&self, id: i64) -> PlatformResult<Option<Comment>>;
    async fn update_comment(
        &self,
        comment_id: i64,
        author_id: Uuid,
        content: &str,
    ) -> PlatformResult<bool>;
    async fn delete_comment(&self, comment_id: i64, author_id: Uuid) -> PlatformResult<u64>;
    async fn attach_topic_images(
        &self,
        topic_id: i64,
        author_id: Uuid,
        urls: &[String],
    ) -> PlatformResult<()>;
    async fn attach_comment_images(
        &self,
        comment_id: i64,
        author_id: Uuid,
        urls: &[String],
    ) -> PlatformResult<()>;
    async fn topic_image_urls(&self, topic_id: i64) -> PlatformResult<Vec<String>>;
    async fn comment_image_urls(&self, comment_id: i64) -> PlatformResult<Vec<String>>;
    async fn count_topics(&self) -> PlatformResult<i64>;
    async fn count_comments(&self) -> PlatformResult<i64>;
    async fn count_topics_by_author(&self, author_id: Uuid) -> PlatformResult<i64>;
    async fn last_topic_at(&self, author_id: Uuid) -> PlatformResult<Option<DateTime<Utc>>>;
    async fn last_comment_at(&self, author_id: Uuid) -> PlatformResult<Option<DateTime<Utc>>>;
    async fn topics_by_author(&self, author_id: Uuid) -> PlatformResult<Vec<TopicSummary>>;
    async fn recent_posts(&self, limit: i64) -> PlatformResult<Vec<RecentPost>>;

    // --- follows ---
    async fn handle_follow(&self, follower: Uuid, following: Uuid) -> PlatformResult<()>;
    async fn handle_unfollow(&self, follower: Uuid, following: Uuid) -> PlatformResult<()>;
    async fn follow_stats(&self, id: Uuid) -> PlatformResult<Option<FollowStats>>;
    async fn followers(&self, id: Uuid) -> PlatformResult<Vec<MemberProfile>>;
    async fn following(&self, id: Uuid) -> PlatformResult<Vec<MemberProfile>>;
    async fn is_following(&self, follower: Uuid, following: Uuid) -> PlatformResult<bool>;
    /// Returns the number of deleted rows (0 when the user was no follower).
    async fn remove_follower(&self, follower: Uuid, following: Uuid) -> PlatformResult<u64>;
}

/// Presence table: upserts keyed by `user_id`, serialized by the platform.
#[async_trait]
pub trait PresenceStore: Send + Sync {
    async fn upsert(&self, user_id: Uuid, last_seen_at: DateTime<Utc>) -> PlatformResult<()>;
    async fn remove(&self, user_id: Uuid) -> PlatformResult<()>;
    /// Entries with `last_seen_at` strictly newer than `since`, joined with
    /// the profile summary. Unordered.
    async fn list_since(&self, since: DateTime<Utc>) -> PlatformResult<Vec<OnlineUser>>;
}

/// Blob storage with public URLs.
#[async_trait]
pub trait StorageApi: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> PlatformResult<()>;
    async fn remove(&self, bucket: &str, path: &str) -> PlatformResult<()>;
    fn public_url(&self, bucket: &str, path: &str) -> String;
}
