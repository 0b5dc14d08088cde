#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{
    atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use forum_backend::{
    app,
    config::Config,
    models::{
        auth::{IdentityProfile, UserRole},
        category::{Category, TopicSummary},
        follow::FollowStats,
        forum::{MemberSummary, OnlineUser, RecentPost},
        profile::{MemberProfile, ProfileListItem, ProfilePublic, ProfileUpdate},
        statistic::ActivityProfile,
        topic::{Comment, ImageRef, NewTopic, Topic, TopicDetail, TopicUpdate},
    },
    platform::{
        AuthApi, AuthSession, AuthUser, ForumStore, PlatformError, PlatformResult, PresenceStore,
        StorageApi,
    },
    state::AppState,
};

fn api_error(status: u16, code: &str, message: &str) -> PlatformError {
    PlatformError::Api {
        status,
        code: Some(code.to_string()),
        message: message.to_string(),
    }
}

/// What an unreachable or garbled platform surfaces as: a body that does not
/// decode.
fn outage_error() -> PlatformError {
    PlatformError::Decode(serde_json::from_str::<Value>("<html>").unwrap_err())
}

// ---------------------------------------------------------------------------
// Fake auth API

struct Account {
    email: String,
    password: String,
}

#[derive(Default)]
struct AuthInner {
    accounts: HashMap<Uuid, Account>,
    access_tokens: HashMap<String, Uuid>,
    refresh_tokens: HashMap<String, Uuid>,
    recovery_emails: Vec<String>,
}

#[derive(Default)]
pub struct FakeAuth {
    inner: Mutex<AuthInner>,
    seq: AtomicU64,
    /// When set, token validation and refresh behave as if the platform
    /// were down.
    pub fail_token_checks: AtomicBool,
}

impl FakeAuth {
    fn next(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.seq.fetch_add(1, Ordering::Relaxed))
    }

    pub fn seed_account(&self, email: &str, password: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.lock().unwrap().accounts.insert(
            id,
            Account {
                email: email.to_string(),
                password: password.to_string(),
            },
        );
        id
    }

    pub fn issue_access_token(&self, user_id: Uuid) -> String {
        let token = self.next("access");
        self.inner
            .lock()
            .unwrap()
            .access_tokens
            .insert(token.clone(), user_id);
        token
    }

    pub fn issue_refresh_token(&self, user_id: Uuid) -> String {
        let token = self.next("refresh");
        self.inner
            .lock()
            .unwrap()
            .refresh_tokens
            .insert(token.clone(), user_id);
        token
    }

    pub fn revoke_access_token(&self, token: &str) {
        self.inner.lock().unwrap().access_tokens.remove(token);
    }

    pub fn account_exists(&self, user_id: Uuid) -> bool {
        self.inner.lock().unwrap().accounts.contains_key(&user_id)
    }

    pub fn account_count(&self) -> usize {
        self.inner.lock().unwrap().accounts.len()
    }

    pub fn recovery_sent_to(&self, email: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .recovery_emails
            .iter()
            .any(|sent| sent == email)
    }

    fn mint_session(&self, user_id: Uuid, email: String) -> AuthSession {
        AuthSession {
            access_token: self.issue_access_token(user_id),
            refresh_token: self.issue_refresh_token(user_id),
            user: AuthUser { id: user_id, email },
        }
    }
}

#[async_trait]
impl AuthApi for FakeAuth {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _redirect_to: &str,
    ) -> PlatformResult<AuthUser> {
        {
            let inner = self.inner.lock().unwrap();
            if inner.accounts.values().any(|acc| acc.email == email) {
                return Err(api_error(
                    422,
                    "user_already_exists",
                    "User already registered",
                ));
            }
        }
        let id = self.seed_account(email, password);
        Ok(AuthUser {
            id,
            email: email.to_string(),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> PlatformResult<AuthSession> {
        let user_id = {
            let inner = self.inner.lock().unwrap();
            inner
                .accounts
                .iter()
                .find(|(_, acc)| acc.email == email && acc.password == password)
                .map(|(id, _)| *id)
        };
        let Some(user_id) = user_id else {
            return Err(api_error(
                400,
                "invalid_credentials",
                "Invalid login credentials",
            ));
        };
        Ok(self.mint_session(user_id, email.to_string()))
    }

    async fn get_user(&self, access_token: &str) -> PlatformResult<AuthUser> {
        if self.fail_token_checks.load(Ordering::Relaxed) {
            return Err(outage_error());
        }
        let inner = self.inner.lock().unwrap();
        let user_id = inner
            .access_tokens
            .get(access_token)
            .copied()
            .ok_or_else(|| api_error(401, "bad_jwt", "invalid or expired access token"))?;
        let account = inner
            .accounts
            .get(&user_id)
            .ok_or_else(|| api_error(401, "bad_jwt", "account gone"))?;
        Ok(AuthUser {
            id: user_id,
            email: account.email.clone(),
        })
    }

    async fn refresh_session(&self, refresh_token: &str) -> PlatformResult<AuthSession> {
        if self.fail_token_checks.load(Ordering::Relaxed) {
            return Err(outage_error());
        }
        let (user_id, email) = {
            let mut inner = self.inner.lock().unwrap();
            // Single use: a second exchange of the same token must fail.
            let user_id = inner
                .refresh_tokens
                .remove(refresh_token)
                .ok_or_else(|| api_error(401, "refresh_token_not_found", "unknown token"))?;
            let email = inner
                .accounts
                .get(&user_id)
                .map(|acc| acc.email.clone())
                .ok_or_else(|| api_error(401, "refresh_token_not_found", "account gone"))?;
            (user_id, email)
        };
        Ok(self.mint_session(user_id, email))
    }

    async fn send_recovery_email(&self, email: &str, _redirect_to: &str) -> PlatformResult<()> {
        self.inner
            .lock()
            .unwrap()
            .recovery_emails
            .push(email.to_string());
        Ok(())
    }

    async fn admin_update_password(
        &self,
        user_id: Uuid,
        new_password: &str,
    ) -> PlatformResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let account = inner
            .accounts
            .get_mut(&user_id)
            .ok_or(PlatformError::RowNotFound)?;
        account.password = new_password.to_string();
        Ok(())
    }

    async fn admin_update_email(&self, user_id: Uuid, new_email: &str) -> PlatformResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let account = inner
            .accounts
            .get_mut(&user_id)
            .ok_or(PlatformError::RowNotFound)?;
        account.email = new_email.to_string();
        Ok(())
    }

    async fn admin_delete_user(&self, user_id: Uuid) -> PlatformResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.accounts.remove(&user_id);
        inner.access_tokens.retain(|_, id| *id != user_id);
        inner.refresh_tokens.retain(|_, id| *id != user_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fake forum store

#[derive(Clone)]
pub struct ProfileRow {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub avatar_url: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub messages_count: i64,
}

#[derive(Clone)]
struct CommentRow {
    id: i64,
    topic_id: i64,
    author_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
struct ImageRow {
    topic_id: Option<i64>,
    comment_id: Option<i64>,
    url: String,
}

#[derive(Default)]
struct StoreInner {
    profiles: HashMap<Uuid, ProfileRow>,
    categories: Vec<Category>,
    topics: Vec<Topic>,
    comments: Vec<CommentRow>,
    images: Vec<ImageRow>,
    follows: HashSet<(Uuid, Uuid)>,
}

pub struct FakeStore {
    inner: Mutex<StoreInner>,
    next_id: AtomicI64,
    pub allow_topic_creation: AtomicBool,
    pub allow_comment_creation: AtomicBool,
    pub fail_profile_insert: AtomicBool,
}

impl Default for FakeStore {
    fn default() -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            next_id: AtomicI64::new(1),
            allow_topic_creation: AtomicBool::new(true),
            allow_comment_creation: AtomicBool::new(true),
            fail_profile_insert: AtomicBool::new(false),
        }
    }
}

impl FakeStore {
    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn seed_profile(&self, id: Uuid, username: &str, role: UserRole) {
        self.inner.lock().unwrap().profiles.insert(
            id,
            ProfileRow {
                id,
                username: username.to_string(),
                role,
                avatar_url: None,
                joined_at: Utc::now(),
                last_login: None,
                messages_count: 0,
            },
        );
    }

    pub fn seed_category(&self, slug: &str, name: &str) {
        self.inner.lock().unwrap().categories.push(Category {
            slug: slug.to_string(),
            name: name.to_string(),
        });
    }

    pub fn seed_topic(&self, author_id: Uuid, category: &str, title: &str) -> i64 {
        let id = self.next_id();
        self.inner.lock().unwrap().topics.push(Topic {
            id,
            title: title.to_string(),
            content: "content".to_string(),
            author_id,
            category: category.to_string(),
            slug: format!("{}-{id}", title.to_lowercase().replace(' ', "-")),
            created_at: Utc::now(),
            updated_at: None,
        });
        id
    }

    pub fn profile(&self, id: Uuid) -> Option<ProfileRow> {
        self.inner.lock().unwrap().profiles.get(&id).cloned()
    }

    pub fn topic(&self, id: i64) -> Option<Topic> {
        self.inner
            .lock()
            .unwrap()
            .topics
            .iter()
            .find(|topic| topic.id == id)
            .cloned()
    }

    pub fn topic_count(&self) -> usize {
        self.inner.lock().unwrap().topics.len()
    }

    fn member_profile(inner: &StoreInner, id: Uuid) -> MemberProfile {
        inner
            .profiles
            .get(&id)
            .map(|row| MemberProfile {
                username: row.username.clone(),
                role: row.role,
                avatar_url: row.avatar_url.clone(),
            })
            .unwrap_or(MemberProfile {
                username: "unknown".to_string(),
                role: UserRole::Member,
                avatar_url: None,
            })
    }

    pub fn member_profile_for(&self, id: Uuid) -> MemberProfile {
        Self::member_profile(&self.inner.lock().unwrap(), id)
    }

    fn summary(inner: &StoreInner, topic: &Topic) -> TopicSummary {
        let comment_count = inner
            .comments
            .iter()
            .filter(|comment| comment.topic_id == topic.id)
            .count() as i64;
        TopicSummary {
            title: topic.title.clone(),
            slug: topic.slug.clone(),
            category: Some(topic.category.clone()),
            created_at: topic.created_at,
            author: Self::member_profile(inner, topic.author_id),
            comment_count,
        }
    }

    fn detail(inner: &StoreInner, topic: &Topic) -> TopicDetail {
        let images = inner
            .images
            .iter()
            .enumerate()
            .filter(|(_, image)| image.topic_id == Some(topic.id))
            .map(|(index, image)| ImageRef {
                id: index as i64 + 1,
                url: image.url.clone(),
            })
            .collect();
        TopicDetail {
            id: topic.id,
            title: topic.title.clone(),
            content: topic.content.clone(),
            category: topic.category.clone(),
            slug: topic.slug.clone(),
            created_at: topic.created_at,
            updated_at: topic.updated_at,
            author: Self::member_profile(inner, topic.author_id),
            images,
            comments: Vec::new(),
        }
    }

    fn comment_dto(inner: &StoreInner, row: &CommentRow) -> Comment {
        let images = inner
            .images
            .iter()
            .enumerate()
            .filter(|(_, image)| image.comment_id == Some(row.id))
            .map(|(index, image)| ImageRef {
                id: index as i64 + 1,
                url: image.url.clone(),
            })
            .collect();
        Comment {
            id: row.id,
            topic_id: row.topic_id,
            content: row.content.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
            author: Self::member_profile(inner, row.author_id),
            images,
        }
    }

    fn follower_counts(inner: &StoreInner, id: Uuid) -> (i64, i64) {
        let followers = inner
            .follows
            .iter()
            .filter(|(_, following)| *following == id)
            .count() as i64;
        let following = inner
            .follows
            .iter()
            .filter(|(follower, _)| *follower == id)
            .count() as i64;
        (followers, following)
    }
}

#[async_trait]
impl ForumStore for FakeStore {
    async fn find_profile_id_by_username(&self, username: &str) -> PlatformResult<Option<Uuid>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .profiles
            .values()
            .find(|row| row.username == username)
            .map(|row| row.id))
    }

    async fn insert_profile(&self, id: Uuid, username: &str) -> PlatformResult<()> {
        if self.fail_profile_insert.load(Ordering::Relaxed) {
            return Err(api_error(500, "XX000", "insert failed"));
        }
        let mut inner = self.inner.lock().unwrap();
        if inner.profiles.values().any(|row| row.username == username) {
            return Err(api_error(409, "23505", "duplicate key value"));
        }
        inner.profiles.insert(
            id,
            ProfileRow {
                id,
                username: username.to_string(),
                role: UserRole::Member,
                avatar_url: None,
                joined_at: Utc::now(),
                last_login: None,
                messages_count: 0,
            },
        );
        Ok(())
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> PlatformResult<()> {
        if let Some(row) = self.inner.lock().unwrap().profiles.get_mut(&id) {
            row.last_login = Some(at);
        }
        Ok(())
    }

    async fn identity_profile(&self, id: Uuid) -> PlatformResult<Option<IdentityProfile>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .profiles
            .get(&id)
            .map(|row| IdentityProfile {
                username: row.username.clone(),
                role: row.role,
                avatar_url: row.avatar_url.clone(),
            }))
    }

    async fn profile_by_username(&self, username: &str) -> PlatformResult<Option<ProfilePublic>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .profiles
            .values()
            .find(|row| row.username == username)
            .map(|row| {
                let (followers_count, following_count) = Self::follower_counts(&inner, row.id);
                ProfilePublic {
                    username: row.username.clone(),
                    role: row.role,
                    joined_at: row.joined_at,
                    last_login: row.last_login,
                    avatar_url: row.avatar_url.clone(),
                    gender: None,
                    birthdate: None,
                    location: None,
                    website: None,
                    facebook: None,
                    instagram: None,
                    discord: None,
                    steam: None,
                    followers_count,
                    following_count,
                    messages_count: row.messages_count,
                }
            }))
    }

    async fn update_profile_fields(
        &self,
        id: Uuid,
        _fields: &ProfileUpdate,
    ) -> PlatformResult<bool> {
        Ok(self.inner.lock().unwrap().profiles.contains_key(&id))
    }

    async fn update_username(&self, id: Uuid, username: &str) -> PlatformResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .profiles
            .values()
            .any(|row| row.username == username && row.id != id)
        {
            return Err(api_error(409, "23505", "duplicate key value"));
        }
        if let Some(row) = inner.profiles.get_mut(&id) {
            row.username = username.to_string();
        }
        Ok(())
    }

    async fn avatar_url(&self, id: Uuid) -> PlatformResult<Option<String>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .profiles
            .get(&id)
            .and_then(|row| row.avatar_url.clone()))
    }

    async fn set_avatar_url(&self, id: Uuid, url: Option<&str>) -> PlatformResult<()> {
        if let Some(row) = self.inner.lock().unwrap().profiles.get_mut(&id) {
            row.avatar_url = url.map(str::to_owned);
        }
        Ok(())
    }

    async fn count_profiles(&self) -> PlatformResult<i64> {
        Ok(self.inner.lock().unwrap().profiles.len() as i64)
    }

    async fn newest_member(&self) -> PlatformResult<Option<MemberSummary>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .profiles
            .values()
            .max_by_key(|row| row.joined_at)
            .map(|row| MemberSummary {
                username: row.username.clone(),
                role: row.role,
            }))
    }

    async fn list_profiles(
        &self,
        offset: i64,
        limit: i64,
    ) -> PlatformResult<(Vec<ProfileListItem>, i64)> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<&ProfileRow> = inner.profiles.values().collect();
        rows.sort_by(|a, b| b.joined_at.cmp(&a.joined_at));
        let total = rows.len() as i64;
        let page = rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|row| ProfileListItem {
                username: row.username.clone(),
                role: row.role,
                joined_at: row.joined_at,
                last_login: row.last_login,
                avatar_url: row.avatar_url.clone(),
                messages_count: row.messages_count,
            })
            .collect();
        Ok((page, total))
    }

    async fn activity_profile(&self, id: Uuid) -> PlatformResult<Option<ActivityProfile>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.profiles.get(&id).map(|row| {
            let (followers_count, _) = Self::follower_counts(&inner, id);
            ActivityProfile {
                joined_at: row.joined_at,
                messages_count: row.messages_count,
                followers_count,
                last_login: row.last_login,
            }
        }))
    }

    async fn category_exists(&self, slug: &str) -> PlatformResult<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .categories
            .iter()
            .any(|category| category.slug == slug))
    }

    async fn list_categories(&self) -> PlatformResult<Vec<Category>> {
        Ok(self.inner.lock().unwrap().categories.clone())
    }

    async fn topics_by_category(
        &self,
        slug: &str,
        offset: i64,
        limit: i64,
    ) -> PlatformResult<(Vec<TopicSummary>, i64)> {
        let inner = self.inner.lock().unwrap();
        let mut topics: Vec<&Topic> = inner
            .topics
            .iter()
            .filter(|topic| topic.category == slug)
            .collect();
        topics.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = topics.len() as i64;
        let page = topics
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|topic| Self::summary(&inner, topic))
            .collect();
        Ok((page, total))
    }

    async fn can_create_topic(&self, _user_id: Uuid, _category: &str) -> PlatformResult<bool> {
        Ok(self.allow_topic_creation.load(Ordering::Relaxed))
    }

    async fn can_create_comment(&self, _user_id: Uuid, _topic_id: i64) -> PlatformResult<bool> {
        Ok(self.allow_comment_creation.load(Ordering::Relaxed))
    }

    async fn insert_topic(&self, topic: &NewTopic) -> PlatformResult<Topic> {
        let row = Topic {
            id: self.next_id(),
            title: topic.title.clone(),
            content: topic.content.clone(),
            author_id: topic.author_id,
            category: topic.category.clone(),
            slug: topic.slug.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        self.inner.lock().unwrap().topics.push(row.clone());
        Ok(row)
    }

    async fn topic_by_id(&self, id: i64) -> PlatformResult<Option<TopicDetail>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .topics
            .iter()
            .find(|topic| topic.id == id)
            .map(|topic| Self::detail(&inner, topic)))
    }

    async fn topic_by_slug(&self, slug: &str) -> PlatformResult<Option<TopicDetail>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .topics
            .iter()
            .find(|topic| topic.slug == slug)
            .map(|topic| Self::detail(&inner, topic)))
    }

    async fn count_comments_for_topic(&self, topic_id: i64) -> PlatformResult<i64> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .comments
            .iter()
            .filter(|comment| comment.topic_id == topic_id)
            .count() as i64)
    }

    async fn comments_for_topic(
        &self,
        topic_id: i64,
        offset: i64,
        limit: i64,
    ) -> PlatformResult<Vec<Comment>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<&CommentRow> = inner
            .comments
            .iter()
            .filter(|comment| comment.topic_id == topic_id)
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|row| Self::comment_dto(&inner, row))
            .collect())
    }

    async fn update_topic(
        &self,
        topic_id: i64,
        author_id: Uuid,
        updates: &TopicUpdate,
    ) -> PlatformResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let Some(topic) = inner
            .topics
            .iter_mut()
            .find(|topic| topic.id == topic_id && topic.author_id == author_id)
        else {
            return Ok(false);
        };
        if let Some(title) = &updates.title {
            topic.title = title.clone();
        }
        if let Some(content) = &updates.content {
            topic.content = content.clone();
        }
        topic.updated_at = Some(Utc::now());
        Ok(true)
    }

    async fn delete_topic(&self, topic_id: i64, author_id: Uuid) -> PlatformResult<u64> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.topics.len();
        inner
            .topics
            .retain(|topic| !(topic.id == topic_id && topic.author_id == author_id));
        let removed = (before - inner.topics.len()) as u64;
        if removed > 0 {
            inner.comments.retain(|comment| comment.topic_id != topic_id);
            inner.images.retain(|image| image.topic_id != Some(topic_id));
        }
        Ok(removed)
    }

    async fn insert_comment(
        &self,
        topic_id: i64,
        author_id: Uuid,
        content: &str,
    ) -> PlatformResult<i64> {
        let id = self.next_id();
        let mut inner = self.inner.lock().unwrap();
        inner.comments.push(CommentRow {
            id,
            topic_id,
            author_id,
            content: content.to_string(),
            created_at: Utc::now(),
            updated_at: None,
        });
        if let Some(row) = inner.profiles.get_mut(&author_id) {
            row.messages_count += 1;
        }
        Ok(id)
    }

    async fn comment_by_id(&self, id: i64) -> PlatformResult<Option<Comment>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .comments
            .iter()
            .find(|comment| comment.id == id)
            .map(|row| Self::comment_dto(&inner, row)))
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        author_id: Uuid,
        content: &str,
    ) -> PlatformResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let Some(comment) = inner
            .comments
            .iter_mut()
            .find(|comment| comment.id == comment_id && comment.author_id == author_id)
        else {
            return Ok(false);
        };
        comment.content = content.to_string();
        comment.updated_at = Some(Utc::now());
        Ok(true)
    }

    async fn delete_comment(&self, comment_id: i64, author_id: Uuid) -> PlatformResult<u64> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.comments.len();
        inner
            .comments
            .retain(|comment| !(comment.id == comment_id && comment.author_id == author_id));
        let removed = (before - inner.comments.len()) as u64;
        if removed > 0 {
            inner
                .images
                .retain(|image| image.comment_id != Some(comment_id));
        }
        Ok(removed)
    }

    async fn attach_topic_images(
        &self,
        topic_id: i64,
        _author_id: Uuid,
        urls: &[String],
    ) -> PlatformResult<()> {
        let mut inner = self.inner.lock().unwrap();
        for url in urls {
            inner.images.push(ImageRow {
                topic_id: Some(topic_id),
                comment_id: None,
                url: url.clone(),
            });
        }
        Ok(())
    }

    async fn attach_comment_images(
        &self,
        comment_id: i64,
        _author_id: Uuid,
        urls: &[String],
    ) -> PlatformResult<()> {
        let mut inner = self.inner.lock().unwrap();
        for url in urls {
            inner.images.push(ImageRow {
                topic_id: None,
                comment_id: Some(comment_id),
                url: url.clone(),
            });
        }
        Ok(())
    }

    async fn topic_image_urls(&self, topic_id: i64) -> PlatformResult<Vec<String>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .images
            .iter()
            .filter(|image| image.topic_id == Some(topic_id))
            .map(|image| image.url.clone())
            .collect())
    }

    async fn comment_image_urls(&self, comment_id: i64) -> PlatformResult<Vec<String>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .images
            .iter()
            .filter(|image| image.comment_id == Some(comment_id))
            .map(|image| image.url.clone())
            .collect())
    }

    async fn count_topics(&self) -> PlatformResult<i64> {
        Ok(self.inner.lock().unwrap().topics.len() as i64)
    }

    async fn count_comments(&self) -> PlatformResult<i64> {
        Ok(self.inner.lock().unwrap().comments.len() as i64)
    }

    async fn count_topics_by_author(&self, author_id: Uuid) -> PlatformResult<i64> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .topics
            .iter()
            .filter(|topic| topic.author_id == author_id)
            .count() as i64)
    }

    async fn last_topic_at(&self, author_id: Uuid) -> PlatformResult<Option<DateTime<Utc>>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .topics
            .iter()
            .filter(|topic| topic.author_id == author_id)
            .map(|topic| topic.created_at)
            .max())
    }

    async fn last_comment_at(&self, author_id: Uuid) -> PlatformResult<Option<DateTime<Utc>>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .comments
            .iter()
            .filter(|comment| comment.author_id == author_id)
            .map(|comment| comment.created_at)
            .max())
    }

    async fn topics_by_author(&self, author_id: Uuid) -> PlatformResult<Vec<TopicSummary>> {
        let inner = self.inner.lock().unwrap();
        let mut topics: Vec<&Topic> = inner
            .topics
            .iter()
            .filter(|topic| topic.author_id == author_id)
            .collect();
        topics.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(topics
            .into_iter()
            .map(|topic| Self::summary(&inner, topic))
            .collect())
    }

    async fn recent_posts(&self, limit: i64) -> PlatformResult<Vec<RecentPost>> {
        let inner = self.inner.lock().unwrap();
        let mut topics: Vec<&Topic> = inner.topics.iter().collect();
        topics.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(topics
            .into_iter()
            .take(limit as usize)
            .map(|topic| {
                let summary = Self::summary(&inner, topic);
                RecentPost {
                    id: topic.id,
                    title: summary.title,
                    slug: summary.slug,
                    category: topic.category.clone(),
                    created_at: topic.created_at,
                    author: summary.author,
                    comment_count: summary.comment_count,
                }
            })
            .collect())
    }

    async fn handle_follow(&self, follower: Uuid, following: Uuid) -> PlatformResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.follows.insert((follower, following)) {
            return Err(api_error(409, "23505", "duplicate key value"));
        }
        Ok(())
    }

    async fn handle_unfollow(&self, follower: Uuid, following: Uuid) -> PlatformResult<()> {
        self.inner
            .lock()
            .unwrap()
            .follows
            .remove(&(follower, following));
        Ok(())
    }

    async fn follow_stats(&self, id: Uuid) -> PlatformResult<Option<FollowStats>> {
        let inner = self.inner.lock().unwrap();
        if !inner.profiles.contains_key(&id) {
            return Ok(None);
        }
        let (followers_count, following_count) = Self::follower_counts(&inner, id);
        Ok(Some(FollowStats {
            followers_count,
            following_count,
        }))
    }

    async fn followers(&self, id: Uuid) -> PlatformResult<Vec<MemberProfile>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .follows
            .iter()
            .filter(|(_, following)| *following == id)
            .map(|(follower, _)| Self::member_profile(&inner, *follower))
            .collect())
    }

    async fn following(&self, id: Uuid) -> PlatformResult<Vec<MemberProfile>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .follows
            .iter()
            .filter(|(follower, _)| *follower == id)
            .map(|(_, following)| Self::member_profile(&inner, *following))
            .collect())
    }

    async fn is_following(&self, follower: Uuid, following: Uuid) -> PlatformResult<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .follows
            .contains(&(follower, following)))
    }

    async fn remove_follower(&self, follower: Uuid, following: Uuid) -> PlatformResult<u64> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .follows
            .remove(&(follower, following)) as u64)
    }
}

// ---------------------------------------------------------------------------
// Fake presence store

pub struct FakePresence {
    entries: Mutex<HashMap<Uuid, DateTime<Utc>>>,
    store: Arc<FakeStore>,
}

impl FakePresence {
    pub fn new(store: Arc<FakeStore>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            store,
        }
    }

    pub fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn last_seen(&self, user_id: Uuid) -> Option<DateTime<Utc>> {
        self.entries.lock().unwrap().get(&user_id).copied()
    }

    /// Backdates an entry, for exercising the online window boundary.
    pub fn set_last_seen(&self, user_id: Uuid, at: DateTime<Utc>) {
        self.entries.lock().unwrap().insert(user_id, at);
    }
}

#[async_trait]
impl PresenceStore for FakePresence {
    async fn upsert(&self, user_id: Uuid, last_seen_at: DateTime<Utc>) -> PlatformResult<()> {
        self.entries.lock().unwrap().insert(user_id, last_seen_at);
        Ok(())
    }

    async fn remove(&self, user_id: Uuid) -> PlatformResult<()> {
        self.entries.lock().unwrap().remove(&user_id);
        Ok(())
    }

    async fn list_since(&self, since: DateTime<Utc>) -> PlatformResult<Vec<OnlineUser>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|(_, last_seen)| **last_seen > since)
            .map(|(user_id, last_seen)| OnlineUser {
                last_seen_at: *last_seen,
                profile: self.store.member_profile_for(*user_id),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Fake storage

#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl FakeStorage {
    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn has_object(&self, bucket: &str, path: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&format!("{bucket}/{path}"))
    }
}

#[async_trait]
impl StorageApi for FakeStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
        _upsert: bool,
    ) -> PlatformResult<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(format!("{bucket}/{path}"), bytes);
        Ok(())
    }

    async fn remove(&self, bucket: &str, path: &str) -> PlatformResult<()> {
        self.objects
            .lock()
            .unwrap()
            .remove(&format!("{bucket}/{path}"));
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://storage.test/{bucket}/{path}")
    }
}

// ---------------------------------------------------------------------------
// Harness

pub fn test_config() -> Config {
    Config {
        supabase_url: "http://127.0.0.1:9".to_string(),
        supabase_anon_key: "anon-key".to_string(),
        supabase_service_key: "service-key".to_string(),
        frontend_origins: vec!["http://localhost:5173".to_string()],
        production: false,
        port: 0,
    }
}

pub struct TestApp {
    pub auth: Arc<FakeAuth>,
    pub store: Arc<FakeStore>,
    pub presence: Arc<FakePresence>,
    pub storage: Arc<FakeStorage>,
    pub state: AppState,
    pub router: Router,
}

pub fn test_app() -> TestApp {
    let auth = Arc::new(FakeAuth::default());
    let store = Arc::new(FakeStore::default());
    let presence = Arc::new(FakePresence::new(store.clone()));
    let storage = Arc::new(FakeStorage::default());
    let state = AppState::new(
        auth.clone(),
        store.clone(),
        presence.clone(),
        storage.clone(),
        test_config(),
    );
    let router = app(state.clone());
    TestApp {
        auth,
        store,
        presence,
        storage,
        state,
        router,
    }
}

impl TestApp {
    /// Creates an auth account plus its profile row.
    pub fn seed_user(&self, username: &str, role: UserRole) -> Uuid {
        let email = format!("{username}@example.com");
        let id = self.auth.seed_account(&email, "password123");
        self.store.seed_profile(id, username, role);
        id
    }

    pub fn access_cookie(&self, user_id: Uuid) -> String {
        format!("sb-access-token={}", self.auth.issue_access_token(user_id))
    }

    pub fn refresh_cookie(&self, user_id: Uuid) -> String {
        format!(
            "sb-refresh-token={}",
            self.auth.issue_refresh_token(user_id)
        )
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("request handled")
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub fn json_request(
    method: &str,
    uri: &str,
    body: Value,
    cookie: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// Multipart form with text fields only, for topic/comment creation.
pub fn multipart_request(
    method: &str,
    uri: &str,
    fields: &[(&str, &str)],
    cookie: Option<&str>,
) -> Request<Body> {
    const BOUNDARY: &str = "test-boundary";
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    let mut builder = Request::builder().method(method).uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).expect("request")
}

/// Multipart form with a single file part, for avatar uploads.
pub fn multipart_file_request(
    method: &str,
    uri: &str,
    field_name: &str,
    filename: &str,
    content_type: &str,
    bytes: &[u8],
    cookie: Option<&str>,
) -> Request<Body> {
    const BOUNDARY: &str = "test-file-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field_name}\"; \
             filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder().method(method).uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).expect("request")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    }
}

/// All `Set-Cookie` values on a response.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_owned)
        .collect()
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
