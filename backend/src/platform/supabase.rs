//! REST client for the hosted platform: GoTrue auth, PostgREST tables and
//! RPCs, and object storage. One `Supabase` value implements every platform
//! trait; table and storage calls use the service key, token validation uses
//! the caller's bearer token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

use crate::models::{
    auth::IdentityProfile,
    category::{Category, TopicSummary},
    follow::FollowStats,
    forum::{MemberSummary, OnlineUser, RecentPost},
    profile::{MemberProfile, ProfileListItem, ProfilePublic, ProfileUpdate},
    statistic::ActivityProfile,
    topic::{Comment, NewTopic, Topic, TopicDetail, TopicUpdate},
};

use super::{
    AuthApi, AuthSession, AuthUser, ForumStore, PlatformError, PlatformResult, PresenceStore,
    StorageApi,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Embedded author summary used by topic and comment selects.
const AUTHOR_EMBED: &str = "author:profiles(username,role,avatar_url)";
const IMAGES_EMBED: &str = "images:images(id,url)";

#[derive(Clone)]
pub struct Supabase {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_key: String,
}

impl Supabase {
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        service_key: impl Into<String>,
    ) -> PlatformResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            service_key: service_key.into(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{function}", self.base_url)
    }

    fn storage_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{path}", self.base_url)
    }

    /// Service-role auth, bypasses row-level security.
    fn with_service_auth(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.service_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.service_key))
    }

    /// Anon key plus the end user's own bearer token.
    fn with_user_auth(&self, req: RequestBuilder, access_token: &str) -> RequestBuilder {
        req.header("apikey", &self.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
    }

    fn with_anon_auth(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.anon_key))
    }

    /// Maps non-success responses onto `PlatformError::Api`, pulling the
    /// error code and message out of the JSON body when present.
    async fn check(resp: Response) -> PlatformResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        let code = ["code", "error_code", "error"]
            .iter()
            .find_map(|key| parsed.get(key).and_then(Value::as_str))
            .map(str::to_owned);
        let message = ["message", "msg", "error_description"]
            .iter()
            .find_map(|key| parsed.get(key).and_then(Value::as_str))
            .map(str::to_owned)
            .unwrap_or(body);
        Err(PlatformError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }

    async fn json<T: DeserializeOwned>(resp: Response) -> PlatformResult<T> {
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Total row count from a `Content-Range` header (`0-24/117` or `*/0`).
    fn total_from_content_range(resp: &Response) -> Option<i64> {
        resp.headers()
            .get(header::CONTENT_RANGE)?
            .to_str()
            .ok()?
            .rsplit('/')
            .next()?
            .parse()
            .ok()
    }

    /// Exact row count for a filtered table without fetching rows.
    async fn count(&self, table: &str, filters: &[(&str, String)]) -> PlatformResult<i64> {
        let mut req = self
            .with_service_auth(self.http.get(self.rest_url(table)))
            .query(&[("select", "id"), ("limit", "1")])
            .header("Prefer", "count=exact");
        for (key, value) in filters {
            req = req.query(&[(key, value.as_str())]);
        }
        let resp = Self::check(req.send().await?).await?;
        Self::total_from_content_range(&resp).ok_or(PlatformError::Api {
            status: resp.status().as_u16(),
            code: None,
            message: "missing Content-Range on count query".into(),
        })
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> PlatformResult<Vec<T>> {
        let mut req = self.with_service_auth(self.http.get(self.rest_url(table)));
        for (key, value) in query {
            req = req.query(&[(key, value.as_str())]);
        }
        let resp = Self::check(req.send().await?).await?;
        Self::json(resp).await
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> PlatformResult<Option<T>> {
        let mut query = query.to_vec();
        query.push(("limit", "1".into()));
        let mut rows: Vec<T> = self.select(table, &query).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    async fn rpc<T: DeserializeOwned>(&self, function: &str, args: Value) -> PlatformResult<T> {
        let resp = self
            .with_service_auth(self.http.post(self.rpc_url(function)))
            .json(&args)
            .send()
            .await?;
        Self::json(Self::check(resp).await?).await
    }

    async fn rpc_void(&self, function: &str, args: Value) -> PlatformResult<()> {
        let resp = self
            .with_service_auth(self.http.post(self.rpc_url(function)))
            .json(&args)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn insert_returning<T: DeserializeOwned>(
        &self,
        table: &str,
        body: &Value,
    ) -> PlatformResult<T> {
        let resp = self
            .with_service_auth(self.http.post(self.rest_url(table)))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let mut rows: Vec<T> = Self::json(Self::check(resp).await?).await?;
        if rows.is_empty() {
            return Err(PlatformError::RowNotFound);
        }
        Ok(rows.swap_remove(0))
    }

    async fn insert_minimal(&self, table: &str, body: &Value) -> PlatformResult<()> {
        let resp = self
            .with_service_auth(self.http.post(self.rest_url(table)))
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// PATCH with `return=representation`; `true` when at least one row
    /// matched the filters.
    async fn patch_matched(
        &self,
        table: &str,
        filters: &[(&str, String)],
        body: &Value,
    ) -> PlatformResult<bool> {
        let mut req = self
            .with_service_auth(self.http.patch(self.rest_url(table)))
            .header("Prefer", "return=representation")
            .query(&[("select", "*")]);
        for (key, value) in filters {
            req = req.query(&[(key, value.as_str())]);
        }
        let resp = Self::check(req.json(body).send().await?).await?;
        let rows: Vec<Value> = Self::json(resp).await?;
        Ok(!rows.is_empty())
    }

    /// DELETE with `count=exact`; returns the number of rows removed.
    async fn delete_counted(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> PlatformResult<u64> {
        let mut req = self
            .with_service_auth(self.http.delete(self.rest_url(table)))
            .header("Prefer", "count=exact");
        for (key, value) in filters {
            req = req.query(&[(key, value.as_str())]);
        }
        let resp = Self::check(req.send().await?).await?;
        Ok(Self::total_from_content_range(&resp).unwrap_or(0).max(0) as u64)
    }

    /// Serializes the struct and drops null fields, so a PATCH only touches
    /// the columns the caller actually set.
    fn partial_body<T: serde::Serialize>(fields: &T) -> PlatformResult<Value> {
        let value = serde_json::to_value(fields)?;
        Ok(match value {
            Value::Object(map) => {
                Value::Object(map.into_iter().filter(|(_, v)| !v.is_null()).collect())
            }
            other => other,
        })
    }
}

#[derive(Deserialize)]
struct IdRow {
    id: Uuid,
}

#[derive(Deserialize)]
struct SerialIdRow {
    id: i64,
}

#[derive(Deserialize)]
struct UrlRow {
    url: String,
}

#[derive(Deserialize)]
struct CreatedAtRow {
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct CountAgg {
    count: i64,
}

/// Topic listing row with the platform's `comments(count)` aggregate shape.
#[derive(Deserialize)]
struct TopicSummaryRow {
    title: String,
    slug: String,
    #[serde(default)]
    category: Option<String>,
    created_at: DateTime<Utc>,
    author: MemberProfile,
    #[serde(default)]
    comments: Vec<CountAgg>,
}

impl From<TopicSummaryRow> for TopicSummary {
    fn from(row: TopicSummaryRow) -> Self {
        TopicSummary {
            title: row.title,
            slug: row.slug,
            category: row.category,
            created_at: row.created_at,
            author: row.author,
            comment_count: row.comments.first().map(|agg| agg.count).unwrap_or(0),
        }
    }
}

#[derive(Deserialize)]
struct FollowerRow {
    follower: MemberProfile,
}

#[derive(Deserialize)]
struct FollowingRow {
    followed: MemberProfile,
}

const TOPIC_SUMMARY_SELECT: &str =
    "title,slug,category,created_at,author:profiles(username,role,avatar_url),comments(count)";

fn topic_detail_select() -> String {
    format!("id,title,content,category,slug,created_at,updated_at,{AUTHOR_EMBED},{IMAGES_EMBED}")
}

fn comment_select() -> String {
    format!("id,topic_id,content,created_at,updated_at,{AUTHOR_EMBED},{IMAGES_EMBED}")
}

#[async_trait]
impl AuthApi for Supabase {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
    ) -> PlatformResult<AuthUser> {
        let resp = self
            .with_anon_auth(self.http.post(self.auth_url("signup")))
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body: Value = Self::json(Self::check(resp).await?).await?;
        // Sign-up may return the user nested under "user" or flat.
        let user = body.get("user").cloned().unwrap_or(body);
        Ok(serde_json::from_value(user)?)
    }

    async fn sign_in(&self, email: &str, password: &str) -> PlatformResult<AuthSession> {
        let resp = self
            .with_anon_auth(self.http.post(self.auth_url("token")))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        Self::json(Self::check(resp).await?).await
    }

    async fn get_user(&self, access_token: &str) -> PlatformResult<AuthUser> {
        let resp = self
            .with_user_auth(self.http.get(self.auth_url("user")), access_token)
            .send()
            .await?;
        if resp.status() == StatusCode::UNAUTHORIZED || resp.status() == StatusCode::FORBIDDEN {
            return Err(PlatformError::Api {
                status: resp.status().as_u16(),
                code: Some("bad_jwt".into()),
                message: "invalid or expired access token".into(),
            });
        }
        Self::json(Self::check(resp).await?).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> PlatformResult<AuthSession> {
        let resp = self
            .with_anon_auth(self.http.post(self.auth_url("token")))
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        Self::json(Self::check(resp).await?).await
    }

    async fn send_recovery_email(&self, email: &str, redirect_to: &str) -> PlatformResult<()> {
        let resp = self
            .with_anon_auth(self.http.post(self.auth_url("recover")))
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn admin_update_password(
        &self,
        user_id: Uuid,
        new_password: &str,
    ) -> PlatformResult<()> {
        let url = self.auth_url(&format!("admin/users/{user_id}"));
        let resp = self
            .with_service_auth(self.http.put(url))
            .json(&json!({ "password": new_password }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn admin_update_email(&self, user_id: Uuid, new_email: &str) -> PlatformResult<()> {
        let url = self.auth_url(&format!("admin/users/{user_id}"));
        let resp = self
            .with_service_auth(self.http.put(url))
            .json(&json!({ "email": new_email }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn admin_delete_user(&self, user_id: Uuid) -> PlatformResult<()> {
        let url = self.auth_url(&format!("admin/users/{user_id}"));
        let resp = self.with_service_auth(self.http.delete(url)).send().await?;
        Self::check(resp).await?;
        Ok(())
    }
}

#[async_trait]
impl ForumStore for Supabase {
    async fn find_profile_id_by_username(&self, username: &str) -> PlatformResult<Option<Uuid>> {
        let row: Option<IdRow> = self
            .select_one(
                "profiles",
                &[
                    ("select", "id".into()),
                    ("username", format!("eq.{username}")),
                ],
            )
            .await?;
        Ok(row.map(|row| row.id))
    }

    async fn insert_profile(&self, id: Uuid, username: &str) -> PlatformResult<()> {
        self.insert_minimal("profiles", &json!({ "id": id, "username": username }))
            .await
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> PlatformResult<()> {
        self.patch_matched(
            "profiles",
            &[("id", format!("eq.{id}"))],
            &json!({ "last_login": at }),
        )
        .await?;
        Ok(())
    }

    async fn identity_profile(&self, id: Uuid) -> PlatformResult<Option<IdentityProfile>> {
        self.select_one(
            "profiles",
            &[
                ("select", "username,role,avatar_url".into()),
                ("id", format!("eq.{id}")),
            ],
        )
        .await
    }

    async fn profile_by_username(&self, username: &str) -> PlatformResult<Option<ProfilePublic>> {
        self.select_one(
            "profiles",
            &[
                (
                    "select",
                    "username,role,joined_at,last_login,avatar_url,gender,birthdate,location,\
                     website,facebook,instagram,discord,steam,followers_count,following_count,\
                     messages_count"
                        .into(),
                ),
                ("username", format!("eq.{username}")),
            ],
        )
        .await
    }

    async fn update_profile_fields(
        &self,
        id: Uuid,
        fields: &ProfileUpdate,
    ) -> PlatformResult<bool> {
        let body = Self::partial_body(fields)?;
        self.patch_matched("profiles", &[("id", format!("eq.{id}"))], &body)
            .await
    }

    async fn update_username(&self, id: Uuid, username: &str) -> PlatformResult<()> {
        self.patch_matched(
            "profiles",
            &[("id", format!("eq.{id}"))],
            &json!({ "username": username }),
        )
        .await?;
        Ok(())
    }

    async fn avatar_url(&self, id: Uuid) -> PlatformResult<Option<String>> {
        #[derive(Deserialize)]
        struct AvatarRow {
            avatar_url: Option<String>,
        }
        let row: Option<AvatarRow> = self
            .select_one(
                "profiles",
                &[("select", "avatar_url".into()), ("id", format!("eq.{id}"))],
            )
            .await?;
        Ok(row.and_then(|row| row.avatar_url))
    }

    async fn set_avatar_url(&self, id: Uuid, url: Option<&str>) -> PlatformResult<()> {
        self.patch_matched(
            "profiles",
            &[("id", format!("eq.{id}"))],
            &json!({ "avatar_url": url }),
        )
        .await?;
        Ok(())
    }

    async fn count_profiles(&self) -> PlatformResult<i64> {
        self.count("profiles", &[]).await
    }

    async fn newest_member(&self) -> PlatformResult<Option<MemberSummary>> {
        self.select_one(
            "profiles",
            &[
                ("select", "username,role".into()),
                ("order", "joined_at.desc".into()),
            ],
        )
        .await
    }

    async fn list_profiles(
        &self,
        offset: i64,
        limit: i64,
    ) -> PlatformResult<(Vec<ProfileListItem>, i64)> {
        let req = self
            .with_service_auth(self.http.get(self.rest_url("profiles")))
            .query(&[
                (
                    "select",
                    "username,role,joined_at,last_login,avatar_url,messages_count",
                ),
                ("order", "joined_at.desc"),
                ("offset", &offset.to_string()),
                ("limit", &limit.to_string()),
            ])
            .header("Prefer", "count=exact");
        let resp = Self::check(req.send().await?).await?;
        let total = Self::total_from_content_range(&resp).unwrap_or(0);
        let rows: Vec<ProfileListItem> = Self::json(resp).await?;
        Ok((rows, total))
    }

    async fn activity_profile(&self, id: Uuid) -> PlatformResult<Option<ActivityProfile>> {
        self.select_one(
            "profiles",
            &[
                (
                    "select",
                    "joined_at,messages_count,followers_count,last_login".into(),
                ),
                ("id", format!("eq.{id}")),
            ],
        )
        .await
    }

    async fn category_exists(&self, slug: &str) -> PlatformResult<bool> {
        let total = self
            .count("categories", &[("slug", format!("eq.{slug}"))])
            .await?;
        Ok(total > 0)
    }

    async fn list_categories(&self) -> PlatformResult<Vec<Category>> {
        self.select(
            "categories",
            &[("select", "slug,name".into()), ("order", "name.asc".into())],
        )
        .await
    }

    async fn topics_by_category(
        &self,
        slug: &str,
        offset: i64,
        limit: i64,
    ) -> PlatformResult<(Vec<TopicSummary>, i64)> {
        let req = self
            .with_service_auth(self.http.get(self.rest_url("topics")))
            .query(&[
                ("select", TOPIC_SUMMARY_SELECT),
                ("category", &format!("eq.{slug}")),
                ("order", "created_at.desc"),
                ("offset", &offset.to_string()),
                ("limit", &limit.to_string()),
            ])
            .header("Prefer", "count=exact");
        let resp = Self::check(req.send().await?).await?;
        let total = Self::total_from_content_range(&resp).unwrap_or(0);
        let rows: Vec<TopicSummaryRow> = Self::json(resp).await?;
        Ok((rows.into_iter().map(TopicSummary::from).collect(), total))
    }

    async fn can_create_topic(&self, user_id: Uuid, category_slug: &str) -> PlatformResult<bool> {
        self.rpc(
            "can_create_topic",
            json!({ "p_user_id": user_id, "p_category_slug": category_slug }),
        )
        .await
    }

    async fn can_create_comment(&self, user_id: Uuid, topic_id: i64) -> PlatformResult<bool> {
        self.rpc(
            "can_create_comment",
            json!({ "p_user_id": user_id, "p_topic_id": topic_id }),
        )
        .await
    }

    async fn insert_topic(&self, topic: &NewTopic) -> PlatformResult<Topic> {
        self.insert_returning("topics", &serde_json::to_value(topic)?)
            .await
    }

    async fn topic_by_id(&self, id: i64) -> PlatformResult<Option<TopicDetail>> {
        self.select_one(
            "topics",
            &[("select", topic_detail_select()), ("id", format!("eq.{id}"))],
        )
        .await
    }

    async fn topic_by_slug(&self, slug: &str) -> PlatformResult<Option<TopicDetail>> {
        self.select_one(
            "topics",
            &[
                ("select", topic_detail_select()),
                ("slug", format!("eq.{slug}")),
            ],
        )
        .await
    }

    async fn count_comments_for_topic(&self, topic_id: i64) -> PlatformResult<i64> {
        self.count("comments", &[("topic_id", format!("eq.{topic_id}"))])
            .await
    }

    async fn comments_for_topic(
        &self,
        topic_id: i64,
        offset: i64,
        limit: i64,
    ) -> PlatformResult<Vec<Comment>> {
        self.select(
            "comments",
            &[
                ("select", comment_select()),
                ("topic_id", format!("eq.{topic_id}")),
                ("order", "created_at.asc".into()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn update_topic(
        &self,
        topic_id: i64,
        author_id: Uuid,
        updates: &TopicUpdate,
    ) -> PlatformResult<bool> {
        let mut body = match Self::partial_body(updates)? {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        body.insert("updated_at".into(), json!(Utc::now()));
        self.patch_matched(
            "topics",
            &[
                ("id", format!("eq.{topic_id}")),
                ("author_id", format!("eq.{author_id}")),
            ],
            &Value::Object(body),
        )
        .await
    }

    async fn delete_topic(&self, topic_id: i64, author_id: Uuid) -> PlatformResult<u64> {
        self.delete_counted(
            "topics",
            &[
                ("id", format!("eq.{topic_id}")),
                ("author_id", format!("eq.{author_id}")),
            ],
        )
        .await
    }

    async fn insert_comment(
        &self,
        topic_id: i64,
        author_id: Uuid,
        content: &str,
    ) -> PlatformResult<i64> {
        let row: SerialIdRow = self
            .insert_returning(
                "comments",
                &json!({ "topic_id": topic_id, "author_id": author_id, "content": content }),
            )
            .await?;
        Ok(row.id)
    }

    async fn comment_by_id(&self, id: i64) -> PlatformResult<Option<Comment>> {
        self.select_one(
            "comments",
            &[("select", comment_select()), ("id", format!("eq.{id}"))],
        )
        .await
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        author_id: Uuid,
        content: &str,
    ) -> PlatformResult<bool> {
        self.patch_matched(
            "comments",
            &[
                ("id", format!("eq.{comment_id}")),
                ("author_id", format!("eq.{author_id}")),
            ],
            &json!({ "content": content, "updated_at": Utc::now() }),
        )
        .await
    }

    async fn delete_comment(&self, comment_id: i64, author_id: Uuid) -> PlatformResult<u64> {
        self.delete_counted(
            "comments",
            &[
                ("id", format!("eq.{comment_id}")),
                ("author_id", format!("eq.{author_id}")),
            ],
        )
        .await
    }

    async fn attach_topic_images(
        &self,
        topic_id: i64,
        author_id: Uuid,
        urls: &[String],
    ) -> PlatformResult<()> {
        if urls.is_empty() {
            return Ok(());
        }
        let rows: Vec<Value> = urls
            .iter()
            .map(|url| json!({ "topic_id": topic_id, "uploaded_by": author_id, "url": url }))
            .collect();
        self.insert_minimal("images", &Value::Array(rows)).await
    }

    async fn attach_comment_images(
        &self,
        comment_id: i64,
        author_id: Uuid,
        urls: &[String],
    ) -> PlatformResult<()> {
        if urls.is_empty() {
            return Ok(());
        }
        let rows: Vec<Value> = urls
            .iter()
            .map(|url| json!({ "comment_id": comment_id, "uploaded_by": author_id, "url": url }))
            .collect();
        self.insert_minimal("images", &Value::Array(rows)).await
    }

    async fn topic_image_urls(&self, topic_id: i64) -> PlatformResult<Vec<String>> {
        let rows: Vec<UrlRow> = self
            .select(
                "images",
                &[
                    ("select", "url".into()),
                    ("topic_id", format!("eq.{topic_id}")),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(|row| row.url).collect())
    }

    async fn comment_image_urls(&self, comment_id: i64) -> PlatformResult<Vec<String>> {
        let rows: Vec<UrlRow> = self
            .select(
                "images",
                &[
                    ("select", "url".into()),
                    ("comment_id", format!("eq.{comment_id}")),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(|row| row.url).collect())
    }

    async fn count_topics(&self) -> PlatformResult<i64> {
        self.count("topics", &[]).await
    }

    async fn count_comments(&self) -> PlatformResult<i64> {
        self.count("comments", &[]).await
    }

    async fn count_topics_by_author(&self, author_id: Uuid) -> PlatformResult<i64> {
        self.count("topics", &[("author_id", format!("eq.{author_id}"))])
            .await
    }

    async fn last_topic_at(&self, author_id: Uuid) -> PlatformResult<Option<DateTime<Utc>>> {
        let row: Option<CreatedAtRow> = self
            .select_one(
                "topics",
                &[
                    ("select", "created_at".into()),
                    ("author_id", format!("eq.{author_id}")),
                    ("order", "created_at.desc".into()),
                ],
            )
            .await?;
        Ok(row.map(|row| row.created_at))
    }

    async fn last_comment_at(&self, author_id: Uuid) -> PlatformResult<Option<DateTime<Utc>>> {
        let row: Option<CreatedAtRow> = self
            .select_one(
                "comments",
                &[
                    ("select", "created_at".into()),
                    ("author_id", format!("eq.{author_id}")),
                    ("order", "created_at.desc".into()),
                ],
            )
            .await?;
        Ok(row.map(|row| row.created_at))
    }

    async fn topics_by_author(&self, author_id: Uuid) -> PlatformResult<Vec<TopicSummary>> {
        let rows: Vec<TopicSummaryRow> = self
            .select(
                "topics",
                &[
                    ("select", TOPIC_SUMMARY_SELECT.into()),
                    ("author_id", format!("eq.{author_id}")),
                    ("order", "created_at.desc".into()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(TopicSummary::from).collect())
    }

    async fn recent_posts(&self, limit: i64) -> PlatformResult<Vec<RecentPost>> {
        self.rpc("get_recent_posts", json!({ "limit_count": limit }))
            .await
    }

    async fn handle_follow(&self, follower: Uuid, following: Uuid) -> PlatformResult<()> {
        self.rpc_void(
            "handle_follow",
            json!({ "p_follower_id": follower, "p_following_id": following }),
        )
        .await
    }

    async fn handle_unfollow(&self, follower: Uuid, following: Uuid) -> PlatformResult<()> {
        self.rpc_void(
            "handle_unfollow",
            json!({ "p_follower_id": follower, "p_following_id": following }),
        )
        .await
    }

    async fn follow_stats(&self, id: Uuid) -> PlatformResult<Option<FollowStats>> {
        self.select_one(
            "profiles",
            &[
                ("select", "followers_count,following_count".into()),
                ("id", format!("eq.{id}")),
            ],
        )
        .await
    }

    async fn followers(&self, id: Uuid) -> PlatformResult<Vec<MemberProfile>> {
        let rows: Vec<FollowerRow> = self
            .select(
                "follows",
                &[
                    (
                        "select",
                        "follower:profiles!follows_follower_id_fkey(username,role,avatar_url)"
                            .into(),
                    ),
                    ("following_id", format!("eq.{id}")),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(|row| row.follower).collect())
    }

    async fn following(&self, id: Uuid) -> PlatformResult<Vec<MemberProfile>> {
        let rows: Vec<FollowingRow> = self
            .select(
                "follows",
                &[
                    (
                        "select",
                        "followed:profiles!follows_following_id_fkey(username,role,avatar_url)"
                            .into(),
                    ),
                    ("follower_id", format!("eq.{id}")),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(|row| row.followed).collect())
    }

    async fn is_following(&self, follower: Uuid, following: Uuid) -> PlatformResult<bool> {
        let total = self
            .count(
                "follows",
                &[
                    ("follower_id", format!("eq.{follower}")),
                    ("following_id", format!("eq.{following}")),
                ],
            )
            .await?;
        Ok(total > 0)
    }

    async fn remove_follower(&self, follower: Uuid, following: Uuid) -> PlatformResult<u64> {
        self.delete_counted(
            "follows",
            &[
                ("follower_id", format!("eq.{follower}")),
                ("following_id", format!("eq.{following}")),
            ],
        )
        .await
    }
}

#[async_trait]
impl PresenceStore for Supabase {
    async fn upsert(&self, user_id: Uuid, last_seen_at: DateTime<Utc>) -> PlatformResult<()> {
        let resp = self
            .with_service_auth(self.http.post(self.rest_url("online_users")))
            .query(&[("on_conflict", "user_id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&json!([{ "user_id": user_id, "last_seen_at": last_seen_at }]))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn remove(&self, user_id: Uuid) -> PlatformResult<()> {
        self.delete_counted("online_users", &[("user_id", format!("eq.{user_id}"))])
            .await?;
        Ok(())
    }

    async fn list_since(&self, since: DateTime<Utc>) -> PlatformResult<Vec<OnlineUser>> {
        self.select(
            "online_users",
            &[
                (
                    "select",
                    "last_seen_at,profile:profiles(username,role,avatar_url)".into(),
                ),
                ("last_seen_at", format!("gt.{}", since.to_rfc3339())),
            ],
        )
        .await
    }
}

#[async_trait]
impl StorageApi for Supabase {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> PlatformResult<()> {
        let resp = self
            .with_service_auth(self.http.post(self.storage_url(bucket, path)))
            .header(header::CONTENT_TYPE, content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn remove(&self, bucket: &str, path: &str) -> PlatformResult<()> {
        let resp = self
            .with_service_auth(self.http.delete(self.storage_url(bucket, path)))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.base_url)
    }
}
