#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::models::{
    auth::{
        AccountDeleteRequest, LoginRequest, MessageResponse, PasswordChangeRequest,
        PasswordRecoveryRequest, PasswordUpdateRequest, RegisterRequest, SessionUser, UserRole,
    },
    category::{Category, TopicSummary},
    follow::{FollowStats, FollowingStatus},
    forum::{ForumStats, MemberSummary, OnlineUser, RecentPost},
    permission::{PermissionResponse, TopicPermissionCheck},
    profile::{
        AvatarResponse, MemberProfile, ProfileDataUpdate, ProfileListItem, ProfilePublic,
        ProfileUpdate,
    },
    statistic::UserStats,
    topic::{Comment, CommentUpdate, ImageRef, Topic, TopicDetail, TopicPage, TopicUpdate},
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        register_doc,
        login_doc,
        logout_doc,
        session_doc,
        forgot_password_doc,
        change_password_doc,
        update_password_doc,
        delete_account_doc,
        admin_login_doc,
        get_profile_doc,
        update_profile_doc,
        update_profile_data_doc,
        upload_avatar_doc,
        delete_avatar_doc,
        list_categories_doc,
        topics_by_category_doc,
        create_topic_doc,
        get_topic_doc,
        get_topic_by_slug_doc,
        update_topic_doc,
        delete_topic_doc,
        create_comment_doc,
        update_comment_doc,
        delete_comment_doc,
        check_topic_permission_doc,
        check_comment_permission_doc,
        follow_doc,
        unfollow_doc,
        follow_stats_doc,
        followers_doc,
        following_doc,
        is_following_doc,
        remove_follower_doc,
        forum_stats_doc,
        recent_posts_doc,
        online_users_doc,
        list_users_doc,
        ping_doc,
        user_stats_doc,
        user_topics_doc
    ),
    components(
        schemas(
            // auth
            RegisterRequest,
            LoginRequest,
            PasswordRecoveryRequest,
            PasswordChangeRequest,
            PasswordUpdateRequest,
            AccountDeleteRequest,
            SessionUser,
            UserRole,
            MessageResponse,
            // profiles
            ProfilePublic,
            ProfileUpdate,
            ProfileDataUpdate,
            ProfileListItem,
            MemberProfile,
            AvatarResponse,
            // categories & topics
            Category,
            TopicSummary,
            Topic,
            TopicDetail,
            TopicPage,
            TopicUpdate,
            Comment,
            CommentUpdate,
            ImageRef,
            TopicPermissionCheck,
            PermissionResponse,
            // follows
            FollowStats,
            FollowingStatus,
            // forum & stats
            ForumStats,
            MemberSummary,
            RecentPost,
            OnlineUser,
            UserStats
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login and session lifecycle"),
        (name = "Profile", description = "Profile pages, updates and avatars"),
        (name = "Posts", description = "Topics and comments"),
        (name = "Permission", description = "Creation-permission checks"),
        (name = "Follow", description = "Follow relationships"),
        (name = "Forum", description = "Forum-wide stats and presence"),
        (name = "User", description = "User directory and presence heartbeat")
    )
)]
pub struct ApiDoc;

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = MessageResponse),
        (status = 409, description = "Username or e-mail already taken")
    ),
    tag = "Auth"
)]
fn register_doc() {}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, session cookies set", body = SessionUser),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
fn login_doc() {}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 200, description = "Session cookies cleared", body = MessageResponse)),
    tag = "Auth"
)]
fn logout_doc() {}

#[utoipa::path(
    get,
    path = "/auth/session",
    responses((status = 200, description = "Current user, or null when anonymous", body = Option<SessionUser>)),
    tag = "Auth"
)]
fn session_doc() {}

#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    request_body = PasswordRecoveryRequest,
    responses(
        (status = 200, description = "Recovery e-mail queued", body = MessageResponse),
        (status = 429, description = "Too many recovery attempts")
    ),
    tag = "Auth"
)]
fn forgot_password_doc() {}

#[utoipa::path(
    put,
    path = "/auth/change-password",
    request_body = PasswordChangeRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 401, description = "Invalid or expired recovery token")
    ),
    tag = "Auth"
)]
fn change_password_doc() {}

#[utoipa::path(
    patch,
    path = "/auth/update-password",
    request_body = PasswordUpdateRequest,
    responses((status = 200, description = "Password updated", body = MessageResponse)),
    tag = "Auth"
)]
fn update_password_doc() {}

#[utoipa::path(
    delete,
    path = "/auth/delete-account",
    request_body = AccountDeleteRequest,
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "Password re-verification failed")
    ),
    tag = "Auth"
)]
fn delete_account_doc() {}

#[utoipa::path(
    post,
    path = "/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Admin logged in", body = SessionUser),
        (status = 403, description = "Account is not an administrator")
    ),
    tag = "Auth"
)]
fn admin_login_doc() {}

#[utoipa::path(
    get,
    path = "/profile/{username}",
    params(("username" = String, Path, description = "Profile to look up")),
    responses(
        (status = 200, description = "Public profile", body = ProfilePublic),
        (status = 404, description = "Profile not found")
    ),
    tag = "Profile"
)]
fn get_profile_doc() {}

#[utoipa::path(
    put,
    path = "/profile/update",
    request_body = ProfileUpdate,
    responses((status = 200, description = "Profile updated", body = MessageResponse)),
    tag = "Profile"
)]
fn update_profile_doc() {}

#[utoipa::path(
    patch,
    path = "/profile/update-data",
    request_body = ProfileDataUpdate,
    responses(
        (status = 200, description = "Username/e-mail updated", body = MessageResponse),
        (status = 409, description = "Username already taken")
    ),
    tag = "Profile"
)]
fn update_profile_data_doc() {}

#[utoipa::path(
    patch,
    path = "/profile/user/avatar",
    responses((status = 200, description = "Avatar stored", body = AvatarResponse)),
    tag = "Profile"
)]
fn upload_avatar_doc() {}

#[utoipa::path(
    delete,
    path = "/profile/user/avatar",
    responses((status = 200, description = "Avatar removed", body = AvatarResponse)),
    tag = "Profile"
)]
fn delete_avatar_doc() {}

#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "All categories", body = [Category])),
    tag = "Posts"
)]
fn list_categories_doc() {}

#[utoipa::path(
    get,
    path = "/categories/topics/category/{category}",
    params(
        ("category" = String, Path, description = "Category slug"),
        ("page" = Option<i64>, Query, description = "1-based page"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)")
    ),
    responses(
        (status = 200, description = "Topic page, newest first"),
        (status = 404, description = "Unknown category or page past the end")
    ),
    tag = "Posts"
)]
fn topics_by_category_doc() {}

#[utoipa::path(
    post,
    path = "/posts",
    responses(
        (status = 201, description = "Topic created", body = Topic),
        (status = 403, description = "Permission check rejected the author")
    ),
    tag = "Posts"
)]
fn create_topic_doc() {}

#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Topic id")),
    responses(
        (status = 200, description = "Topic with one comment page", body = TopicPage),
        (status = 404, description = "Topic not found")
    ),
    tag = "Posts"
)]
fn get_topic_doc() {}

#[utoipa::path(
    get,
    path = "/posts/slug/{slug}",
    params(("slug" = String, Path, description = "Topic slug")),
    responses(
        (status = 200, description = "Topic with one comment page", body = TopicPage),
        (status = 404, description = "Topic not found")
    ),
    tag = "Posts"
)]
fn get_topic_by_slug_doc() {}

#[utoipa::path(
    patch,
    path = "/posts/{id}",
    request_body = TopicUpdate,
    responses(
        (status = 200, description = "Topic updated", body = MessageResponse),
        (status = 403, description = "Not the author")
    ),
    tag = "Posts"
)]
fn update_topic_doc() {}

#[utoipa::path(
    delete,
    path = "/posts/{id}",
    responses(
        (status = 200, description = "Topic deleted", body = MessageResponse),
        (status = 403, description = "Not the author")
    ),
    tag = "Posts"
)]
fn delete_topic_doc() {}

#[utoipa::path(
    post,
    path = "/posts/{id}/comments",
    responses(
        (status = 201, description = "Comment created", body = Comment),
        (status = 403, description = "Permission check rejected the author")
    ),
    tag = "Posts"
)]
fn create_comment_doc() {}

#[utoipa::path(
    patch,
    path = "/posts/comments/{id}",
    request_body = CommentUpdate,
    responses(
        (status = 200, description = "Comment updated", body = MessageResponse),
        (status = 403, description = "Not the author")
    ),
    tag = "Posts"
)]
fn update_comment_doc() {}

#[utoipa::path(
    delete,
    path = "/posts/comments/{id}",
    responses(
        (status = 200, description = "Comment deleted", body = MessageResponse),
        (status = 403, description = "Not the author")
    ),
    tag = "Posts"
)]
fn delete_comment_doc() {}

#[utoipa::path(
    post,
    path = "/permission/topics/check-permission",
    request_body = TopicPermissionCheck,
    responses(
        (status = 200, description = "Whether the caller may create a topic", body = PermissionResponse),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Permission"
)]
fn check_topic_permission_doc() {}

#[utoipa::path(
    get,
    path = "/permission/comments/{topic_id}/check-permission",
    responses(
        (status = 200, description = "Whether the caller may comment on the topic", body = PermissionResponse),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Permission"
)]
fn check_comment_permission_doc() {}

#[utoipa::path(
    post,
    path = "/follow/{username}",
    responses(
        (status = 200, description = "Now following", body = MessageResponse),
        (status = 409, description = "Already following")
    ),
    tag = "Follow"
)]
fn follow_doc() {}

#[utoipa::path(
    delete,
    path = "/follow/{username}",
    responses((status = 200, description = "Unfollowed", body = MessageResponse)),
    tag = "Follow"
)]
fn unfollow_doc() {}

#[utoipa::path(
    get,
    path = "/follow/stats/{username}",
    responses((status = 200, description = "Follower/following counters", body = FollowStats)),
    tag = "Follow"
)]
fn follow_stats_doc() {}

#[utoipa::path(
    get,
    path = "/follow/followers/{username}",
    responses((status = 200, description = "Follower list", body = [MemberProfile])),
    tag = "Follow"
)]
fn followers_doc() {}

#[utoipa::path(
    get,
    path = "/follow/following/{username}",
    responses((status = 200, description = "Following list", body = [MemberProfile])),
    tag = "Follow"
)]
fn following_doc() {}

#[utoipa::path(
    get,
    path = "/follow/is-following/{username}",
    responses((status = 200, description = "Whether the caller follows the user", body = FollowingStatus)),
    tag = "Follow"
)]
fn is_following_doc() {}

#[utoipa::path(
    delete,
    path = "/follow/remove-follower/{username}",
    responses(
        (status = 200, description = "Follower removed", body = MessageResponse),
        (status = 404, description = "The user does not follow the caller")
    ),
    tag = "Follow"
)]
fn remove_follower_doc() {}

#[utoipa::path(
    get,
    path = "/forum/stats",
    responses((status = 200, description = "Forum-wide counters", body = ForumStats)),
    tag = "Forum"
)]
fn forum_stats_doc() {}

#[utoipa::path(
    get,
    path = "/forum/posts/recent",
    params(("limit" = Option<i64>, Query, description = "Number of posts (max 20)")),
    responses((status = 200, description = "Most recent posts", body = [RecentPost])),
    tag = "Forum"
)]
fn recent_posts_doc() {}

#[utoipa::path(
    get,
    path = "/forum/online",
    responses((status = 200, description = "Users seen within the last two minutes", body = [OnlineUser])),
    tag = "Forum"
)]
fn online_users_doc() {}

#[utoipa::path(
    get,
    path = "/user/all",
    params(
        ("page" = Option<i64>, Query, description = "1-based page"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)")
    ),
    responses((status = 200, description = "Member directory page")),
    tag = "User"
)]
fn list_users_doc() {}

#[utoipa::path(
    post,
    path = "/user/ping",
    responses(
        (status = 200, description = "Presence refreshed", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    ),
    tag = "User"
)]
fn ping_doc() {}

#[utoipa::path(
    get,
    path = "/statistic/profile/{username}/stats",
    responses(
        (status = 200, description = "Activity statistics", body = UserStats),
        (status = 404, description = "User not found")
    ),
    tag = "User"
)]
fn user_stats_doc() {}

#[utoipa::path(
    get,
    path = "/statistic/profile/{username}/topics",
    responses((status = 200, description = "Topics authored by the user", body = [TopicSummary])),
    tag = "User"
)]
fn user_topics_doc() {}
