//! Models for authentication payloads, the resolved identity, and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Forum roles stored on the profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ToSchema, Default)]
pub enum UserRole {
    /// Regular forum member.
    #[default]
    Member,
    /// Forum founder, full administrative rights.
    Founder,
    /// Developer account, same administrative tier as founder.
    Developer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Member => "member",
            UserRole::Founder => "founder",
            UserRole::Developer => "developer",
        }
    }

    /// Administrative roles are exactly {founder, developer}.
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Founder | UserRole::Developer)
    }
}

impl Serialize for UserRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.to_ascii_lowercase().as_str() {
            "founder" => UserRole::Founder,
            "developer" => UserRole::Developer,
            // A stray role string must never brick session resolution.
            _ => UserRole::Member,
        })
    }
}

/// The validated subject of a request. Constructed per-request from the
/// platform's auth response joined with the stored profile; never cached
/// across requests.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserIdentity {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub role: UserRole,
}

impl UserIdentity {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Profile columns joined onto the auth account during token validation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdentityProfile {
    pub username: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
/// Payload for creating a new account.
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid e-mail address"))]
    pub email: String,
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub password: String,
    #[validate(custom(function = "crate::validation::validate_username"))]
    pub username: String,
    /// Where the confirmation e-mail should send the user; defaults to the
    /// configured frontend confirmation page.
    #[serde(default)]
    pub email_redirect_to: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
/// Credentials submitted at login.
pub struct LoginRequest {
    #[validate(email(message = "must be a valid e-mail address"))]
    pub email: String,
    pub password: String,
    /// Opt-in to a persistent session (30-day refresh cookie).
    #[serde(default)]
    pub keep_logged: bool,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PasswordRecoveryRequest {
    #[validate(email(message = "must be a valid e-mail address"))]
    pub email: String,
}

/// Recovery flow: the token from the reset link plus the new password.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PasswordChangeRequest {
    pub access_token: String,
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub new_password: String,
}

/// Authenticated flow: the identity comes from the session, not the body.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PasswordUpdateRequest {
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AccountDeleteRequest {
    /// Current password, re-verified before the account is removed.
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of `GET /auth/session` for an authenticated caller.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub resolved_at: DateTime<Utc>,
}

impl From<UserIdentity> for SessionUser {
    fn from(identity: UserIdentity) -> Self {
        SessionUser {
            id: identity.id,
            email: identity.email,
            username: identity.username,
            avatar_url: identity.avatar_url,
            role: identity.role,
            resolved_at: Utc::now(),
        }
    }
}
