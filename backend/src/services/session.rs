//! Cookie-session resolution.
//!
//! Sessions live in two httpOnly cookies: a short-lived access token and a
//! refresh token. Resolution tries the access token first, then falls back
//! to a single refresh exchange. Identities are rebuilt per request from the
//! auth API joined with the stored profile and never cached.

use std::sync::Arc;
use std::time::Duration;

use crate::models::auth::UserIdentity;
use crate::platform::{AuthApi, ForumStore, PlatformError, PlatformResult};

/// Lifetime of the access cookie, matching the platform's token expiry.
pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);
/// Refresh cookie lifetime. Only set when the user opted into
/// "keep me logged in"; plain logins carry no refresh cookie at all.
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Result of resolving the session cookies on a request.
#[derive(Debug)]
pub enum SessionOutcome {
    /// The access token was valid as presented.
    Valid(UserIdentity),
    /// The access token was missing or stale but the refresh token minted a
    /// new session; the caller must re-issue the access cookie.
    Renewed {
        identity: UserIdentity,
        access_token: String,
    },
    /// Neither token produced an identity. Terminal for these cookies.
    Expired,
    /// The platform could not be reached (or answered garbage) while
    /// validating. The request proceeds anonymously but the cookies stay; a
    /// blip must not log anyone out.
    Unverified,
}

#[derive(Clone)]
pub struct SessionManager {
    auth: Arc<dyn AuthApi>,
    store: Arc<dyn ForumStore>,
}

impl SessionManager {
    pub fn new(auth: Arc<dyn AuthApi>, store: Arc<dyn ForumStore>) -> Self {
        Self { auth, store }
    }

    /// Validates a bearer access token and joins the stored profile onto it.
    /// An account without a profile row is treated as not found.
    pub async fn identity_for_token(&self, access_token: &str) -> PlatformResult<UserIdentity> {
        let user = self.auth.get_user(access_token).await?;
        let profile = self
            .store
            .identity_profile(user.id)
            .await?
            .ok_or(PlatformError::RowNotFound)?;
        Ok(UserIdentity {
            id: user.id,
            email: user.email,
            username: profile.username,
            avatar_url: profile.avatar_url,
            role: profile.role,
        })
    }

    /// Resolves the cookie pair into a session outcome. Infallible by
    /// construction: the request always gets an answer about who it is.
    ///
    /// Rejected tokens fall through the ladder and end `Expired`. Transport
    /// and decode failures end `Unverified` instead, without spending the
    /// single-use refresh token, so the caller is treated as anonymous for
    /// this request only.
    pub async fn resolve_cookies(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> SessionOutcome {
        if let Some(token) = access_token {
            match self.identity_for_token(token).await {
                Ok(identity) => return SessionOutcome::Valid(identity),
                Err(PlatformError::Api { .. }) | Err(PlatformError::RowNotFound) => {}
                Err(_) => return SessionOutcome::Unverified,
            }
        }

        let Some(token) = refresh_token else {
            return SessionOutcome::Expired;
        };

        // Refresh tokens are single-use; one exchange per request.
        let session = match self.auth.refresh_session(token).await {
            Ok(session) => session,
            Err(PlatformError::Api { .. }) | Err(PlatformError::RowNotFound) => {
                return SessionOutcome::Expired
            }
            Err(_) => return SessionOutcome::Unverified,
        };

        match self.identity_for_token(&session.access_token).await {
            Ok(identity) => SessionOutcome::Renewed {
                identity,
                access_token: session.access_token,
            },
            Err(PlatformError::Api { .. }) | Err(PlatformError::RowNotFound) => {
                SessionOutcome::Expired
            }
            Err(_) => SessionOutcome::Unverified,
        }
    }
}
