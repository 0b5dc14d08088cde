//! Creation-permission check payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Asks whether the caller may open a topic in the given category.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TopicPermissionCheck {
    pub category_slug: String,
}

/// Outcome of a permission check. The decision itself is opaque; only the
/// verdict is exposed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PermissionResponse {
    pub allowed: bool,
}
