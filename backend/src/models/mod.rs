//! Data models shared between the platform client and the API handlers.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub mod auth;
pub mod category;
pub mod follow;
pub mod forum;
pub mod permission;
pub mod profile;
pub mod statistic;
pub mod topic;

/// Query parameters for page-numbered endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Page size (default: 20, max: 100).
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, 100)
    }

    /// Zero-based offset of the first record on this page.
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

/// Wrapper for paginated API responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total_count: i64,
}
