//! Site visit models used for the secondary statistics section.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Maximum stored length of a page path.
pub const MAX_PAGE_LEN: usize = 255;

/// A `{page, count}` pair in the page ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCount {
    pub page: String,
    pub count: i64,
}

/// Visit counters computed from the visit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitStats {
    pub total_visits: i64,
    pub today_visits: i64,
    pub top_pages: Vec<PageCount>,
}

/// Request payload for recording a page view.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordVisitRequest {
    #[validate(length(min = 1, message = "Page is required"))]
    pub page: String,
}
