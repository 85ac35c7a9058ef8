use serde::{Deserialize, Serialize};

/// One catalog entry whose reviews get harvested.
///
/// `app_id` starts out absent for freshly seeded rows and is derived from
/// `application_url` exactly once; re-deriving yields the same value.
/// `has_reviews` is derived from the store: true iff a non-empty review set
/// is currently attached to this app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
    pub id: i64,
    pub app_id: Option<i64>,
    pub application_url: String,
    pub has_reviews: bool,
}

/// One customer review parsed from a feed page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub review_id: i64,
    pub app_id: i64,
    pub app_version: String,
    pub author_id: i64,
    pub author_name: String,
    pub rating: i64,
    pub title: String,
    pub content: String,
}

/// Version label stored when the feed item carries none.
pub const UNKNOWN_VERSION: &str = "UNKNOWN";
