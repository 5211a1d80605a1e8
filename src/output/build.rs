//! Final assembly of the combined feed model.

use crate::feed::FeedItem;
use chrono::{DateTime, Utc};

/// Feed-level metadata for the combined feed, taken from configuration.
/// Title and description are guaranteed present by config validation.
#[derive(Debug, Clone)]
pub struct FeedMetadata {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
}

/// The aggregate result of one run: metadata plus the ordered, truncated
/// item list. Consumed exactly once by the serializer.
#[derive(Debug)]
pub struct CombinedFeed {
    pub title: String,
    pub description: String,
    pub last_updated: DateTime<Utc>,
    pub image_url: Option<String>,
    pub items: Vec<FeedItem>,
}

impl CombinedFeed {
    /// Pure assembly — no filtering or reordering happens here. The item
    /// list is trusted to be final.
    pub fn build(items: Vec<FeedItem>, meta: FeedMetadata, now: DateTime<Utc>) -> Self {
        Self {
            title: meta.title,
            description: meta.description,
            last_updated: now,
            image_url: meta.image_url,
            items,
        }
    }
}
