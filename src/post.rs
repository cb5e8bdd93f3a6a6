//! The post record produced by timeline extraction.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Who wrote the post. The numeric uid is the durable identity; the
/// display name is whatever the profile was configured with at run time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub display_name: Option<String>,
    pub numeric_id: u64,
}

/// One scraped post.
///
/// `thumbnail_image_urls` and `full_image_urls` are positionally aligned
/// and always the same length; the full URLs are the size-upgraded
/// variants of the thumbnails. `dedup_fingerprint` is a content hash of
/// the rendered card text, valid for deduplication only within a single
/// run (it changes as relative timestamps re-render).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub author: Author,
    pub body_text: String,
    pub published_at: NaiveDateTime,
    pub thumbnail_image_urls: Vec<String>,
    pub full_image_urls: Vec<String>,
    pub video_url: Option<String>,
    pub external_links: Vec<String>,
    pub canonical_url: Option<String>,
    pub dedup_fingerprint: String,
    pub truncated: bool,
    /// Content hash of the card's inline video element, recorded during
    /// extraction so the player can be located later without re-walking
    /// the card. Resolution is deferred because it navigates the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_fingerprint: Option<String>,
}

impl Post {
    /// Merge fields re-extracted from the post's expanded detail view.
    ///
    /// Every field except `video_url` takes the expanded value when it is
    /// non-empty and differs. `dedup_fingerprint` is also kept as-is: the
    /// expanded card hashes differently, and the timeline seen-set and
    /// video matching both key on the original hash.
    pub fn merge_expanded(&mut self, expanded: &Self) {
        if !expanded.body_text.is_empty() && self.body_text != expanded.body_text {
            self.body_text = expanded.body_text.clone();
        }
        self.published_at = expanded.published_at;
        if !expanded.thumbnail_image_urls.is_empty() {
            self.thumbnail_image_urls = expanded.thumbnail_image_urls.clone();
            self.full_image_urls = expanded.full_image_urls.clone();
        }
        if !expanded.external_links.is_empty() {
            self.external_links = expanded.external_links.clone();
        }
        if expanded.canonical_url.is_some() {
            self.canonical_url = expanded.canonical_url.clone();
        }
        self.truncated = expanded.truncated;
    }

    /// The post id, parsed from the canonical URL's trailing path segment.
    #[must_use]
    pub fn post_id(&self) -> Option<&str> {
        self.canonical_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .and_then(|u| u.rsplit('/').next())
            .filter(|s| !s.is_empty())
    }
}
