//! Post extraction from one rendered timeline card.
//!
//! This is the cheap, navigation-free phase: everything here reads the
//! card subtree as it stands. Video URL resolution and truncated-text
//! expansion navigate the page and run later, against a stable timeline.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use tracing::trace;

use crate::browser::DomElement;
use crate::post::{Author, Post};
use crate::selectors;
use crate::session::CrawlSession;
use crate::timeparse;

/// Thumbnail path segments that have a `large` full-resolution variant.
const THUMBNAIL_SIZE_SEGMENTS: [&str; 4] = ["orj360", "orj480", "orj720", "orj1080"];

/// Date bounds applied to extracted posts. Both ends optional.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateBounds {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateBounds {
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        if self.from.is_some_and(|from| date < from) {
            return false;
        }
        if self.to.is_some_and(|to| date > to) {
            return false;
        }
        true
    }
}

/// Content hash identifying a rendered element within one run.
///
/// Transcript-dependent (relative timestamps re-render), so never treat it
/// as a stable identity across sessions.
#[must_use]
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Extract a structured post from one rendered card.
///
/// Updates the session watermarks from the post's date even when the date
/// filter then excludes it (`Ok(None)`). Fails if the card is missing its
/// time element or the timestamp doesn't parse.
pub async fn extract_card(
    card: &dyn DomElement,
    author: &Author,
    bounds: &DateBounds,
    session: &mut CrawlSession,
) -> Result<Option<Post>> {
    let time_elements = card.find_all(selectors::POST_TIME).await?;
    let time_element = time_elements.first().context("card has no time element")?;
    let time_text = time_element.text().await?;
    let published_at = timeparse::parse(&time_text)
        .with_context(|| format!("unparseable card timestamp `{time_text}`"))?;

    session.observe_date(published_at.date());
    if !bounds.contains(published_at.date()) {
        trace!(date = %published_at.date(), "Card outside date bounds");
        return Ok(None);
    }

    let card_text = card.text().await?;
    let dedup_fingerprint = fingerprint(&card_text);

    // Text divs: body text plus anchor scanning for the truncation marker
    // and external web links.
    let text_divs = card.find_all(selectors::POST_TEXT).await?;
    let mut truncated = false;
    let mut external_links = Vec::new();
    let mut body_parts = Vec::new();
    for div in &text_divs {
        for anchor in div.find_all(selectors::ANCHOR).await? {
            let anchor_text = anchor.text().await?;
            if anchor_text.contains(selectors::FULL_TEXT_MARKER) {
                truncated = true;
            }
            if anchor_text.contains(selectors::WEB_LINK_MARKER) {
                if let Some(href) = anchor.attr("href").await? {
                    if !external_links.contains(&href) {
                        external_links.push(href);
                    }
                }
            }
        }
        body_parts.push(div.text().await?);
    }
    let body_text = body_parts.join("\n");

    // Media container: thumbnails, their full-size variants, and the
    // inline video element's own hash for deferred resolution.
    let mut thumbnail_image_urls = Vec::new();
    let mut full_image_urls = Vec::new();
    let mut video_fingerprint = None;
    let media_wraps = card.find_all(selectors::MEDIA_WRAP).await?;
    if let Some(wrap) = media_wraps.first() {
        for img in wrap.find_all(selectors::IMAGE).await? {
            if let Some(src) = img.attr("src").await? {
                full_image_urls.push(upgrade_image_url(&src));
                thumbnail_image_urls.push(src);
            }
        }
        let videos = wrap.find_all(selectors::TIMELINE_VIDEO).await?;
        if let Some(video) = videos.first() {
            video_fingerprint = Some(fingerprint(&video.text().await?));
        }
    }

    Ok(Some(Post {
        author: author.clone(),
        body_text,
        published_at,
        thumbnail_image_urls,
        full_image_urls,
        video_url: None,
        external_links,
        canonical_url: None,
        dedup_fingerprint,
        truncated,
        video_fingerprint,
    }))
}

/// Derive the full-resolution image URL from a thumbnail URL.
///
/// Replaces any known thumbnail size path segment with `large`, leaving the
/// rest of the path untouched.
#[must_use]
pub fn upgrade_image_url(url: &str) -> String {
    url.split('/')
        .map(|segment| {
            if THUMBNAIL_SIZE_SEGMENTS.contains(&segment) {
                "large"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
