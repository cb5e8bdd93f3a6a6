//! Direct video URL resolution through the inline player.
//!
//! Must run before the page scrolls further: it matches the player element
//! by the content hash recorded at extraction time, and the element has to
//! still be in the DOM for that.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::browser::{wait_for_element, TimelinePage};
use crate::extract;
use crate::post::Post;
use crate::selectors;

/// Resolve direct video URLs for every post in the batch that recorded a
/// deferred video fingerprint. Per-post failures are logged and skipped.
pub async fn resolve_video_links(
    page: &dyn TimelinePage,
    posts: &mut [Post],
    timeout: Duration,
) {
    for post in posts.iter_mut() {
        if post.video_fingerprint.is_none() {
            continue;
        }
        if let Err(e) = resolve_one(page, post, timeout).await {
            warn!(
                fingerprint = %post.dedup_fingerprint,
                "Video resolution failed, leaving URL unset: {e:#}"
            );
        }
    }
}

async fn resolve_one(page: &dyn TimelinePage, post: &mut Post, timeout: Duration) -> Result<()> {
    let wanted = post
        .video_fingerprint
        .as_deref()
        .context("post has no video fingerprint")?;

    let candidates = page.find_all(selectors::TIMELINE_VIDEO).await?;
    let mut player = None;
    for candidate in candidates {
        if extract::fingerprint(&candidate.text().await?) == wanted {
            player = Some(candidate);
            break;
        }
    }
    let player = player.context("video element no longer present on timeline")?;

    player.click().await?;
    wait_for_element(page, selectors::VIDEO_QUALITY_ITEM, timeout)
        .await
        .context("quality menu never rendered")?;

    // First menu entry is the highest quality.
    let menu_items = page.find_all(selectors::VIDEO_QUALITY_ITEM).await?;
    let highest = menu_items.first().context("quality menu is empty")?;
    highest.click().await?;

    wait_for_element(page, selectors::VIDEO_ELEMENT, timeout)
        .await
        .context("video element never rendered")?;
    let videos = page.find_all(selectors::VIDEO_ELEMENT).await?;
    let video = videos.first().context("video element disappeared")?;
    let src = video
        .attr("src")
        .await?
        .context("video element has no src")?;

    debug!(url = %src, "Video URL resolved");
    post.video_url = Some(src);

    // Close the player so the timeline is interactive again.
    let dispose_buttons = page.find_all(selectors::VIDEO_DISPOSE).await?;
    match dispose_buttons.first() {
        Some(button) => button.click().await?,
        None => warn!("Player has no dispose button"),
    }
    Ok(())
}
