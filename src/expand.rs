//! Truncated-text and canonical-URL recovery via a post's detail view.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::browser::{wait_for_element, TimelinePage};
use crate::extract::{self, DateBounds};
use crate::post::{Author, Post};
use crate::selectors;
use crate::session::CrawlSession;

/// Open a post's detail view and merge the re-extracted fields back.
///
/// Re-locates the card on the timeline by fingerprint, clicks through to
/// the detail page, re-runs extraction against the expanded card, records
/// the page URL as the canonical URL, then navigates back and waits for
/// the timeline to show again.
///
/// Fails if the card is gone, the detail view never renders, or the way
/// back times out. Callers treat a failure as "this post stays
/// unenriched", not as a reason to abort the run.
pub async fn resolve_expansion(
    page: &dyn TimelinePage,
    post: &mut Post,
    author: &Author,
    bounds: &DateBounds,
    session: &mut CrawlSession,
    timeout: Duration,
) -> Result<()> {
    let cards = page.find_all(selectors::POST_CARD).await?;
    let mut matched = None;
    for card in cards {
        if extract::fingerprint(&card.text().await?) == post.dedup_fingerprint {
            matched = Some(card);
            break;
        }
    }
    let card = matched.context("card no longer present on timeline")?;

    let text_divs = card.find_all(selectors::POST_TEXT).await?;
    let text_div = text_divs.first().context("card has no text element")?;
    text_div.click().await?;
    wait_for_element(page, selectors::DETAIL_MARKER, timeout)
        .await
        .context("detail view never rendered")?;

    // The detail page renders the post as its first (and only) card.
    let expanded_result = async {
        let detail_cards = page.find_all(selectors::POST_CARD).await?;
        let detail_card = detail_cards.first().context("detail view has no card")?;
        let mut expanded = extract::extract_card(detail_card.as_ref(), author, bounds, session)
            .await?
            .context("expanded card did not extract")?;
        expanded.canonical_url = Some(page.current_url().await?);
        Ok::<Post, anyhow::Error>(expanded)
    }
    .await;

    // Navigate back before reporting any extraction failure, otherwise the
    // session is stuck on the detail page for every following post.
    let back_result = navigate_back(page, timeout).await;

    let expanded = expanded_result?;
    back_result?;

    debug!(url = ?expanded.canonical_url, "Expansion resolved");
    post.merge_expanded(&expanded);
    Ok(())
}

async fn navigate_back(page: &dyn TimelinePage, timeout: Duration) -> Result<()> {
    let back_buttons = page.find_all(selectors::DETAIL_BACK).await?;
    match back_buttons.first() {
        Some(button) => button.click().await?,
        None => warn!("Detail view has no back button"),
    }
    wait_for_element(page, selectors::TIMELINE_MARKER, timeout)
        .await
        .context("timeline never re-rendered after detail view")?;
    Ok(())
}
