//! The scroll-driven crawl loop.
//!
//! Owns the one browser session for the lifetime of a run and drives it
//! through scroll → wait for new cards → extract → enrich → persist
//! iterations until the configured stopping condition is met.
//!
//! Extraction is two-phase: phase one reads each unseen card in place
//! without navigating; phase two performs the navigation-requiring
//! enrichments in a fixed order (video resolution first, then detail-view
//! expansion) so element handles are never used after the view they came
//! from has changed.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::browser::{self, BrowserError, TimelinePage};
use crate::config::{Config, StopMode};
use crate::download::MediaDownloader;
use crate::expand;
use crate::extract::{self, DateBounds};
use crate::output;
use crate::post::{Author, Post};
use crate::selectors;
use crate::session::CrawlSession;
use crate::timeparse::ParseError;
use crate::video;

/// Drives one crawl run over one browser session.
pub struct TimelineCrawler<P: TimelinePage> {
    page: P,
    config: Config,
    author: Author,
    bounds: DateBounds,
    downloader: MediaDownloader,
}

impl<P: TimelinePage> TimelineCrawler<P> {
    /// Build a crawler for an already-resolved profile.
    pub fn new(page: P, config: Config, author: Author) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        let downloader = MediaDownloader::new(
            client,
            config.media_dir.clone(),
            config.media_mode(),
            config.overwrite_existing_media,
        );
        let bounds = DateBounds {
            from: config.date_from,
            to: config.date_to,
        };
        Ok(Self {
            page,
            config,
            author,
            bounds,
            downloader,
        })
    }

    /// Run the crawl to completion and return the collected posts.
    pub async fn run(&mut self) -> Result<Vec<Post>> {
        let url = format!("{}{}", self.config.timeline_url_prefix, self.author.numeric_id);
        self.page.goto(&url).await?;
        match browser::wait_for_element(&self.page, selectors::POST_CARD, self.config.wait_timeout)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_render_timeout() => {
                // A profile that never renders a card is a completed,
                // empty run, not a failure.
                info!("Timeline rendered no post cards, writing empty outputs");
                output::write_all(&self.config, &[]).await?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(e).context("timeline session failed before the first card"),
        }

        let mut session = CrawlSession::new();

        match self.config.stop_mode() {
            StopMode::SingleShot => {
                let batch = self.fetch_batch_with_retry(&mut session).await?;
                self.commit_batch(&mut session, batch).await?;
                info!(
                    posts = session.collected_posts.len(),
                    posts_on = ?session.earliest_seen_date,
                    "Captured single page"
                );
            }
            StopMode::Pages(pages) => {
                let mut page_count = 0u32;
                while page_count < pages {
                    page_count += 1;
                    info!(page = page_count, "Getting more posts with a new scroll");
                    let started = Instant::now();
                    let batch = self.scroll_step(&mut session).await?;
                    if batch.is_empty() {
                        info!("Scroll yielded no new posts, stopping early");
                        break;
                    }
                    self.commit_batch(&mut session, batch).await?;
                    info!(
                        page = page_count,
                        posts = session.collected_posts.len(),
                        posts_on = ?session.earliest_seen_date,
                        elapsed_secs = started.elapsed().as_secs_f32(),
                        "Scroll batch complete"
                    );
                }
            }
            StopMode::DateRange { from, .. } => {
                while !session.scrolled_past(from) {
                    info!("Getting more posts with a new scroll");
                    let started = Instant::now();
                    let batch = self.scroll_step(&mut session).await?;
                    if batch.is_empty() {
                        // No posts left inside the range; most likely the
                        // end of the profile's history.
                        info!("Scroll yielded no new posts in range, stopping");
                        break;
                    }
                    self.commit_batch(&mut session, batch).await?;
                    info!(
                        posts = session.collected_posts.len(),
                        posts_on = ?session.earliest_seen_date,
                        elapsed_secs = started.elapsed().as_secs_f32(),
                        "Scroll batch complete"
                    );
                }
            }
        }

        // An empty run still produces (empty) output documents.
        output::write_all(&self.config, &session.collected_posts).await?;
        info!(posts = session.collected_posts.len(), "Finished getting posts");
        Ok(std::mem::take(&mut session.collected_posts))
    }

    /// Give the browser session back, for graceful shutdown.
    pub fn into_page(self) -> P {
        self.page
    }

    /// Append a batch and rewrite the outputs so partial crawls survive.
    async fn commit_batch(&self, session: &mut CrawlSession, batch: Vec<Post>) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        session.collected_posts.extend(batch);
        output::write_all(&self.config, &session.collected_posts).await
    }

    /// Scroll once, wait for new cards, extract the new batch.
    ///
    /// The new-cards wait timing out means the feed stopped growing; that
    /// is the end of history, not a failure, and yields an empty batch.
    async fn scroll_step(&self, session: &mut CrawlSession) -> Result<Vec<Post>> {
        self.page.scroll_to_bottom().await?;
        let wanted = session.seen_count() + 1;
        match browser::wait_for_count(
            &self.page,
            selectors::POST_CARD,
            wanted,
            self.config.wait_timeout,
        )
        .await
        {
            Ok(()) => {}
            Err(e) if e.is_render_timeout() => {
                info!("No new cards rendered after scroll, treating as end of feed");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        }
        self.fetch_batch_with_retry(session).await
    }

    /// Extract the current batch, retrying exactly once on a render
    /// timeout. Any other error, and a second timeout, are fatal.
    async fn fetch_batch_with_retry(&self, session: &mut CrawlSession) -> Result<Vec<Post>> {
        match self.fetch_batch(session).await {
            Ok(batch) => Ok(batch),
            Err(e) if is_render_timeout(&e) => {
                warn!("Fetch step timed out, retrying once: {e:#}");
                self.fetch_batch(session).await
            }
            Err(e) => Err(e),
        }
    }

    /// Phase one and two over all currently-rendered, unseen cards.
    async fn fetch_batch(&self, session: &mut CrawlSession) -> Result<Vec<Post>> {
        let cards = self.page.find_all(selectors::POST_CARD).await?;
        let mut batch = Vec::new();
        // Fingerprints are staged and only committed once the whole pass
        // succeeds; a retried pass must see this pass's cards as unseen.
        let mut staged = Vec::new();

        for card in &cards {
            let card_text = card.text().await?;
            let fingerprint = extract::fingerprint(&card_text);
            if session.is_seen(&fingerprint) || staged.contains(&fingerprint) {
                continue;
            }
            // Once the watermark has dropped below the lower bound the
            // remaining cards are older still; no point extracting them.
            if self.bounds.from.is_some_and(|from| session.scrolled_past(from)) {
                break;
            }
            match extract::extract_card(card.as_ref(), &self.author, &self.bounds, session).await {
                Ok(Some(post)) => batch.push(post),
                Ok(None) => {}
                Err(e) if is_parse_error(&e) => {
                    warn!(fingerprint = %fingerprint, "Skipping unparseable card: {e:#}");
                }
                Err(e) => return Err(e),
            }
            staged.push(fingerprint);
        }
        for fingerprint in staged {
            session.mark_seen(fingerprint);
        }

        self.enrich_batch(&mut batch, session).await;
        self.downloader.download_batch(&batch).await;
        Ok(batch)
    }

    /// Phase two: navigation-requiring enrichments, video first, each post
    /// isolated so one bad detail view doesn't kill the run.
    async fn enrich_batch(&self, batch: &mut [Post], session: &mut CrawlSession) {
        if self.config.resolve_video_links {
            video::resolve_video_links(&self.page, batch, self.config.wait_timeout).await;
        }
        if self.config.fill_truncated_text {
            for post in batch.iter_mut().filter(|p| p.truncated) {
                self.expand_one(post, session).await;
            }
        }
        if self.config.resolve_canonical_urls {
            for post in batch.iter_mut().filter(|p| p.canonical_url.is_none()) {
                self.expand_one(post, session).await;
            }
        }
    }

    async fn expand_one(&self, post: &mut Post, session: &mut CrawlSession) {
        if let Err(e) = expand::resolve_expansion(
            &self.page,
            post,
            &self.author,
            &self.bounds,
            session,
            self.config.wait_timeout,
        )
        .await
        {
            warn!(
                fingerprint = %post.dedup_fingerprint,
                "Expansion failed, post stays unenriched: {e:#}"
            );
        }
    }
}

/// Whether an error chain bottoms out in a render timeout.
fn is_render_timeout(e: &anyhow::Error) -> bool {
    e.chain().any(|cause| {
        cause
            .downcast_ref::<BrowserError>()
            .is_some_and(BrowserError::is_render_timeout)
    })
}

/// Whether an error chain bottoms out in a timestamp parse failure.
fn is_parse_error(e: &anyhow::Error) -> bool {
    e.chain()
        .any(|cause| cause.downcast_ref::<ParseError>().is_some())
}
