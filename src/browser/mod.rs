//! Browser session capability, decoupled from any automation library.
//!
//! The scraper core works against [`TimelinePage`] and [`DomElement`] so the
//! extraction and pagination logic never names chromiumoxide types; the real
//! implementation lives in [`chrome`], and tests drive the core with a fake.
//!
//! There is exactly one browser session per run and every DOM interaction is
//! serialized against it. Element handles are only valid until the next
//! navigation or scroll; callers must not keep them across iterations.

pub mod chrome;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// How often bounded waits re-poll the DOM.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum BrowserError {
    /// An awaited DOM state never appeared within the bound.
    #[error("timed out after {timeout:?} waiting for {what}")]
    RenderTimeout { what: String, timeout: Duration },
    /// Anything else the underlying session reported.
    #[error("browser session error: {0}")]
    Session(String),
}

impl BrowserError {
    #[must_use]
    pub fn is_render_timeout(&self) -> bool {
        matches!(self, Self::RenderTimeout { .. })
    }
}

/// A handle to one rendered DOM element.
///
/// Handles go stale after any navigation or scroll; they are borrowed from
/// the page for the duration of one iteration only.
#[async_trait]
pub trait DomElement: Send + Sync {
    /// The element's rendered text content.
    async fn text(&self) -> Result<String, BrowserError>;

    /// An attribute value, if present.
    async fn attr(&self, name: &str) -> Result<Option<String>, BrowserError>;

    /// Matching descendant elements.
    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn DomElement>>, BrowserError>;

    /// Simulate a click on the element.
    async fn click(&self) -> Result<(), BrowserError>;
}

/// The one rendered timeline page of a crawl run.
#[async_trait]
pub trait TimelinePage: Send + Sync {
    /// Navigate the page to a URL.
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    /// All elements currently matching the selector, in document order.
    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn DomElement>>, BrowserError>;

    /// Scroll to the bottom of the document, triggering lazy loading.
    async fn scroll_to_bottom(&self) -> Result<(), BrowserError>;

    /// The page's current URL.
    async fn current_url(&self) -> Result<String, BrowserError>;
}

/// Wait until at least one element matches, polling up to `timeout`.
pub async fn wait_for_element(
    page: &dyn TimelinePage,
    selector: &str,
    timeout: Duration,
) -> Result<(), BrowserError> {
    wait_for_count(page, selector, 1, timeout).await
}

/// Wait until at least `count` elements match, polling up to `timeout`.
pub async fn wait_for_count(
    page: &dyn TimelinePage,
    selector: &str,
    count: usize,
    timeout: Duration,
) -> Result<(), BrowserError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if page.find_all(selector).await?.len() >= count {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(BrowserError::RenderTimeout {
                what: format!("{count}+ elements matching `{selector}`"),
                timeout,
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
