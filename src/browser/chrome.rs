//! Headless Chrome implementation of the timeline page capability.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use tracing::{debug, error, info};

use super::{BrowserError, DomElement, TimelinePage};

/// Default page load timeout in seconds.
pub const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 30;

/// One headless Chrome session owning a single tab.
///
/// Launched once per crawl run and shut down when the run finishes. All
/// timeline interaction goes through the single [`Page`].
pub struct ChromeSession {
    browser: Browser,
    page: Page,
}

impl ChromeSession {
    /// Launch headless Chrome and open a blank tab.
    pub async fn launch(chrome_path: Option<&str>, page_timeout: Duration) -> Result<Self> {
        info!("Launching headless browser");

        let mut config_builder = BrowserConfig::builder()
            .request_timeout(page_timeout)
            .no_sandbox()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--mute-audio")
            .arg("--hide-scrollbars");

        if let Some(path) = chrome_path {
            config_builder = config_builder.chrome_executable(path);
        }

        let browser_config = config_builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch browser")?;

        // Drive the CDP event loop in the background.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {e}");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to open tab")?;

        info!("Headless browser ready");
        Ok(Self { browser, page })
    }

    /// Shut the browser down gracefully.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            error!("Failed to close browser: {e}");
        } else {
            info!("Browser shutdown complete");
        }
    }
}

fn cdp(e: CdpError) -> BrowserError {
    BrowserError::Session(e.to_string())
}

#[async_trait]
impl TimelinePage for ChromeSession {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        debug!(url = %url, "Navigating");
        self.page.goto(url).await.map_err(cdp)?;
        self.page.wait_for_navigation().await.map_err(cdp)?;
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn DomElement>>, BrowserError> {
        let elements = self.page.find_elements(selector).await.map_err(cdp)?;
        Ok(elements
            .into_iter()
            .map(|e| Box::new(ChromeElement(e)) as Box<dyn DomElement>)
            .collect())
    }

    async fn scroll_to_bottom(&self) -> Result<(), BrowserError> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight);")
            .await
            .map_err(cdp)?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        self.page
            .url()
            .await
            .map_err(cdp)?
            .ok_or_else(|| BrowserError::Session("page has no URL".to_string()))
    }
}

struct ChromeElement(Element);

#[async_trait]
impl DomElement for ChromeElement {
    async fn text(&self) -> Result<String, BrowserError> {
        Ok(self.0.inner_text().await.map_err(cdp)?.unwrap_or_default())
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, BrowserError> {
        self.0.attribute(name).await.map_err(cdp)
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn DomElement>>, BrowserError> {
        let elements = self.0.find_elements(selector).await.map_err(cdp)?;
        Ok(elements
            .into_iter()
            .map(|e| Box::new(ChromeElement(e)) as Box<dyn DomElement>)
            .collect())
    }

    async fn click(&self) -> Result<(), BrowserError> {
        self.0.click().await.map_err(cdp)?;
        Ok(())
    }
}
