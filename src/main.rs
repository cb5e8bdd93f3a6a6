use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use weibo_scraper::browser::chrome::ChromeSession;
use weibo_scraper::config::Config;
use weibo_scraper::crawler::TimelineCrawler;
use weibo_scraper::lookup;
use weibo_scraper::post::Author;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting weibo-scraper");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    // Resolve the target profile before any browser work.
    let author = resolve_author(&config).await?;
    info!(
        uid = author.numeric_id,
        username = author.display_name.as_deref().unwrap_or(""),
        "Target profile resolved"
    );

    let session = ChromeSession::launch(config.chrome_path.as_deref(), config.wait_timeout)
        .await
        .context("Failed to launch browser session")?;

    let mut crawler = TimelineCrawler::new(session, config, author)?;
    let result = crawler.run().await;
    let session = crawler.into_page();
    session.shutdown().await;

    let posts = result?;
    info!(posts = posts.len(), "Crawl complete");
    Ok(())
}

/// Resolve the configured target to a numeric uid, via the lookup service
/// when only a display name was given.
async fn resolve_author(config: &Config) -> Result<Author> {
    if let Some(uid) = config.uid {
        return Ok(Author {
            display_name: None,
            numeric_id: uid,
        });
    }
    let username = config
        .username
        .clone()
        .context("validated config has neither uid nor username")?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;
    let uid = lookup::uid_for_username(&client, &username)
        .await
        .context("Failed to resolve username to uid")?;
    Ok(Author {
        display_name: Some(username),
        numeric_id: uid,
    })
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,weibo_scraper=debug"));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
