//! Post persistence: JSON and CSV documents.
//!
//! Both documents are rewritten in full after every scroll batch so a
//! partial crawl is never fully lost; neither format is appendable.

pub mod csv;
pub mod json;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::Config;
use crate::post::Post;

/// Rewrite every configured output with the full accumulated post set.
pub async fn write_all(config: &Config, posts: &[Post]) -> Result<()> {
    if let Some(path) = &config.save_path_json {
        let document = json::render(posts, config.emit_compact_record_format)?;
        tokio::fs::write(path, document)
            .await
            .with_context(|| format!("Failed to write JSON output to {}", path.display()))?;
        debug!(path = %path.display(), posts = posts.len(), "JSON output written");
    }
    if let Some(path) = &config.save_path_csv {
        let document = csv::render(posts);
        tokio::fs::write(path, document)
            .await
            .with_context(|| format!("Failed to write CSV output to {}", path.display()))?;
        debug!(path = %path.display(), posts = posts.len(), "CSV output written");
    }
    Ok(())
}

/// Timestamp formatting shared by both documents.
pub(crate) fn format_time(time: &chrono::NaiveDateTime) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}
