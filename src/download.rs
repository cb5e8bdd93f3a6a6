//! Media downloads: post images and resolved videos to local files.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::MediaMode;
use crate::post::Post;

/// Characters the filesystem can't have, stripped during sanitization.
static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|@]"#).unwrap());

/// Maximum length of the sanitized text+date part of a filename.
const PREFIX_MAX_CHARS: usize = 25;

#[derive(Debug, Error)]
pub enum MediaFetchError {
    #[error("fetch failed for {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("server returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of one file fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Downloaded,
    /// Destination already existed and overwrite is disabled. A success,
    /// not an error.
    AlreadyExists,
}

/// Downloads a post's media files into the media directory.
///
/// Per-file failures are logged and the batch continues; a bad CDN URL on
/// one post must not cost the rest of the crawl its media.
pub struct MediaDownloader {
    client: reqwest::Client,
    media_dir: PathBuf,
    mode: MediaMode,
    overwrite: bool,
}

impl MediaDownloader {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        media_dir: PathBuf,
        mode: MediaMode,
        overwrite: bool,
    ) -> Self {
        Self {
            client,
            media_dir,
            mode,
            overwrite,
        }
    }

    /// Download media for every post in the batch.
    pub async fn download_batch(&self, posts: &[Post]) {
        if posts.is_empty() {
            return;
        }
        if let Err(e) = tokio::fs::create_dir_all(&self.media_dir).await {
            warn!(
                dir = %self.media_dir.display(),
                "Cannot create media directory, skipping downloads: {e}"
            );
            return;
        }
        let mut skipped = 0usize;
        for post in posts {
            skipped += self.download_post(post).await;
        }
        if skipped > 0 {
            info!(skipped, "Some media files already existed, skipped");
        }
    }

    /// Download one post's media; returns how many files were skipped as
    /// already present.
    async fn download_post(&self, post: &Post) -> usize {
        let prefix = filename_prefix(post);
        let mut skipped = 0usize;

        if self.mode.includes_images() {
            for (i, url) in post.full_image_urls.iter().enumerate() {
                let path = self.media_dir.join(format!("{prefix}_{}.jpg", i + 1));
                match self.fetch_to_file(url, &path).await {
                    Ok(DownloadStatus::Downloaded) => {}
                    Ok(DownloadStatus::AlreadyExists) => skipped += 1,
                    Err(e) => warn!(url = %url, "Image download failed: {e}"),
                }
            }
        }
        if self.mode.includes_videos() {
            if let Some(url) = &post.video_url {
                let path = self.media_dir.join(format!("{prefix}.mp4"));
                match self.fetch_to_file(url, &path).await {
                    Ok(DownloadStatus::Downloaded) => {}
                    Ok(DownloadStatus::AlreadyExists) => skipped += 1,
                    Err(e) => warn!(url = %url, "Video download failed: {e}"),
                }
            }
        }
        skipped
    }

    /// Fetch one URL to one path, honoring skip-if-exists.
    pub async fn fetch_to_file(
        &self,
        url: &str,
        path: &Path,
    ) -> Result<DownloadStatus, MediaFetchError> {
        if !self.overwrite && path.exists() {
            debug!(path = %path.display(), "File already exists, skipping");
            return Ok(DownloadStatus::AlreadyExists);
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| MediaFetchError::Request {
                url: url.to_string(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(MediaFetchError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|source| MediaFetchError::Request {
                url: url.to_string(),
                source,
            })?;

        tokio::fs::write(path, &bytes)
            .await
            .map_err(|source| MediaFetchError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), bytes = bytes.len(), "Media file written");
        Ok(DownloadStatus::Downloaded)
    }
}

/// Filename prefix for a post's media files.
///
/// Sanitized `date_text` head plus a unique suffix: the post id when a
/// canonical URL was resolved, else the card fingerprint.
#[must_use]
pub fn filename_prefix(post: &Post) -> String {
    let head = sanitize_filename(&format!(
        "{}_{}",
        &crate::output::format_time(&post.published_at)[..10],
        post.body_text
    ));
    let suffix = post
        .post_id()
        .map_or_else(|| post.dedup_fingerprint.clone(), ToString::to_string);
    format!("{head}_{suffix}")
}

/// Strip filesystem-unsafe characters, collapse whitespace to
/// underscores, truncate to 25 characters.
#[must_use]
pub fn sanitize_filename(text: &str) -> String {
    let stripped = UNSAFE_CHARS.replace_all(text, "");
    let flattened: String = stripped
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    flattened
        .trim()
        .replace(' ', "_")
        .chars()
        .take(PREFIX_MAX_CHARS)
        .collect()
}
