use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
    #[error("incorrect date format for {name}: `{value}` (expected YYYY-MM-DD)")]
    ParseDate { name: String, value: String },
}

/// Which media files to download for each post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaMode {
    All,
    ImagesOnly,
    VideosOnly,
}

impl MediaMode {
    #[must_use]
    pub fn includes_images(self) -> bool {
        matches!(self, Self::All | Self::ImagesOnly)
    }

    #[must_use]
    pub fn includes_videos(self) -> bool {
        matches!(self, Self::All | Self::VideosOnly)
    }
}

/// How the crawl decides to stop scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// Scroll a fixed number of pages.
    Pages(u32),
    /// Scroll until the earliest watermark drops below `from`, or a scroll
    /// yields no newly-qualifying posts.
    DateRange {
        from: NaiveDate,
        to: Option<NaiveDate>,
    },
    /// No pages and no lower date bound: capture one page and stop.
    SingleShot,
}

/// Scraper configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Target profile: exactly one of the two.
    pub username: Option<String>,
    pub uid: Option<u64>,

    // Outputs
    pub save_path_json: Option<PathBuf>,
    pub save_path_csv: Option<PathBuf>,
    pub media_dir: PathBuf,

    // Crawl extent
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub pages: Option<u32>,

    // Feature toggles
    pub resolve_video_links: bool,
    pub resolve_canonical_urls: bool,
    pub fill_truncated_text: bool,
    pub download_all_media: bool,
    pub download_images_only: bool,
    pub download_videos_only: bool,
    pub overwrite_existing_media: bool,
    pub emit_compact_record_format: bool,

    // Browser
    pub timeline_url_prefix: String,
    pub wait_timeout: Duration,
    pub chrome_path: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            username: optional_env("WEIBO_USERNAME"),
            uid: parse_env_opt_u64("WEIBO_UID")?,

            save_path_json: optional_path("SAVE_PATH_JSON", "./weibo_posts.json"),
            save_path_csv: optional_path("SAVE_PATH_CSV", "./weibo_posts.csv"),
            media_dir: PathBuf::from(env_or_default("SAVE_MEDIA_DIRECTORY", "./weibo_media")),

            date_from: parse_env_date("DATE_FROM")?,
            date_to: parse_env_date("DATE_TO")?,
            pages: parse_env_opt_u32("PAGES")?,

            resolve_video_links: parse_env_bool("RESOLVE_VIDEO_LINKS", true)?,
            resolve_canonical_urls: parse_env_bool("RESOLVE_CANONICAL_URLS", true)?,
            fill_truncated_text: parse_env_bool("FILL_TRUNCATED_TEXT", false)?,
            download_all_media: parse_env_bool("DOWNLOAD_ALL_MEDIA", true)?,
            download_images_only: parse_env_bool("DOWNLOAD_IMAGES_ONLY", false)?,
            download_videos_only: parse_env_bool("DOWNLOAD_VIDEOS_ONLY", false)?,
            overwrite_existing_media: parse_env_bool("OVERWRITE_EXISTING_MEDIA", false)?,
            emit_compact_record_format: parse_env_bool("EMIT_COMPACT_RECORD_FORMAT", true)?,

            timeline_url_prefix: env_or_default("TIMELINE_URL_PREFIX", "https://m.weibo.cn/u/"),
            wait_timeout: Duration::from_secs(parse_env_u64("WAIT_TIMEOUT_SECS", 30)?),
            chrome_path: optional_env("CHROME_PATH"),
        })
    }

    /// Validate the mutual-exclusivity rules before any browser work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (&self.uid, &self.username) {
            (None, None) => {
                return Err(invalid(
                    "WEIBO_UID",
                    "either WEIBO_UID or WEIBO_USERNAME must be specified",
                ));
            }
            (Some(_), Some(_)) => {
                return Err(invalid(
                    "WEIBO_UID",
                    "only one of WEIBO_UID or WEIBO_USERNAME can be specified",
                ));
            }
            _ => {}
        }
        if let Some(pages) = self.pages {
            if pages == 0 {
                return Err(invalid("PAGES", "must be a positive integer"));
            }
            if self.date_from.is_some() || self.date_to.is_some() {
                return Err(invalid(
                    "PAGES",
                    "mutually exclusive with DATE_FROM/DATE_TO",
                ));
            }
        }
        if self.date_to.is_some() && self.date_from.is_none() {
            return Err(invalid(
                "DATE_TO",
                "requires DATE_FROM: the range scan needs a lower bound to know when to stop",
            ));
        }
        if self.download_all_media && (self.download_images_only || self.download_videos_only) {
            return Err(invalid(
                "DOWNLOAD_ALL_MEDIA",
                "mutually exclusive with DOWNLOAD_IMAGES_ONLY and DOWNLOAD_VIDEOS_ONLY",
            ));
        }
        if self.download_images_only && self.download_videos_only {
            return Err(invalid(
                "DOWNLOAD_IMAGES_ONLY",
                "mutually exclusive with DOWNLOAD_VIDEOS_ONLY",
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn stop_mode(&self) -> StopMode {
        if let Some(pages) = self.pages {
            StopMode::Pages(pages)
        } else if let Some(from) = self.date_from {
            StopMode::DateRange {
                from,
                to: self.date_to,
            }
        } else {
            StopMode::SingleShot
        }
    }

    #[must_use]
    pub fn media_mode(&self) -> MediaMode {
        if self.download_images_only {
            MediaMode::ImagesOnly
        } else if self.download_videos_only {
            MediaMode::VideosOnly
        } else {
            MediaMode::All
        }
    }
}

fn invalid(name: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        message: message.to_string(),
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    optional_env(name).unwrap_or_else(|| default.to_string())
}

/// A path-valued variable with a default; the literal value `none`
/// disables that output.
fn optional_path(name: &str, default: &str) -> Option<PathBuf> {
    let value = env_or_default(name, default);
    if value.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match optional_env(name) {
        Some(val) => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        None => Ok(default),
    }
}

fn parse_env_opt_u64(name: &str) -> Result<Option<u64>, ConfigError> {
    optional_env(name)
        .map(|val| {
            val.parse().map_err(|e| ConfigError::ParseInt {
                name: name.to_string(),
                source: e,
            })
        })
        .transpose()
}

fn parse_env_opt_u32(name: &str) -> Result<Option<u32>, ConfigError> {
    optional_env(name)
        .map(|val| {
            val.parse().map_err(|e| ConfigError::ParseInt {
                name: name.to_string(),
                source: e,
            })
        })
        .transpose()
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match optional_env(name) {
        Some(val) => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        None => Ok(default),
    }
}

fn parse_env_date(name: &str) -> Result<Option<NaiveDate>, ConfigError> {
    optional_env(name)
        .map(|val| {
            NaiveDate::parse_from_str(&val, "%Y-%m-%d").map_err(|_| ConfigError::ParseDate {
                name: name.to_string(),
                value: val,
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            username: None,
            uid: Some(1_234_567),
            save_path_json: Some(PathBuf::from("./weibo_posts.json")),
            save_path_csv: Some(PathBuf::from("./weibo_posts.csv")),
            media_dir: PathBuf::from("./weibo_media"),
            date_from: None,
            date_to: None,
            pages: None,
            resolve_video_links: true,
            resolve_canonical_urls: true,
            fill_truncated_text: false,
            download_all_media: true,
            download_images_only: false,
            download_videos_only: false,
            overwrite_existing_media: false,
            emit_compact_record_format: true,
            timeline_url_prefix: "https://m.weibo.cn/u/".to_string(),
            wait_timeout: Duration::from_secs(30),
            chrome_path: None,
        }
    }

    #[test]
    fn uid_and_username_are_mutually_exclusive() {
        let mut config = base();
        config.username = Some("someone".to_string());
        assert!(config.validate().is_err());

        config.uid = None;
        assert!(config.validate().is_ok());

        config.username = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn pages_excludes_date_range() {
        let mut config = base();
        config.pages = Some(3);
        assert!(config.validate().is_ok());
        config.date_from = Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_pages_is_rejected() {
        let mut config = base();
        config.pages = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn date_to_requires_date_from() {
        let mut config = base();
        config.date_to = Some(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(config.validate().is_err());
        config.date_from = Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn media_modes_are_mutually_exclusive() {
        let mut config = base();
        config.download_images_only = true;
        assert!(config.validate().is_err());

        config.download_all_media = false;
        assert!(config.validate().is_ok());
        assert_eq!(config.media_mode(), MediaMode::ImagesOnly);

        config.download_videos_only = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn stop_mode_selection() {
        let mut config = base();
        assert_eq!(config.stop_mode(), StopMode::SingleShot);

        config.pages = Some(5);
        assert_eq!(config.stop_mode(), StopMode::Pages(5));

        config.pages = None;
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        config.date_from = Some(from);
        assert_eq!(config.stop_mode(), StopMode::DateRange { from, to: None });
    }
}
