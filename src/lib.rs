//! Weibo timeline scraper library.
//!
//! Scrapes a profile's post timeline through a headless browser: scrolls
//! incrementally, deduplicates rendered cards by content hash, extracts
//! text/timestamps/images/video/links, optionally enriches posts through
//! their detail views, and persists results to JSON/CSV plus downloaded
//! media files.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod download;
pub mod expand;
pub mod extract;
pub mod lookup;
pub mod output;
pub mod post;
pub mod selectors;
pub mod session;
pub mod timeparse;
pub mod video;
