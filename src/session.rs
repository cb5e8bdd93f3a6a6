//! Per-run crawl state: seen-card set, date watermarks, collected posts.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::post::Post;

/// Mutable state of one crawl run.
///
/// Created at run start and discarded at run end; nothing survives across
/// runs. The seen-set grows monotonically, collected posts are append-only,
/// and the watermarks track the min/max post date observed so far (older
/// posts appearing as scrolling digs into history is expected).
#[derive(Debug, Default)]
pub struct CrawlSession {
    seen_fingerprints: HashSet<String>,
    pub earliest_seen_date: Option<NaiveDate>,
    pub latest_seen_date: Option<NaiveDate>,
    pub collected_posts: Vec<Post>,
}

impl CrawlSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this card fingerprint was already processed this run.
    #[must_use]
    pub fn is_seen(&self, fingerprint: &str) -> bool {
        self.seen_fingerprints.contains(fingerprint)
    }

    pub fn mark_seen(&mut self, fingerprint: String) {
        self.seen_fingerprints.insert(fingerprint);
    }

    /// Number of distinct cards processed so far.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen_fingerprints.len()
    }

    /// Fold a post date into the running watermarks.
    ///
    /// Called for every extracted card, including ones the date filter
    /// later excludes; the watermarks describe what the page has shown,
    /// not what was kept.
    pub fn observe_date(&mut self, date: NaiveDate) {
        if self.earliest_seen_date.is_none_or(|d| date < d) {
            self.earliest_seen_date = Some(date);
        }
        if self.latest_seen_date.is_none_or(|d| date > d) {
            self.latest_seen_date = Some(date);
        }
    }

    /// Whether the earliest watermark has dropped below the lower bound.
    #[must_use]
    pub fn scrolled_past(&self, date_from: NaiveDate) -> bool {
        self.earliest_seen_date.is_some_and(|d| d < date_from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn watermarks_track_min_and_max() {
        let mut session = CrawlSession::new();
        session.observe_date(d(2024, 3, 10));
        session.observe_date(d(2024, 3, 12));
        session.observe_date(d(2024, 3, 8));
        assert_eq!(session.earliest_seen_date, Some(d(2024, 3, 8)));
        assert_eq!(session.latest_seen_date, Some(d(2024, 3, 12)));
    }

    #[test]
    fn scrolled_past_needs_a_watermark() {
        let mut session = CrawlSession::new();
        assert!(!session.scrolled_past(d(2024, 3, 10)));
        session.observe_date(d(2024, 3, 9));
        assert!(session.scrolled_past(d(2024, 3, 10)));
        assert!(!session.scrolled_past(d(2024, 3, 9)));
    }

    #[test]
    fn seen_set_deduplicates() {
        let mut session = CrawlSession::new();
        assert!(!session.is_seen("abc"));
        session.mark_seen("abc".to_string());
        session.mark_seen("abc".to_string());
        assert!(session.is_seen("abc"));
        assert_eq!(session.seen_count(), 1);
    }
}
