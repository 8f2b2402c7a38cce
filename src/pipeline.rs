//! Fetch → dedup → normalize → cap.
//!
//! One [`Pipeline`] is shared by every trigger (chat commands and API
//! requests). The feed is downloaded without holding any lock; only the
//! per-entry check-and-mark touches the shared [`SentCache`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::SentCache;
use crate::feed::{FeedEntry, FeedFetcher, FetchError};
use crate::util::normalize_summary;

/// Default number of articles returned by one cycle.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// A normalized, not-yet-delivered feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub id: String,
    /// Untrusted; escape before embedding in markup.
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Pipeline {
    fetcher: FeedFetcher,
    cache: Arc<SentCache>,
    max_results: usize,
}

impl Pipeline {
    pub fn new(fetcher: FeedFetcher, cache: Arc<SentCache>) -> Self {
        Self {
            fetcher,
            cache,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn cache(&self) -> &Arc<SentCache> {
        &self.cache
    }

    /// Runs one cycle with the configured cap.
    pub async fn next_batch(&self) -> Result<Vec<Article>, FetchError> {
        self.fetch_new_articles(self.max_results).await
    }

    /// Fetches the feed and returns up to `max_results` articles not sent before.
    ///
    /// Entries are visited in source order. Every returned id is marked in the
    /// cache before its [`Article`] is built, so a concurrent cycle reading the
    /// same feed cannot emit it again. Entries past the cap are left untouched.
    /// An empty vector means "nothing new" and is not an error.
    ///
    /// # Errors
    ///
    /// Propagates [`FetchError`] from the fetcher unchanged; nothing is marked
    /// when the fetch fails.
    pub async fn fetch_new_articles(&self, max_results: usize) -> Result<Vec<Article>, FetchError> {
        let entries = self.fetcher.fetch().await?;
        let total = entries.len();
        let articles = collect_new(entries, &self.cache, max_results, Utc::now());

        tracing::info!(
            feed = %self.fetcher.url(),
            entries = total,
            new = articles.len(),
            "Pipeline cycle complete"
        );

        Ok(articles)
    }
}

fn collect_new(
    entries: Vec<FeedEntry>,
    cache: &SentCache,
    max_results: usize,
    fetched_at: DateTime<Utc>,
) -> Vec<Article> {
    let mut articles = Vec::with_capacity(max_results.min(entries.len()));

    for entry in entries {
        if articles.len() >= max_results {
            break;
        }
        if !cache.check_and_mark(&entry.guid) {
            continue;
        }

        articles.push(Article {
            summary: normalize_summary(entry.description.as_deref().unwrap_or_default()),
            published_at: entry.published.unwrap_or(fetched_at),
            id: entry.guid,
            title: entry.title,
            link: entry.link,
        });
    }

    articles
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn entry(n: usize) -> FeedEntry {
        FeedEntry {
            guid: format!("guid-{n}"),
            title: format!("Article {n}"),
            link: format!("https://habr.com/ru/articles/{n}/"),
            description: Some(format!("<p>Summary <em>{n}</em></p>")),
            published: Some(Utc.timestamp_opt(1_700_000_000 + n as i64, 0).unwrap()),
        }
    }

    #[test]
    fn test_collects_in_source_order_and_normalizes() {
        let cache = SentCache::default();
        let now = Utc::now();

        let articles = collect_new(vec![entry(2), entry(1)], &cache, 10, now);
        let ids: Vec<_> = articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["guid-2", "guid-1"]);
        assert_eq!(articles[0].summary, "Summary 2");
        assert_eq!(articles[0].title, "Article 2");
        assert_eq!(articles[0].link, "https://habr.com/ru/articles/2/");
    }

    #[test]
    fn test_second_pass_yields_nothing() {
        let cache = SentCache::default();
        let now = Utc::now();
        let feed: Vec<_> = (0..5).map(entry).collect();

        assert_eq!(collect_new(feed.clone(), &cache, 10, now).len(), 5);
        assert!(collect_new(feed, &cache, 10, now).is_empty());
    }

    #[test]
    fn test_cap_respected_and_tail_left_unmarked() {
        let cache = SentCache::default();
        let feed: Vec<_> = (0..15).map(entry).collect();

        let articles = collect_new(feed, &cache, 10, Utc::now());
        assert_eq!(articles.len(), 10);
        assert_eq!(articles[9].id, "guid-9");
        assert!(cache.was_sent("guid-9"));
        assert!(!cache.was_sent("guid-10"));
        assert_eq!(cache.len(), 10);
    }

    #[test]
    fn test_already_sent_not_counted_toward_cap() {
        let cache = SentCache::default();
        cache.mark_sent("guid-0");
        cache.mark_sent("guid-1");
        let feed: Vec<_> = (0..5).map(entry).collect();

        let articles = collect_new(feed, &cache, 2, Utc::now());
        let ids: Vec<_> = articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["guid-2", "guid-3"]);
    }

    #[test]
    fn test_missing_fields_defaulted() {
        let cache = SentCache::default();
        let fetched_at = Utc.timestamp_opt(1_800_000_000, 0).unwrap();
        let bare = FeedEntry {
            guid: "bare".into(),
            title: "Bare".into(),
            link: String::new(),
            description: None,
            published: None,
        };

        let articles = collect_new(vec![bare], &cache, 10, fetched_at);
        assert_eq!(articles[0].published_at, fetched_at);
        assert_eq!(articles[0].summary, "");
    }

    #[test]
    fn test_zero_cap_marks_nothing() {
        let cache = SentCache::default();
        assert!(collect_new(vec![entry(1)], &cache, 0, Utc::now()).is_empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_duplicate_guid_within_one_feed_emitted_once() {
        let cache = SentCache::default();
        let articles = collect_new(vec![entry(1), entry(1)], &cache, 10, Utc::now());
        assert_eq!(articles.len(), 1);
    }
}
