use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use url::Url;

use crate::app::Result;
use crate::domain::{normalize_handle, Post};
use crate::parser::parse_page;
use crate::relay::RelaySelector;

pub const DEFAULT_MAX_PAGES: usize = 4;
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(150);

/// Scans one channel's recent history.
#[async_trait]
pub trait ChannelScan {
    /// Posts of `handle` newer than `hours_back`, ascending by timestamp and
    /// unique by id. Never fails: problems yield a partial or empty list.
    async fn scan(&self, handle: &str, hours_back: u32) -> Vec<Post>;
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Upper bound on page fetches per channel.
    pub max_pages: usize,
    /// Pause between consecutive page fetches of one channel.
    pub page_delay: Duration,
    /// Preview site root, e.g. `https://t.me`.
    pub base_url: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            page_delay: DEFAULT_PAGE_DELAY,
            base_url: "https://t.me".to_string(),
        }
    }
}

/// Pages backwards through a channel preview until the horizon, an empty
/// page, a relay outage or the page limit.
pub struct ChannelScanner {
    relays: Arc<RelaySelector>,
    config: ScanConfig,
}

impl ChannelScanner {
    pub fn new(relays: Arc<RelaySelector>, config: ScanConfig) -> Self {
        Self { relays, config }
    }

    /// Preview URL for `handle`, optionally limited to posts before `cursor`.
    pub fn page_url(&self, handle: &str, cursor: Option<i64>) -> Result<String> {
        let base = self.config.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{}/s/{}", base, handle))?;
        if let Some(cursor) = cursor {
            url.query_pairs_mut()
                .append_pair("before", &cursor.to_string());
        }
        Ok(url.into())
    }

    async fn scan_pages(
        &self,
        handle: &str,
        horizon: DateTime<Utc>,
        collected: &mut Vec<Post>,
    ) -> Result<()> {
        let mut cursor: Option<i64> = None;
        let mut pages = 0;

        while pages < self.config.max_pages {
            let url = self.page_url(handle, cursor)?;

            let Some(html) = self.relays.fetch(&url).await else {
                debug!("No more pages for {} (relays exhausted)", handle);
                break;
            };
            pages += 1;

            let page = parse_page(&html, handle, horizon);
            let fetched = page.posts.len();
            let oldest = page
                .posts
                .iter()
                .min_by_key(|post| post.timestamp)
                .map(|post| post.id);
            collected.extend(page.posts);

            debug!(
                "Page {} of {}: {} posts, horizon reached: {}",
                pages, handle, fetched, page.reached_horizon
            );

            if page.reached_horizon || fetched == 0 {
                break;
            }

            cursor = oldest;

            if pages < self.config.max_pages && !self.config.page_delay.is_zero() {
                tokio::time::sleep(self.config.page_delay).await;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ChannelScan for ChannelScanner {
    async fn scan(&self, handle: &str, hours_back: u32) -> Vec<Post> {
        let Some(handle) = normalize_handle(handle) else {
            warn!("Skipping invalid channel handle {:?}", handle);
            return Vec::new();
        };

        let horizon = Utc::now() - chrono::Duration::hours(i64::from(hours_back));
        let mut collected = Vec::new();

        if let Err(e) = self.scan_pages(&handle, horizon, &mut collected).await {
            warn!(
                "Scan of {} aborted with {} posts collected: {}",
                handle,
                collected.len(),
                e
            );
        }

        let posts = dedup_and_sort(collected);
        info!("Scanned {}: {} posts", handle, posts.len());
        posts
    }
}

/// Last write wins per id, then ascending by timestamp (id breaks ties).
pub fn dedup_and_sort(posts: Vec<Post>) -> Vec<Post> {
    let mut by_id: HashMap<i64, Post> = HashMap::with_capacity(posts.len());
    for post in posts {
        by_id.insert(post.id, post);
    }

    let mut unique: Vec<Post> = by_id.into_values().collect();
    unique.sort_by_key(|post| (post.timestamp, post.id));
    unique
}
