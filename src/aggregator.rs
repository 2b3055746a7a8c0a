use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{error, info};

use crate::app::Result;
use crate::domain::Post;
use crate::refresh::FeedSource;
use crate::scanner::ChannelScan;

pub const DEFAULT_HOURS_BACK: u32 = 48;

/// Scans every channel concurrently and merges the results into one
/// timeline.
pub struct Aggregator {
    scanner: Arc<dyn ChannelScan + Send + Sync>,
    hours_back: u32,
}

impl Aggregator {
    pub fn new(scanner: Arc<dyn ChannelScan + Send + Sync>, hours_back: u32) -> Self {
        Self {
            scanner,
            hours_back,
        }
    }

    pub fn hours_back(&self) -> u32 {
        self.hours_back
    }

    /// Same scanner, different look-back window.
    pub fn with_hours_back(&self, hours_back: u32) -> Self {
        Self::new(self.scanner.clone(), hours_back)
    }

    /// All posts of `handles`, ascending by timestamp.
    ///
    /// One task per channel; every task is joined before merging. Posts are
    /// not deduplicated across channels since ids are only unique per
    /// channel. Equal timestamps keep join order.
    pub async fn aggregate(&self, handles: &[String]) -> Vec<Post> {
        if handles.is_empty() {
            return Vec::new();
        }

        let tasks: Vec<_> = handles
            .iter()
            .map(|handle| {
                let scanner = self.scanner.clone();
                let handle = handle.clone();
                let hours_back = self.hours_back;
                tokio::spawn(async move { scanner.scan(&handle, hours_back).await })
            })
            .collect();

        let mut merged = Vec::new();
        for (handle, result) in handles.iter().zip(join_all(tasks).await) {
            match result {
                Ok(posts) => merged.extend(posts),
                Err(e) => {
                    error!("Scan task for {} failed: {}", handle, e);
                }
            }
        }

        merged.sort_by_key(|post| post.timestamp);
        info!(
            "Aggregated {} posts from {} channels",
            merged.len(),
            handles.len()
        );
        merged
    }
}

#[async_trait]
impl FeedSource for Aggregator {
    async fn fetch_posts(&self, handles: &[String]) -> Result<Vec<Post>> {
        Ok(self.aggregate(handles).await)
    }
}
