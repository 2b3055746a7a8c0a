//! Refresh orchestration: initial load, manual refresh and periodic polling.
//!
//! The displayed feed is published through a [`tokio::sync::watch`] channel.
//! A refresh that fetches exactly what is already displayed leaves the
//! published value untouched, so subscribers are not woken and views keep
//! their scroll position.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::app::Result;
use crate::domain::Post;
use crate::store::ChannelRepository;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Produces the merged post list for a set of channels.
#[async_trait]
pub trait FeedSource {
    async fn fetch_posts(&self, handles: &[String]) -> Result<Vec<Post>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Initial,
    Manual,
    Periodic,
}

impl Trigger {
    /// Background refreshes never surface errors or a loading state.
    fn is_background(self) -> bool {
        matches!(self, Trigger::Periodic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Idle,
    Loading,
    Success,
    Error(String),
}

/// What consumers display.
#[derive(Debug, Clone)]
pub struct FeedState {
    pub posts: Arc<Vec<Post>>,
    pub status: FeedStatus,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            posts: Arc::new(Vec::new()),
            status: FeedStatus::Idle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No channels are followed; the feed was emptied without fetching.
    NoChannels,
    /// Fetched posts equal the displayed ones.
    Unchanged,
    /// Displayed posts replaced; carries the new post count.
    Updated(usize),
    /// Periodic tick dropped because another refresh was in flight.
    Skipped,
    Failed(String),
}

pub struct RefreshController {
    channels: Arc<dyn ChannelRepository + Send + Sync>,
    source: Arc<dyn FeedSource + Send + Sync>,
    state: watch::Sender<FeedState>,
    in_flight: Mutex<()>,
}

impl RefreshController {
    pub fn new(
        channels: Arc<dyn ChannelRepository + Send + Sync>,
        source: Arc<dyn FeedSource + Send + Sync>,
    ) -> Self {
        let (state, _) = watch::channel(FeedState::default());
        Self {
            channels,
            source,
            state,
            in_flight: Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Run one refresh.
    ///
    /// Periodic refreshes are skipped while another refresh is in flight;
    /// initial and manual ones wait for it to finish.
    pub async fn refresh(&self, trigger: Trigger) -> RefreshOutcome {
        let _guard = if trigger.is_background() {
            match self.in_flight.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    debug!("Periodic refresh skipped, another refresh is running");
                    return RefreshOutcome::Skipped;
                }
            }
        } else {
            self.in_flight.lock().await
        };

        match self.run(trigger).await {
            Ok(outcome) => {
                debug!("{:?} refresh finished: {:?}", trigger, outcome);
                outcome
            }
            Err(e) => {
                if trigger.is_background() {
                    debug!("Periodic refresh failed, keeping current feed: {}", e);
                } else {
                    warn!("{:?} refresh failed: {}", trigger, e);
                    let message = e.to_string();
                    self.state.send_modify(|state| {
                        state.status = FeedStatus::Error(message);
                    });
                }
                RefreshOutcome::Failed(e.to_string())
            }
        }
    }

    async fn run(&self, trigger: Trigger) -> Result<RefreshOutcome> {
        let handles = self.channels.list()?;

        if handles.is_empty() {
            self.state.send_if_modified(|state| {
                let changed = !state.posts.is_empty() || state.status != FeedStatus::Success;
                if changed {
                    state.posts = Arc::new(Vec::new());
                    state.status = FeedStatus::Success;
                }
                changed
            });
            return Ok(RefreshOutcome::NoChannels);
        }

        if !trigger.is_background() {
            self.set_status(FeedStatus::Loading);
        }

        let posts = self.source.fetch_posts(&handles).await?;

        let unchanged = *self.state.borrow().posts == posts;
        if unchanged {
            self.set_status(FeedStatus::Success);
            return Ok(RefreshOutcome::Unchanged);
        }

        let count = posts.len();
        self.state.send_modify(|state| {
            state.posts = Arc::new(posts);
            state.status = FeedStatus::Success;
        });
        info!("Feed updated: {} posts from {} channels", count, handles.len());

        Ok(RefreshOutcome::Updated(count))
    }

    fn set_status(&self, status: FeedStatus) {
        self.state.send_if_modified(|state| {
            if state.status == status {
                false
            } else {
                state.status = status;
                true
            }
        });
    }

    /// Refresh every `every` until `running` is cleared.
    ///
    /// The first refresh happens one full interval after the call; callers
    /// do the initial load themselves.
    pub async fn run_periodic(self: Arc<Self>, every: Duration, running: Arc<AtomicBool>) {
        let mut timer = interval(every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        timer.tick().await; // Skip the first immediate tick

        while running.load(Ordering::SeqCst) {
            timer.tick().await;

            if !running.load(Ordering::SeqCst) {
                break;
            }

            self.refresh(Trigger::Periodic).await;
        }
    }
}
