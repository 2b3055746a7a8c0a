//! Foreground polling loop that prints new posts as they appear.
//!
//! Reuses the refresh controller's periodic loop and prints whatever the
//! published feed gains between ticks. Stops on Ctrl-C or SIGTERM.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{info, warn};

use crate::app::{AppContext, Result};
use crate::cli::commands::post_line;
use crate::domain::Post;
use crate::refresh::{RefreshOutcome, Trigger};

const MAX_INTERVAL_SECS: u64 = 365 * 86400;

/// Parse an interval such as `"30s"`, `"1m"`, `"6h"`, `"1d"` or bare
/// seconds into seconds.
pub fn parse_interval(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim().to_lowercase();

    let (digits, unit) = match s.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&s[..i], Some(c)),
        _ => (s.as_str(), None),
    };

    let multiplier = match unit {
        None | Some('s') => 1,
        Some('m') => 60,
        Some('h') => 3600,
        Some('d') => 86400,
        Some(_) => {
            return Err(format!(
                "Invalid interval: {}. Use format like '30s', '1m', '1h'",
                s
            ))
        }
    };

    let value = digits
        .parse::<u64>()
        .map_err(|_| format!("Invalid interval: {}. Use format like '30s', '1m', '1h'", s))?;

    if value == 0 {
        return Err("Interval must be greater than zero".to_string());
    }

    value
        .checked_mul(multiplier)
        .filter(|secs| *secs <= MAX_INTERVAL_SECS)
        .ok_or_else(|| format!("Interval too large: {}. Maximum is 365d", s))
}

/// Inverse of [`parse_interval`], using the largest exact unit.
pub fn format_interval(secs: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(86400, "d"), (3600, "h"), (60, "m")];

    UNITS
        .iter()
        .find(|(size, _)| secs >= *size && secs % size == 0)
        .map(|(size, unit)| format!("{}{}", secs / size, unit))
        .unwrap_or_else(|| format!("{}s", secs))
}

/// Posts not printed before, marking them as seen.
fn fresh_posts<'a>(posts: &'a [Post], seen: &mut HashSet<(String, i64)>) -> Vec<&'a Post> {
    posts
        .iter()
        .filter(|post| {
            let (source, id) = post.key();
            seen.insert((source.to_string(), id))
        })
        .collect()
}

pub struct Watcher {
    ctx: Arc<AppContext>,
    interval: Duration,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl Watcher {
    pub fn new(ctx: Arc<AppContext>, interval: Duration) -> Self {
        Self {
            ctx,
            interval,
            running: Arc::new(AtomicBool::new(true)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    fn install_signal_handler(&self) {
        let running = self.running.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            wait_for_signal().await;
            running.store(false, Ordering::SeqCst);
            shutdown.notify_one();
        });
    }

    pub async fn run(&self) -> Result<()> {
        self.install_signal_handler();

        println!(
            "Watching {} channels every {} (Ctrl-C to stop)",
            self.ctx.channels.list()?.len(),
            format_interval(self.interval.as_secs())
        );
        info!("Watch started, interval {:?}", self.interval);

        let refresh = self.ctx.refresh.clone();
        let mut seen = HashSet::new();

        if let RefreshOutcome::Failed(e) = refresh.refresh(Trigger::Initial).await {
            eprintln!("Initial refresh failed: {}", e);
        }

        let mut updates = refresh.subscribe();
        let snapshot = updates.borrow_and_update().posts.clone();
        for post in fresh_posts(&snapshot, &mut seen) {
            println!("{}", post_line(post));
        }

        let periodic = tokio::spawn(
            refresh
                .clone()
                .run_periodic(self.interval, self.running.clone()),
        );

        while self.running.load(Ordering::SeqCst) {
            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let posts = updates.borrow_and_update().posts.clone();
                    for post in fresh_posts(&posts, &mut seen) {
                        println!("{}", post_line(post));
                    }
                }
                _ = self.shutdown.notified() => break,
            }
        }

        periodic.abort();
        info!("Watch stopped");
        Ok(())
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {},
                _ = sigint.recv() => {},
            }
        }
        _ => {
            warn!("Failed to install signal handlers, falling back to Ctrl-C");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
