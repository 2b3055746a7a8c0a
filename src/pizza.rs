//! The pizzint.watch activity index.
//!
//! The index page is fetched through the relay chain, its `main` text is
//! handed to the summarizer, and a routine reading stands in whenever that
//! fails.

use std::sync::Arc;

use chrono::Local;
use scraper::Html;
use tracing::{info, warn};

use crate::domain::PizzaStats;
use crate::parser::{HtmlNode, NodeQuery};
use crate::relay::RelaySelector;
use crate::summarizer::Summarizer;

pub const DEFAULT_PIZZA_URL: &str = "https://www.pizzint.watch/";
pub const DEFAULT_CONTEXT_CHARS: usize = 4000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PizzaReading {
    pub stats: PizzaStats,
    /// Why the live reading failed; `stats` is then the routine fallback.
    pub error: Option<String>,
}

impl PizzaReading {
    pub fn is_live(&self) -> bool {
        self.error.is_none()
    }
}

pub struct PizzaMeter {
    relays: Arc<RelaySelector>,
    summarizer: Arc<dyn Summarizer + Send + Sync>,
    url: String,
    max_chars: usize,
}

impl PizzaMeter {
    pub fn new(
        relays: Arc<RelaySelector>,
        summarizer: Arc<dyn Summarizer + Send + Sync>,
        url: impl Into<String>,
        max_chars: usize,
    ) -> Self {
        Self {
            relays,
            summarizer,
            url: url.into(),
            max_chars,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Take a reading. Never fails; see [`PizzaReading::error`].
    ///
    /// An unreachable page still goes to the summarizer with empty context.
    pub async fn read(&self) -> PizzaReading {
        let context = match self.relays.fetch(&self.url).await {
            Some(html) => site_text(&html, self.max_chars),
            None => {
                warn!("Could not fetch {}", self.url);
                String::new()
            }
        };

        match self.summarizer.assess_pizza(&context).await {
            Ok(stats) => {
                info!("Pizza index at level {}", stats.level);
                PizzaReading { stats, error: None }
            }
            Err(e) => {
                warn!("Pizza index reading failed: {}", e);
                PizzaReading {
                    stats: PizzaStats::routine(Local::now().format("%H:%M:%S").to_string()),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Visible text of the page's `main` element, or of `body` without one,
/// with blank lines dropped and runs of whitespace collapsed. At most
/// `max_chars` characters.
pub fn site_text(raw_html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(raw_html);
    let root = HtmlNode::root(&document);
    let Some(content) = root
        .query_selector("main")
        .or_else(|| root.query_selector("body"))
    else {
        return String::new();
    };

    let text = content
        .text_content()
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    text.chars().take(max_chars).collect()
}
