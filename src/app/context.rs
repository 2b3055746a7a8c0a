use std::path::PathBuf;
use std::sync::Arc;

use crate::aggregator::Aggregator;
use crate::app::error::{Result, TelefeedError};
use crate::config::Config;
use crate::pizza::PizzaMeter;
use crate::refresh::RefreshController;
use crate::relay::{HttpTransport, RelaySelector, Transport};
use crate::scanner::ChannelScanner;
use crate::store::{ChannelRepository, SqliteChannelStore};
use crate::summarizer::{GeminiSummarizer, Summarizer};

/// Wired-up services shared by the CLI, the watch loop and the TUI.
pub struct AppContext {
    pub channels: Arc<dyn ChannelRepository + Send + Sync>,
    pub aggregator: Arc<Aggregator>,
    pub refresh: Arc<RefreshController>,
    pub summarizer: Arc<dyn Summarizer + Send + Sync>,
    pub pizza: Arc<PizzaMeter>,
}

impl AppContext {
    pub fn new(config: &Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::data_dir()?.join("channels.db"),
        };

        let store = SqliteChannelStore::new(&db_path, &config.feed.default_channels)?;
        Self::with_store(config, store)
    }

    pub fn in_memory(config: &Config) -> Result<Self> {
        let store = SqliteChannelStore::in_memory(&config.feed.default_channels)?;
        Self::with_store(config, store)
    }

    fn with_store(config: &Config, store: SqliteChannelStore) -> Result<Self> {
        let feed = &config.feed;
        let channels: Arc<dyn ChannelRepository + Send + Sync> = Arc::new(store);

        let transport: Arc<dyn Transport + Send + Sync> =
            Arc::new(HttpTransport::new(feed.request_timeout())?);
        let relays = Arc::new(RelaySelector::new(
            transport.clone(),
            feed.relays(),
            feed.marker.clone(),
        ));
        let scanner = Arc::new(ChannelScanner::new(relays, feed.scan_config()));
        let aggregator = Arc::new(Aggregator::new(scanner, feed.hours_back));
        let refresh = Arc::new(RefreshController::new(
            channels.clone(),
            aggregator.clone(),
        ));

        let summarizer: Arc<dyn Summarizer + Send + Sync> = Arc::new(GeminiSummarizer::new(
            config.summarizer.endpoint.clone(),
            config.summarizer.model.clone(),
            config.summarizer.api_key(),
            feed.request_timeout(),
        )?);

        // The pizza site is not a channel preview, so it gets its own marker.
        let pizza_relays = Arc::new(RelaySelector::new(
            transport,
            feed.relays(),
            config.pizza.marker.clone(),
        ));
        let pizza = Arc::new(PizzaMeter::new(
            pizza_relays,
            summarizer.clone(),
            config.pizza.url.clone(),
            config.pizza.max_context_chars,
        ));

        Ok(Self {
            channels,
            aggregator,
            refresh,
            summarizer,
            pizza,
        })
    }

    /// `~/.local/share/telefeed` (platform equivalent), created on demand.
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| TelefeedError::Config("Could not find data directory".into()))?;
        let telefeed_dir = data_dir.join("telefeed");
        std::fs::create_dir_all(&telefeed_dir)?;
        Ok(telefeed_dir)
    }
}
