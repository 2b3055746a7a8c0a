//! Configuration management for telefeed.
//!
//! Configuration is read from `~/.config/telefeed/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

pub mod colors;
pub mod keybindings;

pub use colors::ColorConfig;
pub use keybindings::KeybindingConfig;

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aggregator::DEFAULT_HOURS_BACK;
use crate::pizza::{DEFAULT_CONTEXT_CHARS, DEFAULT_PIZZA_URL};
use crate::refresh::DEFAULT_REFRESH_INTERVAL;
use crate::relay::Relay;
use crate::scanner::{ScanConfig, DEFAULT_MAX_PAGES, DEFAULT_PAGE_DELAY};
use crate::summarizer::{DEFAULT_ENDPOINT, DEFAULT_MODEL};

/// Channels followed on a fresh install.
pub const DEFAULT_CHANNELS: [&str; 4] = ["abualiexpress", "lelotsenzura", "moriah_news", "salehdesk1"];

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub summarizer: SummarizerConfig,
    pub pizza: PizzaConfig,
    pub colors: ColorConfig,
    pub keybindings: KeybindingConfig,
}

/// Scanning, relaying and polling.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub hours_back: u32,
    pub max_pages: usize,
    pub page_delay_ms: u64,
    pub refresh_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub base_url: String,
    /// Substring every genuine channel page contains.
    pub marker: String,
    pub default_channels: Vec<String>,
    pub relays: Vec<Relay>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            hours_back: DEFAULT_HOURS_BACK,
            max_pages: DEFAULT_MAX_PAGES,
            page_delay_ms: DEFAULT_PAGE_DELAY.as_millis() as u64,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL.as_secs(),
            request_timeout_secs: 15,
            base_url: "https://t.me".to_string(),
            marker: "tgme_widget_message".to_string(),
            default_channels: DEFAULT_CHANNELS.iter().map(|c| c.to_string()).collect(),
            relays: Relay::defaults(),
        }
    }
}

impl FeedConfig {
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            max_pages: self.max_pages.max(1),
            page_delay: Duration::from_millis(self.page_delay_ms),
            base_url: self.base_url.clone(),
        }
    }

    /// Configured relays, or the built-in chain if the list is empty.
    pub fn relays(&self) -> Vec<Relay> {
        if self.relays.is_empty() {
            Relay::defaults()
        } else {
            self.relays.clone()
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

impl SummarizerConfig {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok()
    }
}

/// The pizzint.watch index page, fetched through the feed's relays.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PizzaConfig {
    pub url: String,
    pub marker: String,
    /// Page text passed to the summarizer is cut to this many characters.
    pub max_context_chars: usize,
}

impl Default for PizzaConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PIZZA_URL.to_string(),
            marker: "<body".to_string(),
            max_context_chars: DEFAULT_CONTEXT_CHARS,
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/telefeed/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("telefeed").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# telefeed configuration
#
# Colors can be specified as:
# - Named colors: Black, Red, Green, Yellow, Blue, Magenta, Cyan, Gray,
#   DarkGray, LightRed, LightGreen, LightYellow, LightBlue, LightMagenta,
#   LightCyan, White, Reset
# - Hex colors: "#RRGGBB" or "#RGB"
#
# Keybindings can be specified as:
# - Single characters: "a", "A", "1"
# - Special keys: Enter, Tab, BackTab, Backspace, Delete, Home, End,
#   Insert, PageUp, PageDown, Up, Down, Left, Right, Esc, Space, F1-F12
# - With modifiers: "Ctrl+c", "Shift+Tab", "Alt+Enter"

[feed]
# How far back each channel is scanned
hours_back = 48

# Page fetches per channel and the pause between them
max_pages = 4
page_delay_ms = 150

# Background refresh period for the TUI and `watch`
refresh_interval_secs = 60

# Per-request timeout; a relay that hangs longer is skipped
request_timeout_secs = 15

base_url = "https://t.me"
marker = "tgme_widget_message"

# Seeded into the channel list the first time the database is created
default_channels = ["abualiexpress", "lelotsenzura", "moriah_news", "salehdesk1"]

# Relays are tried in order. envelope is one of: raw, json_contents, plain_text
[[feed.relays]]
name = "corsproxy"
prefix = "https://corsproxy.io/?"
envelope = "raw"

[[feed.relays]]
name = "allorigins"
prefix = "https://api.allorigins.win/get?url="
envelope = "json_contents"

[[feed.relays]]
name = "codetabs"
prefix = "https://api.codetabs.com/v1/proxy?quest="
envelope = "plain_text"

[summarizer]
endpoint = "https://generativelanguage.googleapis.com/v1beta"
model = "gemini-3-flash-preview"
# Name of the environment variable holding the API key
api_key_env = "GEMINI_API_KEY"

[pizza]
url = "https://www.pizzint.watch/"
# Substring a relay response must contain to count as the real page
marker = "<body"
max_context_chars = 4000

[colors]
active_border = "Cyan"
inactive_border = "DarkGray"

selection_bg_active = "Cyan"
selection_fg_active = "Black"
selection_bg_inactive = "DarkGray"
selection_fg_inactive = "White"

# Post list
source_label = "Magenta"
post_time = "DarkGray"

# Preview header
metadata_source = "Yellow"
metadata_date = "Yellow"
metadata_link = "Blue"

# Insight impact levels
impact_low = "Green"
impact_medium = "Yellow"
impact_high = "Red"

status_fg = "White"
status_bg = "DarkGray"
status_error = "LightRed"

# Pizza index levels 1-5
pizza_levels = ["Green", "Yellow", "LightRed", "Red", "Magenta"]

[keybindings]
quit = ["q", "Ctrl+c"]
move_up = ["k", "Up"]
move_down = ["j", "Down"]
next_page = ["n", "PageDown"]
prev_page = ["p", "PageUp"]
next_pane = ["Tab"]
prev_pane = ["BackTab", "Shift+Tab"]

select = ["Enter"]
analyze = ["a"]
open_in_browser = ["o"]
refresh = ["R", "r"]
toggle_maximize = ["m"]
remove_channel = ["d", "Delete"]
add_channel = ["+", "Insert"]
clear_channels = ["X"]
toggle_pizza = ["P", "F2"]
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::Envelope;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.feed.hours_back, 48);
        assert_eq!(config.feed.relays, Relay::defaults());
        assert_eq!(config.feed.default_channels, FeedConfig::default().default_channels);
        assert_eq!(config.summarizer.model, DEFAULT_MODEL);
        assert_eq!(config.pizza.url, DEFAULT_PIZZA_URL);
        assert_eq!(config.pizza.max_context_chars, DEFAULT_CONTEXT_CHARS);
        assert_eq!(config.colors.pizza_levels, ColorConfig::default().pizza_levels);
        assert_eq!(config.keybindings.toggle_pizza, vec!["P", "F2"]);
        assert_eq!(config.colors.active_border, ratatui::style::Color::Cyan);
        assert_eq!(config.keybindings.quit, vec!["q", "Ctrl+c"]);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[feed]
hours_back = 12

[[feed.relays]]
name = "local"
prefix = "http://localhost:8080/?url="
envelope = "json_contents"

[colors]
active_border = "#FF0000"
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.feed.hours_back, 12);
        assert_eq!(config.feed.max_pages, DEFAULT_MAX_PAGES);
        assert_eq!(config.feed.relays.len(), 1);
        assert_eq!(config.feed.relays[0].envelope, Envelope::JsonContents);
        assert_eq!(
            config.colors.active_border,
            ratatui::style::Color::Rgb(255, 0, 0)
        );
        assert_eq!(
            config.colors.inactive_border,
            ratatui::style::Color::DarkGray
        );
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");

        assert_eq!(config.feed.refresh_interval(), Duration::from_secs(60));
        assert_eq!(config.feed.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.summarizer.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.pizza.marker, "<body");
        assert_eq!(config.keybindings.quit, vec!["q", "Ctrl+c"]);
    }

    #[test]
    fn test_scan_config_and_empty_relays() {
        let feed = FeedConfig {
            max_pages: 0,
            page_delay_ms: 0,
            relays: Vec::new(),
            ..FeedConfig::default()
        };

        let scan = feed.scan_config();
        assert_eq!(scan.max_pages, 1);
        assert!(scan.page_delay.is_zero());
        assert_eq!(feed.relays(), Relay::defaults());
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.feed.hours_back, DEFAULT_HOURS_BACK);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.feed.relays, Relay::defaults());
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[feed]\nhours_back = \"soon\"\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
