//! # telefeed
//!
//! A terminal aggregator for public Telegram channel previews.
//!
//! ## Architecture
//!
//! ```text
//! RefreshController → Aggregator → ChannelScanner ×N → RelaySelector → parser
//! ```
//!
//! Every followed channel is scanned concurrently. Each scan pages backwards
//! through `t.me/s/<handle>` (fetched through forwarding relays) until it
//! passes the look-back horizon, and the results are merged into a single
//! timeline ordered by publication time.
//!
//! ## Quick Start
//!
//! ```bash
//! # Follow a channel
//! telefeed channel add @durov
//!
//! # Print the last day of posts
//! telefeed fetch --hours 24
//!
//! # Print new posts as they appear
//! telefeed watch --interval 1m
//!
//! # Launch TUI
//! telefeed tui
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the channel
/// store, relay chain, scanner, aggregator, refresh controller and
/// summarizer.
pub mod app;

/// Fan-out over all channels and the merged timeline.
pub mod aggregator;

/// Command-line interface using clap.
///
/// - `channel add|remove|list|clear` - Manage followed channels
/// - `fetch [--hours N] [--channel H]` - Print recent posts once
/// - `watch [--interval 1m]` - Print new posts as they appear
/// - `analyze <text>` - Summarize text
/// - `pizza` - Read the pizzint.watch activity index
/// - `tui` - Launch the TUI
pub mod cli;

/// Configuration loaded from `~/.config/telefeed/config.toml`.
pub mod config;

/// Core domain models: [`Post`](domain::Post), channel handles and
/// [`NewsInsight`](domain::NewsInsight).
pub mod domain;

/// Channel preview markup to posts.
pub mod parser;

/// The pizzint.watch activity index, read through the relays and the
/// summarizer.
pub mod pizza;

/// Initial, manual and periodic refresh with change suppression.
pub mod refresh;

/// Page fetching through forwarding relays.
pub mod relay;

/// Pagination over one channel's history.
pub mod scanner;

/// Persisted list of followed channels.
///
/// - [`ChannelRepository`](store::ChannelRepository): storage trait
/// - [`SqliteChannelStore`](store::SqliteChannelStore): SQLite implementation
pub mod store;

/// Post analysis through a hosted language model.
pub mod summarizer;

/// Terminal user interface.
///
/// Channels and posts side by side above a preview pane. The feed refreshes
/// in the background while the TUI is open.
pub mod tui;

/// Foreground polling loop for the `watch` command.
pub mod watch;
