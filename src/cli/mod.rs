pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "telefeed")]
#[command(about = "Aggregate public Telegram channel previews in the terminal", long_about = None)]
pub struct Cli {
    /// Path to the channel database (default: data dir)
    #[arg(long, global = true)]
    pub db: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage followed channels
    Channel {
        #[command(subcommand)]
        action: ChannelAction,
    },
    /// Fetch and print recent posts once
    Fetch {
        /// Look back this many hours (default from config)
        #[arg(long)]
        hours: Option<u32>,

        /// Only this channel
        #[arg(short, long)]
        channel: Option<String>,
    },
    /// Poll channels and print new posts as they appear
    Watch {
        /// Refresh interval (e.g., "30s", "1m", "5m"); default from config
        #[arg(short, long)]
        interval: Option<String>,
    },
    /// Summarize a piece of text with the configured model
    Analyze {
        /// Text to analyze
        text: String,
    },
    /// Read the pizzint.watch activity index
    Pizza,
    /// Launch the TUI
    Tui,
}

#[derive(Subcommand)]
pub enum ChannelAction {
    /// Follow a channel (handle, @handle or t.me link)
    Add { handle: String },
    /// Stop following a channel
    Remove { handle: String },
    /// List followed channels
    List,
    /// Remove every followed channel
    Clear,
}
