use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use telefeed::app::AppContext;
use telefeed::cli::{commands, ChannelAction, Cli, Commands};
use telefeed::config::Config;
use telefeed::watch::{parse_interval, Watcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Tui) {
        // Log to a file so output doesn't corrupt the terminal UI.
        let log_path = AppContext::data_dir()?.join("telefeed.log");
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(Mutex::new(log_file)).with_ansi(false))
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("telefeed=info")))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(EnvFilter::from_default_env())
            .init();
    }

    let config = Config::load()?;
    let ctx = AppContext::new(&config, cli.db)?;

    match cli.command {
        Commands::Channel { action } => match action {
            ChannelAction::Add { handle } => commands::add_channel(&ctx, &handle)?,
            ChannelAction::Remove { handle } => commands::remove_channel(&ctx, &handle)?,
            ChannelAction::List => commands::list_channels(&ctx)?,
            ChannelAction::Clear => commands::clear_channels(&ctx)?,
        },
        Commands::Fetch { hours, channel } => {
            commands::fetch(&ctx, hours, channel.as_deref()).await?;
        }
        Commands::Watch { interval } => {
            let every = match interval {
                Some(s) => Duration::from_secs(parse_interval(&s).map_err(anyhow::Error::msg)?),
                None => config.feed.refresh_interval(),
            };
            Watcher::new(Arc::new(ctx), every).run().await?;
        }
        Commands::Analyze { text } => {
            commands::analyze(&ctx, &text).await?;
        }
        Commands::Pizza => {
            commands::pizza(&ctx).await?;
        }
        Commands::Tui => {
            telefeed::tui::run(Arc::new(ctx), Arc::new(config)).await?;
        }
    }

    Ok(())
}
