use chrono::Local;

use crate::app::{AppContext, Result, TelefeedError};
use crate::domain::{day_label, normalize_handle, Post, MAX_PIZZA_LEVEL};
use crate::pizza::PizzaReading;

pub fn add_channel(ctx: &AppContext, handle: &str) -> Result<()> {
    let normalized =
        normalize_handle(handle).ok_or_else(|| TelefeedError::InvalidChannel(handle.into()))?;

    if ctx.channels.add(&normalized)? {
        println!("Following @{}", normalized);
    } else {
        println!("Already following @{}", normalized);
    }
    Ok(())
}

pub fn remove_channel(ctx: &AppContext, handle: &str) -> Result<()> {
    if !ctx.channels.remove(handle)? {
        return Err(TelefeedError::ChannelNotFound(handle.to_string()));
    }
    println!("Stopped following {}", handle);
    Ok(())
}

pub fn list_channels(ctx: &AppContext) -> Result<()> {
    let channels = ctx.channels.list()?;

    if channels.is_empty() {
        println!("No channels");
        return Ok(());
    }

    for handle in channels {
        println!("@{}\n  https://t.me/s/{}", handle, handle);
    }
    Ok(())
}

pub fn clear_channels(ctx: &AppContext) -> Result<()> {
    let count = ctx.channels.list()?.len();
    ctx.channels.clear()?;
    println!("Removed {} channels", count);
    Ok(())
}

pub async fn fetch(ctx: &AppContext, hours: Option<u32>, channel: Option<&str>) -> Result<()> {
    let handles = match channel {
        Some(handle) => vec![normalize_handle(handle)
            .ok_or_else(|| TelefeedError::InvalidChannel(handle.into()))?],
        None => ctx.channels.list()?,
    };

    if handles.is_empty() {
        println!("No channels to fetch");
        return Ok(());
    }

    let hours = hours.unwrap_or_else(|| ctx.aggregator.hours_back());
    println!("Fetching {} channels (last {}h)...", handles.len(), hours);

    let posts = ctx
        .aggregator
        .with_hours_back(hours)
        .aggregate(&handles)
        .await;

    if posts.is_empty() {
        println!("No posts in the last {}h", hours);
        return Ok(());
    }

    print!("{}", render_timeline(&posts));
    println!("{} posts", posts.len());
    Ok(())
}

pub async fn analyze(ctx: &AppContext, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(TelefeedError::Summarizer("Nothing to analyze".into()));
    }

    let insight = ctx.summarizer.analyze(text).await?;

    println!("Impact:    {}", insight.impact);
    println!("Sentiment: {}", insight.sentiment);
    if !insight.tags.is_empty() {
        println!("Tags:      {}", insight.tags.join(", "));
    }
    println!();
    println!("{}", insight.summary);
    Ok(())
}

pub async fn pizza(ctx: &AppContext) -> Result<()> {
    let reading = ctx.pizza.read().await;
    print!("{}", render_pizza(&reading));
    Ok(())
}

fn render_pizza(reading: &PizzaReading) -> String {
    let stats = &reading.stats;
    let mut out = format!(
        "Level {}/{}  {}  ({})\nUpdated: {}\n\n{}\n",
        stats.level,
        MAX_PIZZA_LEVEL,
        stats.threat_level,
        stats.level_name(),
        stats.last_update,
        stats.why
    );

    for (i, fact) in stats.facts.iter().enumerate() {
        out.push_str(&format!("  {:02}. {}\n", i + 1, fact));
    }

    if let Some(error) = &reading.error {
        out.push_str(&format!("\nLive reading failed, showing routine data: {}\n", error));
    }

    out
}

/// One-line summary: local time, source and headline.
pub fn post_line(post: &Post) -> String {
    format!(
        "{}  {:<16} {}",
        post.timestamp.with_timezone(&Local).format("%H:%M"),
        post.source_name,
        post.headline()
    )
}

/// Posts under a header per local day.
fn render_timeline(posts: &[Post]) -> String {
    let now = Local::now();
    let mut out = String::new();
    let mut current_day: Option<String> = None;

    for post in posts {
        let day = day_label(post.timestamp, now);
        if current_day.as_deref() != Some(day.as_str()) {
            out.push_str(&format!("\n{}\n", day));
            current_day = Some(day);
        }
        out.push_str(&post_line(post));
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::config::Config;
    use crate::domain::PizzaStats;

    fn post(id: i64, text: &str, ago: Duration) -> Post {
        Post {
            id,
            text: text.into(),
            timestamp: Utc::now() - ago,
            source_name: "Alpha News".into(),
            source_id: "alpha".into(),
            media_url: None,
        }
    }

    #[test]
    fn test_post_line_uses_headline() {
        let line = post_line(&post(1, "\n  Breaking  \nmore detail", Duration::zero()));
        assert!(line.contains("Alpha News"));
        assert!(line.ends_with("Breaking"));
    }

    #[test]
    fn test_timeline_groups_by_day() {
        let posts = vec![
            post(1, "old", Duration::days(3)),
            post(2, "same day", Duration::days(3)),
            post(3, "fresh", Duration::zero()),
        ];
        let timeline = render_timeline(&posts);

        let headers: Vec<&str> = timeline
            .lines()
            .filter(|l| !l.is_empty() && !l.contains("Alpha News"))
            .collect();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[1], "Today");
    }

    #[test]
    fn test_channel_commands() {
        let mut config = Config::default();
        config.feed.default_channels.clear();
        let ctx = AppContext::in_memory(&config).unwrap();

        add_channel(&ctx, "https://t.me/s/Alpha").unwrap();
        add_channel(&ctx, "@alpha").unwrap();
        assert_eq!(ctx.channels.list().unwrap(), vec!["alpha"]);

        assert!(matches!(
            add_channel(&ctx, "t.me/a/b"),
            Err(TelefeedError::InvalidChannel(_))
        ));
        assert!(matches!(
            remove_channel(&ctx, "beta"),
            Err(TelefeedError::ChannelNotFound(_))
        ));

        remove_channel(&ctx, "ALPHA").unwrap();
        assert!(ctx.channels.list().unwrap().is_empty());
    }

    #[test]
    fn test_render_live_pizza_reading() {
        let reading = PizzaReading {
            stats: PizzaStats {
                level: 3,
                threat_level: "Elevated".into(),
                why: "Late orders near the Kirya".into(),
                facts: vec!["Orders up 40%".into(), "Two branches open late".into()],
                last_update: "21:40".into(),
            },
            error: None,
        };
        let out = render_pizza(&reading);

        assert!(out.starts_with("Level 3/5  Elevated"));
        assert!(out.contains("Updated: 21:40"));
        assert!(out.contains("  02. Two branches open late"));
        assert!(!out.contains("Live reading failed"));
    }

    #[test]
    fn test_render_fallback_pizza_reading() {
        let reading = PizzaReading {
            stats: PizzaStats::routine("09:00:00".into()),
            error: Some("Summarizer error: GEMINI_API_KEY is not set".into()),
        };
        let out = render_pizza(&reading);

        assert!(out.starts_with("Level 1/5"));
        assert!(out.trim_end().ends_with("GEMINI_API_KEY is not set"));
    }

    #[tokio::test]
    async fn test_fetch_without_channels_is_offline() {
        let mut config = Config::default();
        config.feed.default_channels.clear();
        let ctx = AppContext::in_memory(&config).unwrap();

        fetch(&ctx, Some(1), None).await.unwrap();
    }
}
