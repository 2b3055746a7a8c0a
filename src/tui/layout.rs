use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::config::ColorConfig;
use crate::domain::{day_label, filter_by_source, NewsInsight, Post};
use crate::pizza::PizzaReading;
use crate::refresh::FeedStatus;
use crate::tui::app::{ActivePane, Confirm, InsightState, PizzaState, TuiApp, View};

pub fn render(frame: &mut Frame, app: &mut TuiApp, colors: &ColorConfig) {
    if app.view == View::Pizza {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(1)])
            .split(frame.area());

        render_pizza_view(frame, app, chunks[0], colors);
        render_status_bar(frame, app, chunks[1], colors);
    } else if app.maximized {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(1)])
            .split(frame.area());

        render_preview_pane(frame, app, chunks[0], colors);
        render_status_bar(frame, app, chunks[1], colors);
    } else {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(45), // Channels | Posts
                Constraint::Min(10),        // Preview
                Constraint::Length(1),      // Status bar
            ])
            .split(frame.area());

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(24), Constraint::Min(20)])
            .split(rows[0]);

        render_channels_pane(frame, app, top[0], colors);
        render_posts_pane(frame, app, top[1], colors);
        render_preview_pane(frame, app, rows[1], colors);
        render_status_bar(frame, app, rows[2], colors);
    }
}

fn pane_block(title: String, active: bool, colors: &ColorConfig) -> Block<'static> {
    let border = if active {
        colors.active_border
    } else {
        colors.inactive_border
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
}

fn highlight_style(active: bool, colors: &ColorConfig) -> Style {
    if active {
        Style::default()
            .bg(colors.selection_bg_active)
            .fg(colors.selection_fg_active)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .bg(colors.selection_bg_inactive)
            .fg(colors.selection_fg_inactive)
    }
}

fn render_channels_pane(frame: &mut Frame, app: &mut TuiApp, area: Rect, colors: &ColorConfig) {
    let active = app.active_pane == ActivePane::Channels;

    let rows: Vec<ListItem> = std::iter::once(None)
        .chain(app.channels.iter().map(Some))
        .map(|channel| {
            let (label, is_filter) = match channel {
                None => (
                    format!("All ({})", app.posts.len()),
                    app.filter.is_none(),
                ),
                Some(handle) => (
                    format!("@{} ({})", handle, filter_by_source(&app.posts, handle).len()),
                    app.filter.as_deref() == Some(handle.as_str()),
                ),
            };
            let marker = if is_filter { "•" } else { " " };
            ListItem::new(format!("{} {}", marker, label))
        })
        .collect();

    let title = format!(" Channels ({}) ", app.channels.len());
    let list = List::new(rows)
        .block(pane_block(title, active, colors))
        .highlight_style(highlight_style(active, colors))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.channel_list_state);
}

fn render_posts_pane(frame: &mut Frame, app: &mut TuiApp, area: Rect, colors: &ColorConfig) {
    let active = app.active_pane == ActivePane::Posts;

    let rows: Vec<ListItem> = app
        .visible
        .iter()
        .filter_map(|&i| app.posts.get(i))
        .map(|post| {
            let time = post.timestamp.with_timezone(&Local).format("%d/%m %H:%M");
            let marker = match app.insight_for(post) {
                Some(InsightState::Ready(_)) => "✦",
                Some(InsightState::Pending) => "…",
                _ => " ",
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", time), Style::default().fg(colors.post_time)),
                Span::styled(
                    format!("{:<14.14} ", post.source_name),
                    Style::default().fg(colors.source_label),
                ),
                Span::raw(format!("{} {}", marker, post.headline())),
            ]))
        })
        .collect();

    let scope = app.filter.as_deref().unwrap_or("all");
    let title = format!(
        " Posts: {} ({}) [{}/{}] ",
        scope,
        app.visible.len(),
        (app.post_index + 1).min(app.visible.len()),
        app.visible.len()
    );

    let list = List::new(rows)
        .block(pane_block(title, active, colors))
        .highlight_style(highlight_style(active, colors))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.post_list_state);
}

fn render_preview_pane(frame: &mut Frame, app: &TuiApp, area: Rect, colors: &ColorConfig) {
    let active = app.active_pane == ActivePane::Preview;

    let (title, content) = match app.selected_post() {
        Some(post) => (
            format!(" {} ", post.source_name),
            preview_text(post, app.insight_for(post), area.width, colors),
        ),
        None => (" Preview ".to_string(), Text::from(empty_message(app))),
    };

    let paragraph = Paragraph::new(content)
        .block(pane_block(title, active, colors))
        .wrap(Wrap { trim: false })
        .scroll((app.preview_scroll, 0));

    frame.render_widget(paragraph, area);
}

fn empty_message(app: &TuiApp) -> &'static str {
    if app.channels.is_empty() {
        "No channels followed. Press + to add one."
    } else if app.feed_status == FeedStatus::Loading {
        "Loading posts..."
    } else {
        "No posts in the selected time window"
    }
}

fn preview_text<'a>(
    post: &'a Post,
    insight: Option<&'a InsightState>,
    width: u16,
    colors: &ColorConfig,
) -> Text<'a> {
    let local = post.timestamp.with_timezone(&Local);
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} (@{})", post.source_name, post.source_id),
            Style::default()
                .fg(colors.metadata_source)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                "{} {}",
                day_label(post.timestamp, Local::now()),
                local.format("%H:%M")
            ),
            Style::default().fg(colors.metadata_date),
        )),
        Line::from(Span::styled(
            format!("Link: {}", post.link()),
            Style::default().fg(colors.metadata_link),
        )),
    ];

    if let Some(media) = &post.media_url {
        lines.push(Line::from(Span::styled(
            format!("Media: {}", media),
            Style::default().fg(colors.metadata_link),
        )));
    }

    lines.push(Line::from("─".repeat(width.saturating_sub(2) as usize)));
    lines.extend(post.text.lines().map(Line::from));

    match insight {
        Some(InsightState::Pending) => {
            lines.push(Line::from(""));
            lines.push(Line::from("Analyzing..."));
        }
        Some(InsightState::Failed(reason)) => {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Analysis failed: {} (press analyze to retry)", reason),
                Style::default().fg(colors.status_error),
            )));
        }
        Some(InsightState::Ready(insight)) => {
            lines.push(Line::from(""));
            lines.extend(insight_lines(insight, colors));
        }
        None => {}
    }

    Text::from(lines)
}

fn insight_lines<'a>(insight: &'a NewsInsight, colors: &ColorConfig) -> Vec<Line<'a>> {
    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("Impact: {}", insight.impact),
            Style::default()
                .fg(colors.impact(insight.impact))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  Sentiment: {}", insight.sentiment)),
    ])];

    if !insight.tags.is_empty() {
        let tags: Vec<String> = insight.tags.iter().map(|t| format!("#{}", t)).collect();
        lines.push(Line::from(tags.join(" ")));
    }

    lines.extend(insight.summary.lines().map(Line::from));
    lines
}

fn render_pizza_view(frame: &mut Frame, app: &TuiApp, area: Rect, colors: &ColorConfig) {
    let block = pane_block(" PIZZINT.WATCH ".to_string(), true, colors);

    let reading = match &app.pizza {
        PizzaState::Ready(reading) => reading,
        PizzaState::Idle | PizzaState::Loading => {
            let waiting = Paragraph::new("Reading the pizza index...").block(block);
            frame.render_widget(waiting, area);
            return;
        }
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(inner);

    let stats = &reading.stats;
    let level_color = colors.pizza_level(stats.level);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::BOTTOM))
        .gauge_style(Style::default().fg(level_color))
        .ratio(stats.ratio())
        .label(format!("LEVEL {}  {}", stats.level, stats.threat_level));
    frame.render_widget(gauge, rows[0]);

    let details = Paragraph::new(pizza_text(reading, colors))
        .wrap(Wrap { trim: false });
    frame.render_widget(details, rows[1]);
}

fn pizza_text<'a>(reading: &'a PizzaReading, colors: &ColorConfig) -> Text<'a> {
    let stats = &reading.stats;
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                stats.level_name(),
                Style::default()
                    .fg(colors.pizza_level(stats.level))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  Last update: {}", stats.last_update),
                Style::default().fg(colors.metadata_date),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            format!("\"{}\"", stats.why),
            Style::default().add_modifier(Modifier::ITALIC),
        )),
        Line::from(""),
    ];

    lines.extend(
        stats
            .facts
            .iter()
            .enumerate()
            .map(|(i, fact)| Line::from(format!("{:02}  {}", i + 1, fact))),
    );

    if let Some(error) = &reading.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Live reading failed, showing routine data: {}", error),
            Style::default().fg(colors.status_error),
        )));
    }

    Text::from(lines)
}

fn render_status_bar(frame: &mut Frame, app: &TuiApp, area: Rect, colors: &ColorConfig) {
    let mut style = Style::default().fg(colors.status_fg).bg(colors.status_bg);

    let status = if let Some(line) = &app.input {
        format!("Add channel: {}_  (Enter:Follow  Esc:Cancel)", line)
    } else if let Some(pending) = &app.pending {
        match pending {
            Confirm::Remove(handle) => format!("Stop following @{}? (y/n)", handle),
            Confirm::ClearAll => {
                format!("Stop following all {} channels? (y/n)", app.channels.len())
            }
        }
    } else if let Some(msg) = &app.status_message {
        msg.clone()
    } else {
        match &app.feed_status {
            FeedStatus::Loading => "Refreshing channels...".to_string(),
            FeedStatus::Error(e) => {
                style = style.fg(colors.status_error);
                format!("Refresh failed: {}", e)
            }
            _ if app.view == View::Pizza => {
                if app.pizza == PizzaState::Loading {
                    "Syncing with pizzint.watch...".to_string()
                } else {
                    "r:Sync  P:Back to feed  q:Quit".to_string()
                }
            }
            _ if app.maximized => "j/k:Scroll  n/p:Page  m:Exit maximize  q:Quit".to_string(),
            _ => "j/k:Nav  Tab:Pane  Enter:Filter  a:Analyze  o:Open  r:Refresh  +:Add  d:Remove  X:Clear  P:Pizza  q:Quit"
                .to_string(),
        }
    };

    frame.render_widget(Paragraph::new(status).style(style), area);
}
