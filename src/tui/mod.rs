pub mod app;
pub mod event;
pub mod layout;

use std::io::{self, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::KeyCode,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::app::{AppContext, Result};
use crate::config::Config;
use crate::domain::{normalize_handle, NewsInsight};
use crate::pizza::PizzaReading;
use crate::refresh::{RefreshOutcome, Trigger};
use crate::store::ChannelRepository;

use self::app::{
    post_key, ActivePane, Confirm, InputEvent, InsightState, PizzaState, PostKey, TuiApp, View,
};
use self::event::{Action, AppEvent, EventHandler};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Results of background work, delivered to the UI loop.
enum UiMessage {
    Refreshed(RefreshOutcome),
    Analyzed {
        key: PostKey,
        result: std::result::Result<NewsInsight, String>,
    },
    Pizza(PizzaReading),
}

pub async fn run(ctx: Arc<AppContext>, config: Arc<Config>) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, ctx, config).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(terminal: &mut Tui, ctx: Arc<AppContext>, config: Arc<Config>) -> Result<()> {
    let mut tui_app = TuiApp::new();
    let event_handler = EventHandler::new(Duration::from_millis(100));
    let (tx, mut messages) = mpsc::unbounded_channel();

    tui_app.set_channels(ctx.channels.list()?);
    let mut feed = ctx.refresh.subscribe();
    spawn_refresh(&ctx, Trigger::Initial, &tx);

    let running = Arc::new(AtomicBool::new(true));
    let periodic = tokio::spawn(
        ctx.refresh
            .clone()
            .run_periodic(config.feed.refresh_interval(), running.clone()),
    );

    loop {
        if feed.has_changed().unwrap_or(false) {
            let state = feed.borrow_and_update().clone();
            tui_app.apply_feed(state);
        }

        while let Ok(message) = messages.try_recv() {
            handle_message(&mut tui_app, message);
        }

        terminal.draw(|frame| layout::render(frame, &mut tui_app, &config.colors))?;

        let key = match event_handler.next()? {
            AppEvent::Key(key) => key,
            AppEvent::Tick => continue,
        };

        if tui_app.input.is_some() {
            if let InputEvent::Submitted(text) = tui_app.input_key(&key) {
                if submit_channel(&mut tui_app, ctx.channels.as_ref(), &text)? {
                    spawn_refresh(&ctx, Trigger::Manual, &tx);
                }
            }
            continue;
        }

        if let Some(pending) = tui_app.pending.take() {
            let accepted = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
            if confirm_pending(&mut tui_app, ctx.channels.as_ref(), pending, accepted)? {
                spawn_refresh(&ctx, Trigger::Manual, &tx);
            }
            continue;
        }

        tui_app.clear_status();
        let action = config.keybindings.get_action(&key);

        if tui_app.view == View::Pizza {
            match action {
                Action::Quit => tui_app.should_quit = true,
                Action::TogglePizza => {
                    tui_app.toggle_view();
                }
                Action::Refresh => spawn_pizza(&mut tui_app, &ctx, &tx),
                _ => {}
            }
        } else {
            match action {
                Action::Quit => {
                    tui_app.should_quit = true;
                }
                Action::MoveUp => tui_app.move_up(),
                Action::MoveDown => tui_app.move_down(),
                Action::NextPage => tui_app.next_page(),
                Action::PrevPage => tui_app.prev_page(),
                Action::ToggleMaximize => tui_app.toggle_maximize(),
                Action::NextPane => {
                    tui_app.active_pane = tui_app.active_pane.next();
                }
                Action::PrevPane => {
                    tui_app.active_pane = tui_app.active_pane.prev();
                }
                Action::Select => {
                    if tui_app.active_pane == ActivePane::Channels {
                        tui_app.apply_channel_filter();
                        tui_app.active_pane = ActivePane::Posts;
                    }
                }
                Action::Refresh => {
                    spawn_refresh(&ctx, Trigger::Manual, &tx);
                }
                Action::Analyze => {
                    analyze_selected(&mut tui_app, &ctx, &tx);
                }
                Action::OpenInBrowser => {
                    if let Some(post) = tui_app.selected_post() {
                        let link = post.link();
                        if let Err(e) = open::that(&link) {
                            tui_app.set_status(format!("Failed to open browser: {}", e));
                        }
                    }
                }
                Action::RemoveChannel => {
                    if tui_app.active_pane == ActivePane::Channels {
                        if let Some(handle) = tui_app.selected_channel() {
                            tui_app.pending = Some(Confirm::Remove(handle.to_string()));
                        }
                    }
                }
                Action::AddChannel => tui_app.open_input(),
                Action::ClearChannels => {
                    if !tui_app.channels.is_empty() {
                        tui_app.pending = Some(Confirm::ClearAll);
                    }
                }
                Action::TogglePizza => {
                    if tui_app.toggle_view() {
                        spawn_pizza(&mut tui_app, &ctx, &tx);
                    }
                }
                Action::None => {}
            }
        }

        if tui_app.should_quit {
            break;
        }
    }

    running.store(false, Ordering::SeqCst);
    periodic.abort();

    Ok(())
}

fn spawn_refresh(ctx: &AppContext, trigger: Trigger, tx: &mpsc::UnboundedSender<UiMessage>) {
    let refresh = ctx.refresh.clone();
    let tx = tx.clone();

    tokio::spawn(async move {
        let outcome = refresh.refresh(trigger).await;
        let _ = tx.send(UiMessage::Refreshed(outcome));
    });
}

fn spawn_pizza(tui_app: &mut TuiApp, ctx: &AppContext, tx: &mpsc::UnboundedSender<UiMessage>) {
    if !tui_app.start_pizza() {
        return;
    }

    let pizza = ctx.pizza.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let reading = pizza.read().await;
        let _ = tx.send(UiMessage::Pizza(reading));
    });
}

/// Follow the handle typed into the add-channel line. Returns true when the
/// channel list changed.
fn submit_channel(
    tui_app: &mut TuiApp,
    channels: &(dyn ChannelRepository + Send + Sync),
    text: &str,
) -> Result<bool> {
    let Some(handle) = normalize_handle(text) else {
        tui_app.set_status(format!("Not a channel handle: {}", text));
        return Ok(false);
    };

    if !channels.add(&handle)? {
        tui_app.set_status(format!("Already following @{}", handle));
        return Ok(false);
    }

    tui_app.set_channels(channels.list()?);
    tui_app.set_status(format!("Following @{}", handle));
    Ok(true)
}

/// Apply or drop a confirmed change. Returns true when the channel list
/// changed.
fn confirm_pending(
    tui_app: &mut TuiApp,
    channels: &(dyn ChannelRepository + Send + Sync),
    pending: Confirm,
    accepted: bool,
) -> Result<bool> {
    if !accepted {
        tui_app.set_status("Cancelled".to_string());
        return Ok(false);
    }

    match pending {
        Confirm::Remove(handle) => {
            channels.remove(&handle)?;
            tui_app.set_status(format!("Stopped following @{}", handle));
        }
        Confirm::ClearAll => {
            channels.clear()?;
            tui_app.set_status("Stopped following all channels".to_string());
        }
    }

    tui_app.set_channels(channels.list()?);
    Ok(true)
}

/// Request an insight for the selected post unless one is ready or in flight.
fn analyze_selected(tui_app: &mut TuiApp, ctx: &AppContext, tx: &mpsc::UnboundedSender<UiMessage>) {
    let Some(post) = tui_app.selected_post() else {
        return;
    };
    let key = post_key(post);
    let text = post.text.clone();

    match tui_app.insights.get(&key) {
        Some(InsightState::Pending) | Some(InsightState::Ready(_)) => return,
        Some(InsightState::Failed(_)) | None => {}
    }

    tui_app.insights.insert(key.clone(), InsightState::Pending);
    debug!("Analyzing post {:?}", key);

    let summarizer = ctx.summarizer.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = summarizer.analyze(&text).await.map_err(|e| e.to_string());
        let _ = tx.send(UiMessage::Analyzed { key, result });
    });
}

fn handle_message(tui_app: &mut TuiApp, message: UiMessage) {
    match message {
        UiMessage::Refreshed(outcome) => match outcome {
            RefreshOutcome::Updated(count) => {
                tui_app.set_status(format!("Loaded {} posts", count));
            }
            RefreshOutcome::Unchanged => {
                tui_app.set_status("No new posts".to_string());
            }
            RefreshOutcome::NoChannels => {
                tui_app.set_status("No channels followed".to_string());
            }
            // Failures show through the feed status.
            RefreshOutcome::Failed(_) | RefreshOutcome::Skipped => {}
        },
        UiMessage::Analyzed { key, result } => {
            let state = match result {
                Ok(insight) => InsightState::Ready(insight),
                Err(e) => {
                    warn!("Analysis of {:?} failed: {}", key, e);
                    InsightState::Failed(e)
                }
            };
            tui_app.insights.insert(key, state);
        }
        UiMessage::Pizza(reading) => {
            tui_app.pizza = PizzaState::Ready(reading);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Impact, PizzaStats, Sentiment};
    use crate::store::SqliteChannelStore;

    fn store(handles: &[&str]) -> SqliteChannelStore {
        let defaults: Vec<String> = handles.iter().map(|h| h.to_string()).collect();
        SqliteChannelStore::in_memory(&defaults).unwrap()
    }

    fn insight() -> NewsInsight {
        NewsInsight {
            summary: "summary".into(),
            impact: Impact::Low,
            tags: vec![],
            sentiment: Sentiment::Neutral,
        }
    }

    #[test]
    fn test_failed_analysis_is_retryable_state() {
        let mut app = TuiApp::new();
        let key = ("alpha".to_string(), 7);

        handle_message(
            &mut app,
            UiMessage::Analyzed {
                key: key.clone(),
                result: Err("quota".into()),
            },
        );
        assert_eq!(
            app.insights.get(&key),
            Some(&InsightState::Failed("quota".into()))
        );

        handle_message(
            &mut app,
            UiMessage::Analyzed {
                key: key.clone(),
                result: Ok(insight()),
            },
        );
        assert_eq!(app.insights.get(&key), Some(&InsightState::Ready(insight())));
    }

    #[test]
    fn test_refresh_outcome_status() {
        let mut app = TuiApp::new();
        handle_message(&mut app, UiMessage::Refreshed(RefreshOutcome::Updated(3)));
        assert_eq!(app.status_message.as_deref(), Some("Loaded 3 posts"));

        app.clear_status();
        handle_message(&mut app, UiMessage::Refreshed(RefreshOutcome::Skipped));
        assert_eq!(app.status_message, None);
    }

    #[test]
    fn test_submit_channel_follows_normalized_handle() {
        let channels = store(&["alpha"]);
        let mut app = TuiApp::new();
        app.set_channels(channels.list().unwrap());

        assert!(submit_channel(&mut app, &channels, "https://t.me/s/Gamma").unwrap());
        assert_eq!(app.channels, vec!["alpha", "gamma"]);
        assert_eq!(app.status_message.as_deref(), Some("Following @gamma"));

        assert!(!submit_channel(&mut app, &channels, "@GAMMA").unwrap());
        assert_eq!(app.status_message.as_deref(), Some("Already following @gamma"));

        assert!(!submit_channel(&mut app, &channels, "t.me/a/b").unwrap());
        assert_eq!(channels.list().unwrap().len(), 2);
    }

    #[test]
    fn test_confirm_remove_and_clear() {
        let channels = store(&["alpha", "beta"]);
        let mut app = TuiApp::new();
        app.set_channels(channels.list().unwrap());

        let declined =
            confirm_pending(&mut app, &channels, Confirm::Remove("alpha".into()), false).unwrap();
        assert!(!declined);
        assert_eq!(channels.list().unwrap().len(), 2);

        assert!(confirm_pending(&mut app, &channels, Confirm::Remove("alpha".into()), true).unwrap());
        assert_eq!(app.channels, vec!["beta"]);

        assert!(confirm_pending(&mut app, &channels, Confirm::ClearAll, true).unwrap());
        assert!(app.channels.is_empty());
        assert!(channels.list().unwrap().is_empty());
        assert_eq!(app.channel_index, 0);
    }

    #[test]
    fn test_pizza_reading_replaces_loading_state() {
        let mut app = TuiApp::new();
        app.start_pizza();
        let reading = PizzaReading {
            stats: PizzaStats::routine("10:00:00".into()),
            error: Some("offline".into()),
        };

        handle_message(&mut app, UiMessage::Pizza(reading.clone()));
        assert_eq!(app.pizza, PizzaState::Ready(reading));
    }
}
