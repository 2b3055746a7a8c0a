use std::collections::HashMap;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;

use crate::domain::{NewsInsight, Post};
use crate::pizza::PizzaReading;
use crate::refresh::{FeedState, FeedStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Feed,
    Pizza,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePane {
    Channels,
    Posts,
    Preview,
}

impl ActivePane {
    pub fn next(self) -> Self {
        match self {
            ActivePane::Channels => ActivePane::Posts,
            ActivePane::Posts => ActivePane::Preview,
            ActivePane::Preview => ActivePane::Channels,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ActivePane::Channels => ActivePane::Preview,
            ActivePane::Posts => ActivePane::Channels,
            ActivePane::Preview => ActivePane::Posts,
        }
    }
}

pub const PAGE_SIZE: usize = 10;

/// Per-post analysis progress. Failures are not cached; analyzing again
/// retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightState {
    Pending,
    Ready(NewsInsight),
    Failed(String),
}

/// Destructive channel-list changes waiting for a y/n answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirm {
    Remove(String),
    ClearAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PizzaState {
    Idle,
    Loading,
    Ready(PizzaReading),
}

/// Outcome of a key press while the add-channel line is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Editing,
    Cancelled,
    Submitted(String),
}

pub type PostKey = (String, i64);

pub fn post_key(post: &Post) -> PostKey {
    let (source, id) = post.key();
    (source.to_string(), id)
}

pub struct TuiApp {
    pub view: View,
    pub active_pane: ActivePane,
    /// Followed handles; row 0 of the channel list is "All".
    pub channels: Vec<String>,
    pub channel_index: usize,
    pub filter: Option<String>,
    pub posts: Arc<Vec<Post>>,
    /// Indices into `posts` that pass the channel filter.
    pub visible: Vec<usize>,
    pub post_index: usize,
    pub preview_scroll: u16,
    pub feed_status: FeedStatus,
    pub insights: HashMap<PostKey, InsightState>,
    pub should_quit: bool,
    pub status_message: Option<String>,
    pub maximized: bool,
    pub channel_list_state: ListState,
    pub post_list_state: ListState,
    pub pending: Option<Confirm>,
    /// Add-channel line being typed, if open.
    pub input: Option<String>,
    pub pizza: PizzaState,
}

impl TuiApp {
    pub fn new() -> Self {
        let mut channel_list_state = ListState::default();
        channel_list_state.select(Some(0));

        Self {
            view: View::Feed,
            active_pane: ActivePane::Posts,
            channels: Vec::new(),
            channel_index: 0,
            filter: None,
            posts: Arc::new(Vec::new()),
            visible: Vec::new(),
            post_index: 0,
            preview_scroll: 0,
            feed_status: FeedStatus::Idle,
            insights: HashMap::new(),
            should_quit: false,
            status_message: None,
            maximized: false,
            channel_list_state,
            post_list_state: ListState::default(),
            pending: None,
            input: None,
            pizza: PizzaState::Idle,
        }
    }

    pub fn selected_post(&self) -> Option<&Post> {
        self.visible
            .get(self.post_index)
            .and_then(|&i| self.posts.get(i))
    }

    /// Handle under the channel cursor; `None` on the "All" row.
    pub fn selected_channel(&self) -> Option<&str> {
        self.channel_index
            .checked_sub(1)
            .and_then(|i| self.channels.get(i))
            .map(String::as_str)
    }

    pub fn insight_for(&self, post: &Post) -> Option<&InsightState> {
        self.insights.get(&post_key(post))
    }

    pub fn set_channels(&mut self, channels: Vec<String>) {
        self.channels = channels;
        let rows = self.channels.len() + 1;
        if self.channel_index >= rows {
            self.channel_index = rows - 1;
        }
        self.channel_list_state.select(Some(self.channel_index));

        let filter_gone = self
            .filter
            .as_ref()
            .is_some_and(|f| !self.channels.iter().any(|c| c.eq_ignore_ascii_case(f)));
        if filter_gone {
            self.filter = None;
            self.rebuild_visible(true);
        }
    }

    /// Apply the latest published feed state.
    ///
    /// The selection stays on the same post when it still exists. When the
    /// newest post was selected, the newest post of the new list is selected.
    pub fn apply_feed(&mut self, state: FeedState) {
        self.feed_status = state.status;
        if Arc::ptr_eq(&self.posts, &state.posts) {
            return;
        }

        let following = self.visible.is_empty() || self.post_index + 1 >= self.visible.len();
        let previous = self.selected_post().map(post_key);

        self.posts = state.posts;
        self.rebuild_visible(following);

        if !following {
            let kept = previous.and_then(|key| {
                self.visible
                    .iter()
                    .position(|&i| post_key(&self.posts[i]) == key)
            });
            if let Some(pos) = kept {
                self.select_post(pos);
            }
        }
    }

    /// Filter the post list by the channel under the cursor.
    pub fn apply_channel_filter(&mut self) {
        self.filter = self.selected_channel().map(str::to_string);
        self.rebuild_visible(true);
    }

    fn rebuild_visible(&mut self, select_newest: bool) {
        self.visible = match &self.filter {
            Some(handle) => self
                .posts
                .iter()
                .enumerate()
                .filter(|(_, p)| p.is_from(handle))
                .map(|(i, _)| i)
                .collect(),
            None => (0..self.posts.len()).collect(),
        };

        if self.visible.is_empty() {
            self.post_index = 0;
            self.post_list_state.select(None);
        } else if select_newest || self.post_index >= self.visible.len() {
            self.select_post(self.visible.len() - 1);
        } else {
            self.select_post(self.post_index);
        }
    }

    fn select_post(&mut self, index: usize) {
        if index != self.post_index {
            self.preview_scroll = 0;
        }
        self.post_index = index;
        self.post_list_state.select(Some(index));
    }

    fn select_channel(&mut self, index: usize) {
        self.channel_index = index;
        self.channel_list_state.select(Some(index));
    }

    /// Move the cursor of the active pane by `delta` rows.
    fn step(&mut self, delta: isize) {
        match self.active_pane {
            ActivePane::Channels => {
                let max = self.channels.len();
                self.select_channel(offset(self.channel_index, delta, max));
            }
            ActivePane::Posts => {
                if let Some(max) = self.visible.len().checked_sub(1) {
                    self.select_post(offset(self.post_index, delta, max));
                }
            }
            ActivePane::Preview => {
                let scroll = offset(self.preview_scroll as usize, delta, u16::MAX as usize);
                self.preview_scroll = scroll as u16;
            }
        }
    }

    pub fn move_up(&mut self) {
        self.step(-1);
    }

    pub fn move_down(&mut self) {
        self.step(1);
    }

    pub fn next_page(&mut self) {
        self.step(PAGE_SIZE as isize);
    }

    pub fn prev_page(&mut self) {
        self.step(-(PAGE_SIZE as isize));
    }

    pub fn toggle_maximize(&mut self) {
        self.maximized = !self.maximized;
        if self.maximized {
            self.active_pane = ActivePane::Preview;
        }
    }

    /// Switch between the feed and the pizza index. Returns true when the
    /// pizza view opened without a reading or one in flight.
    pub fn toggle_view(&mut self) -> bool {
        self.view = match self.view {
            View::Feed => View::Pizza,
            View::Pizza => View::Feed,
        };
        self.view == View::Pizza && self.pizza == PizzaState::Idle
    }

    /// Mark a pizza reading as started unless one already is.
    pub fn start_pizza(&mut self) -> bool {
        if self.pizza == PizzaState::Loading {
            return false;
        }
        self.pizza = PizzaState::Loading;
        true
    }

    pub fn open_input(&mut self) {
        self.input = Some(String::new());
    }

    /// Feed a key to the add-channel line.
    pub fn input_key(&mut self, key: &KeyEvent) -> InputEvent {
        let Some(line) = self.input.as_mut() else {
            return InputEvent::Cancelled;
        };

        match key.code {
            KeyCode::Esc => {
                self.input = None;
                InputEvent::Cancelled
            }
            KeyCode::Enter => {
                let text = self.input.take().unwrap_or_default();
                if text.trim().is_empty() {
                    InputEvent::Cancelled
                } else {
                    InputEvent::Submitted(text.trim().to_string())
                }
            }
            KeyCode::Backspace => {
                line.pop();
                InputEvent::Editing
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input = None;
                InputEvent::Cancelled
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                line.push(c);
                InputEvent::Editing
            }
            _ => InputEvent::Editing,
        }
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }
}

impl Default for TuiApp {
    fn default() -> Self {
        Self::new()
    }
}

fn offset(index: usize, delta: isize, max: usize) -> usize {
    index.saturating_add_signed(delta).min(max)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::PizzaStats;

    fn post(source: &str, id: i64) -> Post {
        Post {
            id,
            text: format!("{} {}", source, id),
            timestamp: Utc.timestamp_opt(id * 60, 0).unwrap(),
            source_name: source.to_uppercase(),
            source_id: source.to_string(),
            media_url: None,
        }
    }

    fn state(posts: Vec<Post>) -> FeedState {
        FeedState {
            posts: Arc::new(posts),
            status: FeedStatus::Success,
        }
    }

    #[test]
    fn test_first_feed_selects_newest() {
        let mut app = TuiApp::new();
        app.apply_feed(state(vec![post("a", 1), post("b", 2), post("a", 3)]));

        assert_eq!(app.selected_post().map(|p| p.id), Some(3));
        assert_eq!(app.feed_status, FeedStatus::Success);
    }

    #[test]
    fn test_follows_newest_when_at_bottom() {
        let mut app = TuiApp::new();
        app.apply_feed(state(vec![post("a", 1), post("a", 2)]));
        app.apply_feed(state(vec![post("a", 1), post("a", 2), post("a", 3)]));

        assert_eq!(app.selected_post().map(|p| p.id), Some(3));
    }

    #[test]
    fn test_keeps_selection_when_reading_older_post() {
        let mut app = TuiApp::new();
        app.apply_feed(state(vec![post("a", 1), post("a", 2), post("a", 3)]));
        app.move_up();
        app.move_up();
        assert_eq!(app.selected_post().map(|p| p.id), Some(1));

        app.apply_feed(state(vec![post("a", 0), post("a", 1), post("a", 2), post("a", 3), post("a", 4)]));
        assert_eq!(app.selected_post().map(|p| p.id), Some(1));
    }

    #[test]
    fn test_channel_filter_is_case_insensitive() {
        let mut app = TuiApp::new();
        app.set_channels(vec!["alpha".into(), "beta".into()]);
        let mut other = post("Alpha", 3);
        other.source_id = "ALPHA".into();
        app.apply_feed(state(vec![post("alpha", 1), post("beta", 2), other]));

        app.active_pane = ActivePane::Channels;
        app.move_down();
        assert_eq!(app.selected_channel(), Some("alpha"));
        app.apply_channel_filter();

        let ids: Vec<i64> = app.visible.iter().map(|&i| app.posts[i].id).collect();
        assert_eq!(ids, vec![1, 3]);

        app.move_up();
        assert_eq!(app.selected_channel(), None);
        app.apply_channel_filter();
        assert_eq!(app.visible.len(), 3);
    }

    #[test]
    fn test_removed_channel_clears_filter() {
        let mut app = TuiApp::new();
        app.set_channels(vec!["alpha".into(), "beta".into()]);
        app.apply_feed(state(vec![post("alpha", 1), post("beta", 2)]));
        app.channel_index = 2;
        app.apply_channel_filter();
        assert_eq!(app.visible.len(), 1);

        app.set_channels(vec!["alpha".into()]);
        assert_eq!(app.filter, None);
        assert_eq!(app.channel_index, 1);
        assert_eq!(app.visible.len(), 2);
    }

    #[test]
    fn test_navigation_is_clamped() {
        let mut app = TuiApp::new();
        app.move_down();
        assert_eq!(app.post_index, 0);

        app.apply_feed(state((1..=15).map(|i| post("a", i)).collect()));
        app.prev_page();
        app.prev_page();
        assert_eq!(app.post_index, 0);
        app.next_page();
        assert_eq!(app.post_index, PAGE_SIZE);
        app.next_page();
        assert_eq!(app.post_index, 14);
    }

    #[test]
    fn test_same_posts_arc_is_ignored() {
        let mut app = TuiApp::new();
        let first = state(vec![post("a", 1), post("a", 2)]);
        app.apply_feed(first.clone());
        app.move_up();

        app.apply_feed(FeedState {
            status: FeedStatus::Loading,
            ..first
        });
        assert_eq!(app.post_index, 0);
        assert_eq!(app.feed_status, FeedStatus::Loading);
    }

    fn type_keys(app: &mut TuiApp, text: &str) {
        for c in text.chars() {
            assert_eq!(
                app.input_key(&KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)),
                InputEvent::Editing
            );
        }
    }

    #[test]
    fn test_input_line_submits_trimmed_text() {
        let mut app = TuiApp::new();
        app.open_input();
        type_keys(&mut app, " @gammaa");
        app.input_key(&KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(app.input.as_deref(), Some(" @gamma"));

        let event = app.input_key(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(event, InputEvent::Submitted("@gamma".into()));
        assert_eq!(app.input, None);
    }

    #[test]
    fn test_input_line_cancel() {
        let mut app = TuiApp::new();
        app.open_input();
        type_keys(&mut app, "x");
        assert_eq!(
            app.input_key(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)),
            InputEvent::Cancelled
        );
        assert_eq!(app.input, None);

        app.open_input();
        assert_eq!(
            app.input_key(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)),
            InputEvent::Cancelled
        );
        assert_eq!(
            app.input_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            InputEvent::Cancelled
        );
    }

    #[test]
    fn test_pizza_view_loads_once() {
        let mut app = TuiApp::new();
        assert!(app.toggle_view());
        assert_eq!(app.view, View::Pizza);
        assert!(app.start_pizza());
        assert!(!app.start_pizza());

        assert!(!app.toggle_view());
        assert_eq!(app.view, View::Feed);

        app.pizza = PizzaState::Ready(PizzaReading {
            stats: PizzaStats::routine("now".into()),
            error: None,
        });
        assert!(!app.toggle_view());
        assert!(app.start_pizza());
    }
}
