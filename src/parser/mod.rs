//! Extraction of posts from one channel preview page.
//!
//! The preview lists messages oldest-first. Nodes are walked newest-first so
//! that the first message older than the horizon ends the page, and the
//! scanner can stop paginating.

mod node;
mod text;

pub use node::{HtmlNode, NodeQuery};
pub use text::{background_image_url, normalize_text};

use chrono::{DateTime, Utc};
use scraper::Html;
use tracing::debug;

use crate::domain::Post;

const MESSAGE_WRAP: &str = ".tgme_widget_message_wrap";
const MESSAGE: &str = ".tgme_widget_message";
const OWNER_NAME: &str = ".tgme_widget_message_owner_name";
const PHOTO_WRAP: &str = ".tgme_widget_message_photo_wrap";
// Video players carry an undated duration `<time>` ahead of the footer's.
const DATED_TIME: &str = "time[datetime]";
const TEXT: [&str; 2] = [".tgme_widget_message_text", ".js-message_text"];
const VIDEO_MARKERS: [&str; 4] = [
    ".tgme_widget_message_video_wrap",
    ".tgme_widget_message_video_player",
    ".tgme_widget_message_roundvideo_wrap",
    "i.tgme_widget_message_video_icon",
];

/// Posts of one page, newest first, and whether the horizon was crossed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    pub posts: Vec<Post>,
    pub reached_horizon: bool,
}

/// Parse raw page markup for channel `handle`.
pub fn parse_page(raw_html: &str, handle: &str, horizon: DateTime<Utc>) -> ParsedPage {
    let document = Html::parse_document(raw_html);
    parse_nodes(&HtmlNode::root(&document), handle, horizon)
}

/// Walk the message nodes under `root`, newest first.
pub fn parse_nodes<N: NodeQuery>(root: &N, handle: &str, horizon: DateTime<Utc>) -> ParsedPage {
    let mut page = ParsedPage::default();

    for node in root.query_selector_all(MESSAGE_WRAP).iter().rev() {
        let Some(timestamp) = message_timestamp(node) else {
            debug!("Skipping undated message node in {}", handle);
            continue;
        };

        // Everything after this node in reversed order is older still.
        if timestamp < horizon {
            page.reached_horizon = true;
            break;
        }

        let id = message_id(node).unwrap_or_else(|| Post::synthetic_id(timestamp));

        let media_url = if is_video(node) {
            None
        } else {
            photo_url(node)
        };

        let Some(text_node) = TEXT.iter().find_map(|selector| node.query_selector(selector)) else {
            debug!("Dropping message {} in {} without text", id, handle);
            continue;
        };

        page.posts.push(Post {
            id,
            text: normalize_text(&text_node.inner_html()),
            timestamp,
            source_name: owner_name(node).unwrap_or_else(|| handle.to_string()),
            source_id: handle.to_string(),
            media_url,
        });
    }

    page
}

fn message_timestamp<N: NodeQuery>(node: &N) -> Option<DateTime<Utc>> {
    let datetime = node.query_selector(DATED_TIME)?.get_attribute("datetime")?;
    DateTime::parse_from_rfc3339(datetime.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Numeric id from a `data-post="<channel>/<id>"` reference.
fn message_id<N: NodeQuery>(node: &N) -> Option<i64> {
    let reference = node.query_selector(MESSAGE)?.get_attribute("data-post")?;
    reference
        .rsplit('/')
        .next()
        .and_then(|id| id.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
}

fn is_video<N: NodeQuery>(node: &N) -> bool {
    VIDEO_MARKERS
        .iter()
        .any(|selector| node.query_selector(selector).is_some())
}

fn photo_url<N: NodeQuery>(node: &N) -> Option<String> {
    let style = node.query_selector(PHOTO_WRAP)?.get_attribute("style")?;
    background_image_url(&style)
}

fn owner_name<N: NodeQuery>(node: &N) -> Option<String> {
    let name = node.query_selector(OWNER_NAME)?.text_content();
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}
