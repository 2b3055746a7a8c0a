use chrono::{DateTime, Datelike, Duration, Local, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A single public post scraped from a channel preview page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Identifier, unique only within `source_id`.
    pub id: i64,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub source_name: String,
    /// Canonical lowercase channel handle.
    pub source_id: String,
    pub media_url: Option<String>,
}

impl Post {
    /// Composite identity that stays unique across channels.
    pub fn key(&self) -> (&str, i64) {
        (&self.source_id, self.id)
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Public web link to the post.
    pub fn link(&self) -> String {
        format!("https://t.me/{}/{}", self.source_id, self.id)
    }

    /// First non-empty line of the text, used as a list title.
    pub fn headline(&self) -> &str {
        self.text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("(empty)")
    }

    /// Whether the post belongs to `handle`, compared case-insensitively.
    pub fn is_from(&self, handle: &str) -> bool {
        self.source_id.eq_ignore_ascii_case(handle)
    }

    /// Identifier for posts whose markup carries none.
    ///
    /// Offset from the publication time by random jitter so two undated ids
    /// from the same second rarely collide. Collisions remain possible.
    pub fn synthetic_id(timestamp: DateTime<Utc>) -> i64 {
        let jitter: i64 = rand::rng().random_range(1..1000);
        timestamp.timestamp_millis() + jitter
    }
}

/// Keep only posts from `handle`, compared case-insensitively.
pub fn filter_by_source<'a>(posts: &'a [Post], handle: &str) -> Vec<&'a Post> {
    posts
        .iter()
        .filter(|post| post.is_from(handle))
        .collect()
}

/// Human label for the local calendar day of `timestamp` relative to `now`.
pub fn day_label(timestamp: DateTime<Utc>, now: DateTime<Local>) -> String {
    let day = timestamp.with_timezone(&Local).date_naive();
    let today = now.date_naive();

    if day == today {
        "Today".to_string()
    } else if Some(day) == today.checked_sub_signed(Duration::days(1)) {
        "Yesterday".to_string()
    } else if day.year() == today.year() {
        day.format("%-d %B").to_string()
    } else {
        day.format("%-d %B %Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(source_id: &str, id: i64) -> Post {
        Post {
            id,
            text: "\n  first line\nsecond".into(),
            timestamp: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            source_name: source_id.to_uppercase(),
            source_id: source_id.into(),
            media_url: None,
        }
    }

    #[test]
    fn test_key_includes_source() {
        let a = post("alpha", 7);
        let b = post("beta", 7);
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), ("alpha", 7));
    }

    #[test]
    fn test_link() {
        assert_eq!(post("alpha", 42).link(), "https://t.me/alpha/42");
    }

    #[test]
    fn test_headline_skips_blank_lines() {
        assert_eq!(post("alpha", 1).headline(), "first line");

        let mut empty = post("alpha", 1);
        empty.text = "   ".into();
        assert_eq!(empty.headline(), "(empty)");
    }

    #[test]
    fn test_synthetic_id_is_near_timestamp() {
        let ts = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let id = Post::synthetic_id(ts);
        assert!(id > ts.timestamp_millis());
        assert!(id < ts.timestamp_millis() + 1000);
    }

    #[test]
    fn test_filter_by_source_ignores_case() {
        let posts = vec![post("alpha", 1), post("beta", 2), post("alpha", 3)];
        let filtered = filter_by_source(&posts, "ALPHA");
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|p| p.source_id == "alpha"));
    }

    #[test]
    fn test_day_label() {
        let now = Local::now();
        assert_eq!(day_label(now.with_timezone(&Utc), now), "Today");

        let yesterday = now - Duration::days(1);
        assert_eq!(day_label(yesterday.with_timezone(&Utc), now), "Yesterday");

        let older = now - Duration::days(400);
        let label = day_label(older.with_timezone(&Utc), now);
        assert!(label.ends_with(&older.year().to_string()));
    }
}
