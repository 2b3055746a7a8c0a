use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;

static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid line break regex"));

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

static CSS_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"url\(['"]?([^'"]+)['"]?\)"#).expect("valid css url regex"));

/// Plain text from a message body's inner markup.
pub fn normalize_text(markup: &str) -> String {
    let with_newlines = LINE_BREAK.replace_all(markup, "\n");
    let stripped = TAG.replace_all(&with_newlines, "");
    decode_html_entities(&stripped).trim().to_string()
}

/// First `url(...)` reference in an inline style attribute.
pub fn background_image_url(style: &str) -> Option<String> {
    CSS_URL
        .captures(style)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|url| !url.is_empty())
}
