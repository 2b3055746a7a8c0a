//! Post analysis through a hosted language model.
//!
//! Every request asks for JSON constrained by a response schema: one for
//! single posts, one for the pizzint.watch index page.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::app::{Result, TelefeedError};
use crate::domain::{NewsInsight, PizzaStats};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

#[async_trait]
pub trait Summarizer {
    async fn analyze(&self, text: &str) -> Result<NewsInsight>;

    /// Read the pizza index out of text scraped from its site.
    async fn assess_pizza(&self, site_text: &str) -> Result<PizzaStats>;
}

/// Gemini `generateContent` client returning structured JSON.
pub struct GeminiSummarizer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiSummarizer {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("telefeed/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    /// POST a `generateContent` request and return the response body.
    async fn generate(&self, body: &Value) -> Result<Value> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TelefeedError::Summarizer("API key is not set".into()))?;

        debug!("Requesting analysis from {}", self.model);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Summarizer returned {}: {}", status, body);
            return Err(TelefeedError::Summarizer(format!(
                "HTTP {} from {}",
                status, self.model
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn analyze(&self, text: &str) -> Result<NewsInsight> {
        let body = self.generate(&request_body(text)).await?;
        parse_response(&body)
    }

    async fn assess_pizza(&self, site_text: &str) -> Result<PizzaStats> {
        let body = self.generate(&pizza_request_body(site_text)).await?;
        parse_response(&body)
    }
}

fn prompt(text: &str) -> String {
    format!(
        "Analyze the following Hebrew news item and provide a professional summary, \
         impact level, relevant tags, and sentiment. Return ONLY JSON.\n\n\
         News Content: {}",
        text
    )
}

fn request_body(text: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt(text) }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "summary": {
                        "type": "STRING",
                        "description": "A concise professional summary in Hebrew."
                    },
                    "impact": {
                        "type": "STRING",
                        "enum": ["low", "medium", "high"],
                        "description": "The likely impact level of this news."
                    },
                    "tags": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" },
                        "description": "Relevant news tags in Hebrew."
                    },
                    "sentiment": {
                        "type": "STRING",
                        "enum": ["positive", "neutral", "negative"],
                        "description": "The overall sentiment of the news."
                    }
                },
                "required": ["summary", "impact", "tags", "sentiment"]
            }
        }
    })
}

fn pizza_prompt(site_text: &str) -> String {
    format!(
        "אתה אנליסט מודיעין. חלץ נתונים מהטקסט הבא שנלקח מהאתר pizzint.watch \
         (אתר העוקב אחר 'מדד הפיצה' בפנטגון).\n\
         עליך להחזיר אובייקט JSON מדויק עם השדות הבאים בעברית:\n\
         - level: מספר הרמה הנוכחי (בד\"כ 1-5).\n\
         - threatLevel: שם רמת האיום (למשל: \"Low\", \"Elevated\", \"High\"). תרגם לעברית מקצועית.\n\
         - why: הסבר קצר (השדה \"Why?\" באתר) המסביר מדוע המדד ברמה הזו.\n\
         - facts: רשימה של 3-4 עובדות או אירועים גיאופוליטיים שמוזכרים באתר כקשורים למדד.\n\
         - lastUpdate: זמן העדכון האחרון שמופיע.\n\n\
         הטקסט מהאתר:\n{}",
        site_text
    )
}

fn pizza_request_body(site_text: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": pizza_prompt(site_text) }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "level": { "type": "NUMBER" },
                    "threatLevel": { "type": "STRING" },
                    "why": { "type": "STRING" },
                    "facts": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "lastUpdate": { "type": "STRING" }
                },
                "required": ["level", "threatLevel", "why", "facts", "lastUpdate"]
            }
        }
    })
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// Extract the JSON payload from a `generateContent` response body.
fn parse_response<T: DeserializeOwned>(body: &Value) -> Result<T> {
    let response = GenerateResponse::deserialize(body)?;

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| TelefeedError::Summarizer("Response contained no text".into()))?;

    // Models occasionally wrap JSON in a fenced block despite the mime type.
    let cleaned = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    serde_json::from_str(cleaned)
        .map_err(|e| TelefeedError::Summarizer(format!("Malformed JSON payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Impact, Sentiment};

    fn wrap(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
    }

    #[test]
    fn test_parse_response() {
        let body = wrap(
            r#"{"summary":"סיכום","impact":"medium","tags":["ביטחון"],"sentiment":"neutral"}"#,
        );
        let insight: NewsInsight = parse_response(&body).unwrap();

        assert_eq!(insight.summary, "סיכום");
        assert_eq!(insight.impact, Impact::Medium);
        assert_eq!(insight.tags, vec!["ביטחון"]);
        assert_eq!(insight.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_parse_response_strips_code_fence() {
        let body = wrap(
            "```json\n{\"summary\":\"s\",\"impact\":\"low\",\"tags\":[],\"sentiment\":\"positive\"}\n```",
        );
        let insight: NewsInsight = parse_response(&body).unwrap();
        assert_eq!(insight.impact, Impact::Low);
    }

    #[test]
    fn test_parse_response_without_candidates() {
        let err = parse_response::<NewsInsight>(&json!({ "candidates": [] })).unwrap_err();
        assert!(matches!(err, TelefeedError::Summarizer(_)));

        let err = parse_response::<NewsInsight>(&json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap_err();
        assert!(matches!(err, TelefeedError::Summarizer(_)));
    }

    #[test]
    fn test_parse_response_malformed_json() {
        let err = parse_response::<NewsInsight>(&wrap("not json at all")).unwrap_err();
        assert!(matches!(err, TelefeedError::Summarizer(ref m) if m.contains("Malformed")));
    }

    #[test]
    fn test_request_body_shape() {
        let body = request_body("שלום");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            body["generationConfig"]["responseSchema"]["required"]
                .as_array()
                .map(|a| a.len()),
            Some(4)
        );
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.ends_with("News Content: שלום"));
    }

    #[test]
    fn test_url() {
        let summarizer = GeminiSummarizer::new(
            "https://example.test/v1beta/",
            "gemini-test",
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            summarizer.url(),
            "https://example.test/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_missing_api_key_fails_without_request() {
        let summarizer = GeminiSummarizer::new(
            "http://127.0.0.1:9",
            DEFAULT_MODEL,
            Some("  ".into()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(summarizer.api_key.is_none());

        let err = tokio_test::block_on(summarizer.analyze("text")).unwrap_err();
        assert!(matches!(err, TelefeedError::Summarizer(ref m) if m.contains("API key")));

        let err = tokio_test::block_on(summarizer.assess_pizza("site")).unwrap_err();
        assert!(matches!(err, TelefeedError::Summarizer(ref m) if m.contains("API key")));
    }

    #[test]
    fn test_parse_pizza_response() {
        let body = wrap(
            r#"{"level":2,"threatLevel":"ערנות","why":"עלייה בהזמנות","facts":["א","ב","ג"],"lastUpdate":"21:40"}"#,
        );
        let stats: PizzaStats = parse_response(&body).unwrap();

        assert_eq!(stats.level, 2);
        assert_eq!(stats.why, "עלייה בהזמנות");
        assert_eq!(stats.facts.len(), 3);
        assert_eq!(stats.last_update, "21:40");
    }

    #[test]
    fn test_parse_pizza_response_missing_field() {
        let body = wrap(r#"{"level":2,"why":"w","facts":[],"lastUpdate":"u"}"#);
        let err = parse_response::<PizzaStats>(&body).unwrap_err();
        assert!(matches!(err, TelefeedError::Summarizer(ref m) if m.contains("threatLevel")));
    }

    #[test]
    fn test_pizza_request_body_shape() {
        let body = pizza_request_body("Pizza index: 3");
        let schema = &body["generationConfig"]["responseSchema"];

        assert_eq!(schema["properties"]["level"]["type"], "NUMBER");
        assert_eq!(schema["required"].as_array().map(|a| a.len()), Some(5));
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("pizzint.watch"));
        assert!(prompt.ends_with("Pizza index: 3"));
    }
}
