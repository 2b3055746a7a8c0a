//! Fetching channel pages through third-party forwarding relays.
//!
//! The preview site is not reached directly. Each page request is wrapped
//! for a relay, and relays are tried in a fixed order until one hands back
//! genuine channel markup.
//!
//! ```text
//! target URL → Relay::wrap → Transport::get → unwrap envelope → marker check
//! ```

mod transport;

pub use transport::{HttpTransport, Transport, TransportResponse};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::app::{Result, TelefeedError};

/// Shape in which a relay returns the forwarded body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Envelope {
    /// Upstream body passed through untouched.
    Raw,
    /// JSON object with the upstream body in a `contents` string field.
    JsonContents,
    /// Upstream body passed through as `text/plain`.
    PlainText,
}

/// A forwarding endpoint that takes the URL-encoded target after `prefix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relay {
    pub name: String,
    pub prefix: String,
    pub envelope: Envelope,
}

impl Relay {
    pub fn new(name: &str, prefix: &str, envelope: Envelope) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix.to_string(),
            envelope,
        }
    }

    /// Built-in relay chain, in the order they are tried.
    pub fn defaults() -> Vec<Relay> {
        vec![
            Relay::new("corsproxy", "https://corsproxy.io/?", Envelope::Raw),
            Relay::new(
                "allorigins",
                "https://api.allorigins.win/get?url=",
                Envelope::JsonContents,
            ),
            Relay::new(
                "codetabs",
                "https://api.codetabs.com/v1/proxy?quest=",
                Envelope::PlainText,
            ),
        ]
    }

    /// Relay URL for `target`.
    pub fn wrap(&self, target: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
        format!("{}{}", self.prefix, encoded)
    }

    /// Extract the upstream markup from a relay response.
    ///
    /// A JSON content type is unwrapped regardless of the configured envelope,
    /// since relays report their own errors as JSON objects.
    fn unwrap_body(&self, response: TransportResponse) -> Result<String> {
        if self.envelope == Envelope::JsonContents || response.is_json() {
            let value: serde_json::Value = serde_json::from_str(&response.body)?;
            return Ok(value
                .get("contents")
                .and_then(|c| c.as_str())
                .unwrap_or_default()
                .to_string());
        }

        Ok(response.body)
    }
}

/// Tries each relay in order and returns the first body that passes the
/// marker check.
pub struct RelaySelector {
    transport: Arc<dyn Transport + Send + Sync>,
    relays: Vec<Relay>,
    marker: String,
}

impl RelaySelector {
    pub fn new(
        transport: Arc<dyn Transport + Send + Sync>,
        relays: Vec<Relay>,
        marker: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            relays,
            marker: marker.into(),
        }
    }

    /// Fetch `target_url` through the relay chain.
    ///
    /// `None` means no relay produced usable markup; callers treat that as
    /// "no more pages".
    pub async fn fetch(&self, target_url: &str) -> Option<String> {
        for relay in &self.relays {
            match self.try_relay(relay, target_url).await {
                Ok(Some(body)) => {
                    debug!("Fetched {} via {}", target_url, relay.name);
                    return Some(body);
                }
                Ok(None) => {
                    debug!("Relay {} returned no usable content for {}", relay.name, target_url);
                }
                Err(e) => {
                    warn!("Relay {} failed for {}: {}", relay.name, target_url, e);
                }
            }
        }

        warn!("All relays failed for {}", target_url);
        None
    }

    async fn try_relay(&self, relay: &Relay, target_url: &str) -> Result<Option<String>> {
        let response = self.transport.get(&relay.wrap(target_url)).await?;

        if !response.is_success() {
            return Err(TelefeedError::Other(format!("HTTP status {}", response.status)));
        }

        let body = relay.unwrap_body(response)?;
        if body.contains(&self.marker) {
            Ok(Some(body))
        } else {
            Ok(None)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{html, json, status, ScriptedTransport};
    use super::*;

    const TARGET: &str = "https://t.me/s/alpha";
    const PAGE: &str = r#"<div class="tgme_widget_message_wrap">hi</div>"#;

    fn selector(transport: Arc<ScriptedTransport>) -> RelaySelector {
        RelaySelector::new(transport, Relay::defaults(), "tgme_widget_message")
    }

    #[test]
    fn test_wrap_encodes_target() {
        let relay = Relay::new("r", "https://relay.test/?url=", Envelope::Raw);
        assert_eq!(
            relay.wrap("https://t.me/s/alpha?before=10"),
            "https://relay.test/?url=https%3A%2F%2Ft.me%2Fs%2Falpha%3Fbefore%3D10"
        );
    }

    #[tokio::test]
    async fn test_first_relay_wins() {
        let transport = Arc::new(ScriptedTransport::new(|_| html(PAGE)));
        let body = selector(transport.clone()).fetch(TARGET).await;

        assert_eq!(body.as_deref(), Some(PAGE));
        assert_eq!(transport.calls().len(), 1);
        assert!(transport.calls()[0].starts_with("https://corsproxy.io/?"));
    }

    #[tokio::test]
    async fn test_falls_back_on_error_status() {
        let transport = Arc::new(ScriptedTransport::new(|url| {
            if url.starts_with("https://corsproxy.io") {
                status(503)
            } else {
                json(&serde_json::json!({ "contents": PAGE }).to_string())
            }
        }));
        let body = selector(transport.clone()).fetch(TARGET).await;

        assert_eq!(body.as_deref(), Some(PAGE));
        assert_eq!(transport.calls().len(), 2);
        assert!(transport.calls()[1].starts_with("https://api.allorigins.win/get?url="));
    }

    #[tokio::test]
    async fn test_falls_back_on_transport_error() {
        let transport = Arc::new(ScriptedTransport::new(|url| {
            if url.starts_with("https://api.codetabs.com") {
                html(PAGE)
            } else {
                Err(TelefeedError::Other("connection reset".into()))
            }
        }));
        let body = selector(transport.clone()).fetch(TARGET).await;

        assert_eq!(body.as_deref(), Some(PAGE));
        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_rejects_body_without_marker() {
        let transport = Arc::new(ScriptedTransport::new(|url| {
            if url.starts_with("https://corsproxy.io") {
                html("<html>Access denied</html>")
            } else if url.starts_with("https://api.allorigins.win") {
                json(r#"{"status":{"http_code":500}}"#)
            } else {
                html(PAGE)
            }
        }));
        let body = selector(transport.clone()).fetch(TARGET).await;

        assert_eq!(body.as_deref(), Some(PAGE));
        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_all_relays_fail() {
        let transport = Arc::new(ScriptedTransport::new(|_| status(500)));
        let body = selector(transport.clone()).fetch(TARGET).await;

        assert!(body.is_none());
        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_json_envelope_is_skipped() {
        let relays = vec![Relay::new("a", "https://a.test/?", Envelope::JsonContents)];
        let transport = Arc::new(ScriptedTransport::new(|_| html("tgme_widget_message {")));
        let selector = RelaySelector::new(transport, relays, "tgme_widget_message");

        assert!(selector.fetch(TARGET).await.is_none());
    }
}
