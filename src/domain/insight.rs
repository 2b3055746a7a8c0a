use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// Structured analysis of one post, produced by a summarizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsInsight {
    pub summary: String,
    pub impact: Impact,
    pub tags: Vec<String>,
    pub sentiment: Sentiment,
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Impact::Low => write!(f, "low"),
            Impact::Medium => write!(f, "medium"),
            Impact::High => write!(f, "high"),
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Neutral => write!(f, "neutral"),
            Sentiment::Negative => write!(f, "negative"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_lowercase_enums() {
        let json = r#"{"summary":"s","impact":"high","tags":["a","b"],"sentiment":"negative"}"#;
        let insight: NewsInsight = serde_json::from_str(json).unwrap();
        assert_eq!(insight.impact, Impact::High);
        assert_eq!(insight.sentiment, Sentiment::Negative);
        assert_eq!(insight.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_rejects_unknown_impact() {
        let json = r#"{"summary":"s","impact":"severe","tags":[],"sentiment":"neutral"}"#;
        assert!(serde_json::from_str::<NewsInsight>(json).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Impact::Medium.to_string(), "medium");
        assert_eq!(Sentiment::Positive.to_string(), "positive");
    }
}
