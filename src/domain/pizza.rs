use serde::{Deserialize, Deserializer, Serialize};

pub const MAX_PIZZA_LEVEL: u8 = 5;

const LEVEL_NAMES: [&str; 6] = [
    "",
    "שגרה מלאה",
    "ערנות מוגברת",
    "דריכות גבוהה",
    "סכנה מיידית",
    "חירום לאומי",
];

/// One reading of the pizzint.watch activity index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PizzaStats {
    /// 1 (routine) to 5; 0 when the source gave nothing usable.
    #[serde(deserialize_with = "deserialize_level")]
    pub level: u8,
    pub threat_level: String,
    pub why: String,
    #[serde(default)]
    pub facts: Vec<String>,
    pub last_update: String,
}

impl PizzaStats {
    /// Reading shown when the live index could not be read.
    pub fn routine(last_update: String) -> Self {
        Self {
            level: 1,
            threat_level: "שגרה (Low)".to_string(),
            why: "לא ניתן היה להתחבר לשרתי Pizzint.watch. ייתכן שיש עומס על הפרוקסי."
                .to_string(),
            facts: vec![
                "הפנטגון פועל כבשגרה.".to_string(),
                "אין דיווחים חריגים על הזמנות פיצה ליליות.".to_string(),
            ],
            last_update,
        }
    }

    pub fn level_name(&self) -> &'static str {
        LEVEL_NAMES
            .get(self.level as usize)
            .copied()
            .filter(|name| !name.is_empty())
            .unwrap_or("לא ידוע")
    }

    /// Fill of the level gauge, 0.0 to 1.0.
    pub fn ratio(&self) -> f64 {
        f64::from(self.level.min(MAX_PIZZA_LEVEL)) / f64::from(MAX_PIZZA_LEVEL)
    }
}

// The model answers with a JSON number, sometimes fractional.
fn deserialize_level<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let level = f64::deserialize(deserializer)?;
    if level.is_nan() {
        return Ok(0);
    }
    Ok(level.round().clamp(0.0, f64::from(MAX_PIZZA_LEVEL)) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{"level":3,"threatLevel":"גבוה","why":"הזמנות","facts":["a","b"],"lastUpdate":"12:00"}"#;
        let stats: PizzaStats = serde_json::from_str(json).unwrap();

        assert_eq!(stats.level, 3);
        assert_eq!(stats.threat_level, "גבוה");
        assert_eq!(stats.facts.len(), 2);
        assert_eq!(stats.last_update, "12:00");
        assert_eq!(stats.level_name(), "דריכות גבוהה");
    }

    #[test]
    fn test_level_is_rounded_and_clamped() {
        let parse = |level: &str| {
            let json = format!(
                r#"{{"level":{},"threatLevel":"t","why":"w","lastUpdate":"u"}}"#,
                level
            );
            serde_json::from_str::<PizzaStats>(&json).map(|s| s.level)
        };

        assert_eq!(parse("2.6").unwrap(), 3);
        assert_eq!(parse("9").unwrap(), MAX_PIZZA_LEVEL);
        assert_eq!(parse("-1").unwrap(), 0);
        assert!(parse("\"high\"").is_err());
    }

    #[test]
    fn test_routine_reading() {
        let stats = PizzaStats::routine("09:15:00".into());
        assert_eq!(stats.level, 1);
        assert_eq!(stats.level_name(), "שגרה מלאה");
        assert_eq!(stats.ratio(), 0.2);
        assert!(!stats.facts.is_empty());
    }

    #[test]
    fn test_unknown_level_name() {
        let mut stats = PizzaStats::routine(String::new());
        stats.level = 0;
        assert_eq!(stats.level_name(), "לא ידוע");
        assert_eq!(stats.ratio(), 0.0);
    }
}
