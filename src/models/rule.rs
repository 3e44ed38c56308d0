use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Scoring dimension a rule contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Popularity,
    Recency,
    GenreMatch,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Popularity => "popularity",
            RuleType::Recency => "recency",
            RuleType::GenreMatch => "genre_match",
        }
    }
}

impl Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popularity" => Ok(RuleType::Popularity),
            "recency" => Ok(RuleType::Recency),
            "genre_match" => Ok(RuleType::GenreMatch),
            other => Err(format!("unknown rule type '{}'", other)),
        }
    }
}

/// A named, weighted scoring rule read from the rule store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRule {
    pub id: i64,
    pub name: String,
    pub rule_type: RuleType,
    pub weight: f64,
    #[serde(rename = "is_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_type_parse() {
        assert_eq!("popularity".parse::<RuleType>(), Ok(RuleType::Popularity));
        assert_eq!("recency".parse::<RuleType>(), Ok(RuleType::Recency));
        assert_eq!("genre_match".parse::<RuleType>(), Ok(RuleType::GenreMatch));
        assert!("collaborative".parse::<RuleType>().is_err());
    }

    #[test]
    fn test_rule_type_serialization_matches_store_names() {
        for rule_type in [RuleType::Popularity, RuleType::Recency, RuleType::GenreMatch] {
            let json = serde_json::to_string(&rule_type).unwrap();
            assert_eq!(json, format!("\"{}\"", rule_type.as_str()));
        }
    }

    #[test]
    fn test_scoring_rule_serializes_is_active() {
        let rule = ScoringRule {
            id: 1,
            name: "Popularity Score".to_string(),
            rule_type: RuleType::Popularity,
            weight: 0.4,
            active: true,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["rule_type"], "popularity");
        assert_eq!(value["is_active"], true);
        assert_eq!(value["weight"], 0.4);
    }
}
