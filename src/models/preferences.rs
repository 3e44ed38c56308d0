use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Preference profile as served by the user preference service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPreferenceProfile {
    pub user_id: i64,
    #[serde(default)]
    pub preferred_genres: Vec<String>,
    #[serde(default)]
    pub preferred_language: String,
    #[serde(default)]
    pub min_rating: f64,
}

impl UserPreferenceProfile {
    /// Profile used when the preference service cannot be reached
    pub fn empty(user_id: i64) -> Self {
        Self {
            user_id,
            preferred_genres: Vec::new(),
            preferred_language: String::new(),
            min_rating: 0.0,
        }
    }

    /// Lowercased set of preferred genres for case-insensitive matching
    pub fn genre_set(&self) -> HashSet<String> {
        self.preferred_genres
            .iter()
            .map(|g| g.trim().to_lowercase())
            .filter(|g| !g.is_empty())
            .collect()
    }
}
