use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scored candidate as returned to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecommendation {
    #[serde(rename = "id")]
    pub item_id: i64,
    pub title: String,
    pub release_date: String,
    pub genres: Vec<String>,
    pub popularity: f64,
    pub poster_url: String,
    pub score: f64,
    pub reason: String,
}

/// Response body for the recommendations endpoint; also the cached value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub user_id: i64,
    pub recommendations: Vec<ScoredRecommendation>,
    pub generated_at: DateTime<Utc>,
}

/// Persisted score of one item for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecommendationSnapshot {
    pub user_id: i64,
    #[serde(rename = "movie_id")]
    #[sqlx(rename = "movie_id")]
    pub item_id: i64,
    pub score: f64,
    pub generated_at: DateTime<Utc>,
}
