use serde::{Deserialize, Serialize};

mod preferences;
mod recommendation;
mod rule;

pub use preferences::UserPreferenceProfile;
pub use recommendation::{RecommendationResponse, RecommendationSnapshot, ScoredRecommendation};
pub use rule::{RuleType, ScoringRule};

/// A catalog item considered for recommendation in one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub id: i64,
    pub title: String,
    /// ISO date (`YYYY-MM-DD`) or empty when unknown
    pub release_date: String,
    pub genres: Vec<String>,
    pub popularity: f64,
    pub poster_url: String,
    pub language: String,
    /// Runtime in minutes; zero when only the list summary was available
    pub duration: u32,
}

// ============================================================================
// Movie Service API Types
// ============================================================================

/// Summary row from GET /movies
#[derive(Debug, Clone, Deserialize)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub poster_url: String,
}

/// Paginated response from GET /movies
#[derive(Debug, Clone, Deserialize)]
pub struct MovieListResponse {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_results: u64,
    #[serde(default)]
    pub data: Vec<MovieSummary>,
}

/// Full record from GET /movies/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct MovieDetail {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    #[allow(dead_code)] // Not used for scoring
    pub overview: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    #[allow(dead_code)] // Not used for scoring
    pub backdrop_url: String,
}

impl From<MovieDetail> for CandidateItem {
    fn from(detail: MovieDetail) -> Self {
        Self {
            id: detail.id,
            title: detail.title,
            release_date: detail.release_date,
            genres: detail.genres,
            popularity: detail.popularity.max(0.0),
            poster_url: detail.poster_url,
            language: detail.language,
            duration: detail.duration,
        }
    }
}

impl From<MovieSummary> for CandidateItem {
    /// Degraded candidate used when the detail lookup fails
    fn from(summary: MovieSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            release_date: summary.release_date,
            genres: Vec::new(),
            popularity: summary.popularity.max(0.0),
            poster_url: summary.poster_url,
            language: String::new(),
            duration: 0,
        }
    }
}
