use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

use crate::models::{
    CandidateItem, RuleType, ScoredRecommendation, ScoringRule, UserPreferenceProfile,
};

/// Days over which the recency score decays linearly from 1 to 0
pub const RECENCY_WINDOW_DAYS: f64 = 730.0;

/// Component value above which popularity and recency are called out in the reason
const HIGHLIGHT_THRESHOLD: f64 = 0.7;

const REASON_POPULAR: &str = "highly popular";
const REASON_RECENT: &str = "recently released";
const REASON_GENRE: &str = "matches your preferred genres";
const REASON_DEFAULT: &str = "recommended for you";

/// Weight per rule type. When a type appears more than once the last rule wins.
fn rule_weights(rules: &[ScoringRule]) -> HashMap<RuleType, f64> {
    rules.iter().map(|r| (r.rule_type, r.weight)).collect()
}

/// Popularity of the most popular candidate, or 1 when every popularity is 0
pub fn popularity_normalizer(pool: &[CandidateItem]) -> f64 {
    let max = pool.iter().map(|c| c.popularity).fold(0.0_f64, f64::max);
    if max > 0.0 {
        max
    } else {
        1.0
    }
}

/// Linear decay from 1.0 on release day to 0.0 after two years
///
/// Unparseable or empty dates score 0. Future releases count as released today.
pub fn recency_score(release_date: &str, today: NaiveDate) -> f64 {
    let Ok(released) = NaiveDate::parse_from_str(release_date, "%Y-%m-%d") else {
        return 0.0;
    };

    let days = (today - released).num_days().max(0) as f64;
    (1.0 - days / RECENCY_WINDOW_DAYS).max(0.0)
}

/// Fraction of the candidate's genres found in `preferred` (lowercased)
pub fn genre_match_score(genres: &[String], preferred: &HashSet<String>) -> f64 {
    if genres.is_empty() {
        return 0.0;
    }

    let matches = genres
        .iter()
        .filter(|g| preferred.contains(&g.trim().to_lowercase()))
        .count();

    matches as f64 / genres.len() as f64
}

/// Rounds to 4 decimal places, halves away from zero
///
/// Negative zero is returned as zero so that it ties with other zero scores.
pub fn round_score(score: f64) -> f64 {
    let rounded = (score * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Scores every candidate against the profile and the active rules
///
/// Output order matches `pool`. The function is pure: identical inputs yield
/// identical scores and reasons.
pub fn score_candidates(
    pool: &[CandidateItem],
    profile: &UserPreferenceProfile,
    rules: &[ScoringRule],
    today: NaiveDate,
) -> Vec<ScoredRecommendation> {
    let weights = rule_weights(rules);
    let max_popularity = popularity_normalizer(pool);
    let preferred = profile.genre_set();

    pool.iter()
        .map(|candidate| {
            let mut total = 0.0;
            let mut reasons: Vec<&str> = Vec::new();

            if let Some(w) = weights.get(&RuleType::Popularity) {
                let popularity = candidate.popularity / max_popularity;
                total += popularity * w;
                if popularity > HIGHLIGHT_THRESHOLD {
                    reasons.push(REASON_POPULAR);
                }
            }

            if let Some(w) = weights.get(&RuleType::Recency) {
                let recency = recency_score(&candidate.release_date, today);
                total += recency * w;
                if recency > HIGHLIGHT_THRESHOLD {
                    reasons.push(REASON_RECENT);
                }
            }

            if let Some(w) = weights.get(&RuleType::GenreMatch) {
                if !preferred.is_empty() {
                    let genre = genre_match_score(&candidate.genres, &preferred);
                    total += genre * w;
                    if genre > 0.0 {
                        reasons.push(REASON_GENRE);
                    }
                }
            }

            let reason = if reasons.is_empty() {
                REASON_DEFAULT.to_string()
            } else {
                reasons.join(", ")
            };

            ScoredRecommendation {
                item_id: candidate.id,
                title: candidate.title.clone(),
                release_date: candidate.release_date.clone(),
                genres: candidate.genres.clone(),
                popularity: candidate.popularity,
                poster_url: candidate.poster_url.clone(),
                score: round_score(total),
                reason,
            }
        })
        .collect()
}

/// Sorts by score descending and keeps the first `limit`
///
/// The sort is stable, so equal scores keep their pool order.
pub fn rank(mut scored: Vec<ScoredRecommendation>, limit: usize) -> Vec<ScoredRecommendation> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);
    scored
}
