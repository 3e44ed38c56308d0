use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    db::{CacheKey, CacheStore, RuleStore, SnapshotEntry, SnapshotStore},
    error::AppResult,
    models::{RecommendationResponse, RecommendationSnapshot, ScoringRule, UserPreferenceProfile},
    services::{
        providers::{CatalogProvider, PreferenceProvider},
        scoring,
        snapshot_writer::SnapshotWriter,
    },
};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 50;

/// Maps a requested result count onto 1..=50, falling back to 10
pub fn normalize_limit(requested: Option<i64>) -> usize {
    match requested {
        Some(n) if n >= 1 && n <= MAX_LIMIT as i64 => n as usize,
        _ => DEFAULT_LIMIT,
    }
}

/// Tunables of the recommendation pass
#[derive(Debug, Clone)]
pub struct RecommendationSettings {
    /// Catalog pages fetched per pass
    pub prefetch_pages: u32,
    /// TTL of cached responses, in seconds
    pub cache_ttl_secs: u64,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            prefetch_pages: 3,
            cache_ttl_secs: 600,
        }
    }
}

/// Builds personalized recommendations from preferences, the catalog and the
/// active scoring rules
pub struct RecommendationService {
    preferences: Arc<dyn PreferenceProvider>,
    catalog: Arc<dyn CatalogProvider>,
    rules: Arc<dyn RuleStore>,
    snapshots: Arc<dyn SnapshotStore>,
    cache: Arc<dyn CacheStore>,
    snapshot_writer: SnapshotWriter,
    settings: RecommendationSettings,
}

impl RecommendationService {
    pub fn new(
        preferences: Arc<dyn PreferenceProvider>,
        catalog: Arc<dyn CatalogProvider>,
        rules: Arc<dyn RuleStore>,
        snapshots: Arc<dyn SnapshotStore>,
        cache: Arc<dyn CacheStore>,
        snapshot_writer: SnapshotWriter,
        settings: RecommendationSettings,
    ) -> Self {
        Self {
            preferences,
            catalog,
            rules,
            snapshots,
            cache,
            snapshot_writer,
            settings,
        }
    }

    /// Generates the top `limit` recommendations for `user_id`
    ///
    /// 1. Serve from cache when a response for (user, limit) is present
    /// 2. Fetch preferences and the candidate pool concurrently
    /// 3. Score with the active rules, rank and truncate
    /// 4. Cache the response and queue the snapshot replacement
    ///
    /// Only a catalog failure or a rule store failure produces an error.
    pub async fn get_recommendations(
        &self,
        user_id: i64,
        limit: usize,
    ) -> AppResult<RecommendationResponse> {
        let start = Instant::now();
        let cache_key = CacheKey::Recommendations { user_id, limit };

        if let Some(cached) = self.cached_response(&cache_key).await {
            tracing::debug!(user_id, limit, "Recommendations cache hit");
            return Ok(cached);
        }

        let (profile, pool) = tokio::join!(
            self.preferences.fetch_preferences(user_id),
            self.catalog.fetch_pool(self.settings.prefetch_pages),
        );

        let profile = profile.unwrap_or_else(|e| {
            tracing::warn!(
                user_id,
                error = %e,
                "Could not fetch user preferences, using defaults"
            );
            UserPreferenceProfile::empty(user_id)
        });

        let pool = pool.map_err(|e| {
            tracing::error!(user_id, error = %e, "Failed to fetch candidate pool");
            e
        })?;

        if pool.is_empty() {
            tracing::info!(user_id, "Candidate pool is empty");
            return Ok(RecommendationResponse {
                user_id,
                recommendations: Vec::new(),
                generated_at: Utc::now(),
            });
        }

        let rules = self.rules.list_active_rules().await?;
        let scored = scoring::score_candidates(&pool, &profile, &rules, Utc::now().date_naive());
        let recommendations = scoring::rank(scored, limit);

        let response = RecommendationResponse {
            user_id,
            recommendations,
            generated_at: Utc::now(),
        };

        match serde_json::to_string(&response) {
            Ok(json) => self
                .cache
                .set_in_background(&cache_key, json, self.settings.cache_ttl_secs),
            Err(e) => tracing::error!(error = %e, "Cache serialization error"),
        }

        let entries = response
            .recommendations
            .iter()
            .map(|r| SnapshotEntry {
                item_id: r.item_id,
                score: r.score,
            })
            .collect();
        self.snapshot_writer.submit(user_id, entries);

        tracing::info!(
            user_id,
            limit,
            candidates = pool.len(),
            returned = response.recommendations.len(),
            processing_time_ms = start.elapsed().as_millis(),
            "Recommendations generated"
        );

        Ok(response)
    }

    /// Returns the active scoring rules
    pub async fn get_rules(&self) -> AppResult<Vec<ScoringRule>> {
        self.rules.list_active_rules().await
    }

    /// Returns the last persisted scores for `user_id`, highest first
    pub async fn get_snapshots(
        &self,
        user_id: i64,
        limit: usize,
    ) -> AppResult<Vec<RecommendationSnapshot>> {
        self.snapshots.list_snapshots(user_id, limit as i64).await
    }

    /// Cache lookup that treats an unavailable cache or a corrupt entry as a miss
    async fn cached_response(&self, key: &CacheKey) -> Option<RecommendationResponse> {
        let raw = match self.cache.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, recomputing");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }
}
