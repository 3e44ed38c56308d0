use sqlx::PgPool;

use crate::{error::AppResult, models::RecommendationSnapshot};

/// Score of one recommended item, as handed to the snapshot store
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotEntry {
    pub item_id: i64,
    pub score: f64,
}

/// Durable record of the last scores computed for each user
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Replaces every snapshot row of `user_id` with `entries`
    async fn replace_snapshots(&self, user_id: i64, entries: &[SnapshotEntry]) -> AppResult<()>;

    /// Returns the user's snapshots, highest score first
    async fn list_snapshots(&self, user_id: i64, limit: i64)
        -> AppResult<Vec<RecommendationSnapshot>>;
}

/// Snapshot store backed by the `user_recommendation_snapshots` table
#[derive(Clone)]
pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SnapshotStore for PgSnapshotStore {
    // The delete and the upserts run as separate statements. A crash part way
    // through leaves the user with a partial or empty snapshot set until the
    // next successful generation.
    async fn replace_snapshots(&self, user_id: i64, entries: &[SnapshotEntry]) -> AppResult<()> {
        sqlx::query("DELETE FROM user_recommendation_snapshots WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO user_recommendation_snapshots (user_id, movie_id, score, generated_at)
                VALUES ($1, $2, $3, NOW())
                ON CONFLICT (user_id, movie_id)
                DO UPDATE SET score = EXCLUDED.score, generated_at = NOW()
                "#,
            )
            .bind(user_id)
            .bind(entry.item_id)
            .bind(entry.score)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    async fn list_snapshots(
        &self,
        user_id: i64,
        limit: i64,
    ) -> AppResult<Vec<RecommendationSnapshot>> {
        let snapshots = sqlx::query_as::<_, RecommendationSnapshot>(
            r#"
            SELECT user_id, movie_id, score, generated_at
            FROM user_recommendation_snapshots
            WHERE user_id = $1
            ORDER BY score DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(snapshots)
    }
}
