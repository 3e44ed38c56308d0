use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{RuleType, ScoringRule},
};

/// Source of the scoring rules applied on every recommendation pass
///
/// Rules are read fresh on each call; implementations must not cache them.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RuleStore: Send + Sync {
    /// Lists the currently active rules, ordered by rule type then id
    async fn list_active_rules(&self) -> AppResult<Vec<ScoringRule>>;
}

#[derive(sqlx::FromRow)]
struct RuleRow {
    id: i64,
    name: String,
    weight: f64,
    rule_type: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl RuleRow {
    fn into_rule(self) -> Option<ScoringRule> {
        match self.rule_type.parse::<RuleType>() {
            Ok(rule_type) => Some(ScoringRule {
                id: self.id,
                name: self.name,
                rule_type,
                weight: self.weight,
                active: self.is_active,
                created_at: self.created_at,
            }),
            Err(e) => {
                tracing::warn!(rule_id = self.id, error = %e, "Skipping rule with unknown type");
                None
            }
        }
    }
}

/// Rule store backed by the `recommendation_rules` table
#[derive(Clone)]
pub struct PgRuleStore {
    pool: PgPool,
}

impl PgRuleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RuleStore for PgRuleStore {
    async fn list_active_rules(&self) -> AppResult<Vec<ScoringRule>> {
        let rows: Vec<RuleRow> = sqlx::query_as(
            r#"
            SELECT id, name, weight, rule_type, is_active, created_at
            FROM recommendation_rules
            WHERE is_active = TRUE
            ORDER BY rule_type, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let rules: Vec<ScoringRule> = rows.into_iter().filter_map(RuleRow::into_rule).collect();
        tracing::debug!(count = rules.len(), "Loaded active scoring rules");

        Ok(rules)
    }
}
