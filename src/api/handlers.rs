use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{RecommendationResponse, RecommendationSnapshot, ScoringRule},
    services::normalize_limit,
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    /// Raw value so that malformed limits fall back to the default instead of
    /// rejecting the request
    pub limit: Option<String>,
}

impl LimitQuery {
    fn limit(&self) -> usize {
        normalize_limit(self.limit.as_deref().and_then(|l| l.trim().parse().ok()))
    }
}

#[derive(Debug, Serialize)]
pub struct RulesResponse {
    pub rules: Vec<ScoringRule>,
}

#[derive(Debug, Serialize)]
pub struct SnapshotsResponse {
    pub user_id: i64,
    pub snapshots: Vec<RecommendationSnapshot>,
}

/// Parses a path user ID, which must be a positive integer
fn parse_user_id(raw: &str) -> AppResult<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::InvalidInput("invalid user ID".to_string())),
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "healthy", "service": "recommendation-api" })),
    )
}

/// Personalized recommendations for one user
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let user_id = parse_user_id(&user_id)?;
    let limit = params.limit();

    tracing::info!(
        request_id = %request_id,
        user_id,
        limit,
        "Processing recommendation request"
    );

    let response = state
        .recommendations
        .get_recommendations(user_id, limit)
        .await
        .map_err(|e| {
            tracing::error!(
                request_id = %request_id,
                user_id,
                error = %e,
                "Failed to generate recommendations"
            );
            e
        })?;

    Ok(Json(response))
}

/// Active scoring rules
pub async fn get_rules(State(state): State<AppState>) -> AppResult<Json<RulesResponse>> {
    let rules = state.recommendations.get_rules().await?;
    Ok(Json(RulesResponse { rules }))
}

/// Last persisted recommendation scores for one user
pub async fn get_snapshots(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<SnapshotsResponse>> {
    let user_id = parse_user_id(&user_id)?;
    let snapshots = state
        .recommendations
        .get_snapshots(user_id, params.limit())
        .await?;

    Ok(Json(SnapshotsResponse { user_id, snapshots }))
}
