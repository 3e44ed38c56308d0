#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use recommendation_api::{
    api::{create_router, AppState},
    db::{CacheKey, CacheStore, RuleStore, SnapshotEntry, SnapshotStore},
    error::AppResult,
    models::{RecommendationSnapshot, RuleType, ScoringRule},
    services::{
        providers::{build_http_client, CatalogClient, PreferenceClient},
        RecommendationService, RecommendationSettings, SnapshotWriter,
    },
};

// ============================================================================
// In-memory stores
// ============================================================================

#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, String>>,
    pub writes: AtomicUsize,
}

#[async_trait::async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<String>> {
        Ok(self.entries.lock().unwrap().get(&key.to_string()).cloned())
    }

    fn set_in_background(&self, key: &CacheKey, value: String, _ttl: u64) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().unwrap().insert(key.to_string(), value);
    }
}

pub struct StaticRules(pub Vec<ScoringRule>);

impl StaticRules {
    pub fn defaults() -> Self {
        let rule = |id, name: &str, rule_type, weight| ScoringRule {
            id,
            name: name.to_string(),
            rule_type,
            weight,
            active: true,
            created_at: Utc::now(),
        };
        Self(vec![
            rule(1, "Popularity Score", RuleType::Popularity, 0.4),
            rule(2, "Recency Bonus", RuleType::Recency, 0.3),
            rule(3, "Genre Match", RuleType::GenreMatch, 0.3),
        ])
    }
}

#[async_trait::async_trait]
impl RuleStore for StaticRules {
    async fn list_active_rules(&self) -> AppResult<Vec<ScoringRule>> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct InMemorySnapshots {
    rows: Mutex<HashMap<i64, Vec<SnapshotEntry>>>,
}

#[async_trait::async_trait]
impl SnapshotStore for InMemorySnapshots {
    async fn replace_snapshots(&self, user_id: i64, entries: &[SnapshotEntry]) -> AppResult<()> {
        self.rows.lock().unwrap().insert(user_id, entries.to_vec());
        Ok(())
    }

    async fn list_snapshots(
        &self,
        user_id: i64,
        limit: i64,
    ) -> AppResult<Vec<RecommendationSnapshot>> {
        let rows = self.rows.lock().unwrap();
        let mut snapshots: Vec<RecommendationSnapshot> = rows
            .get(&user_id)
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| RecommendationSnapshot {
                        user_id,
                        item_id: e.item_id,
                        score: e.score,
                        generated_at: Utc::now(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        snapshots.sort_by(|a, b| b.score.total_cmp(&a.score));
        snapshots.truncate(limit as usize);
        Ok(snapshots)
    }
}

// ============================================================================
// Fake upstream services
// ============================================================================

/// Serves `router` on an ephemeral local port and returns its base URL
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn days_ago(days: i64) -> String {
    (Utc::now().date_naive() - Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

pub fn movie(id: i64, popularity: f64, release_date: &str, genres: &[&str]) -> Value {
    json!({
        "id": id,
        "title": format!("Movie {}", id),
        "overview": "",
        "release_date": release_date,
        "genres": genres,
        "language": "en",
        "duration": 110,
        "popularity": popularity,
        "poster_url": format!("/posters/{}.jpg", id),
        "backdrop_url": ""
    })
}

#[derive(Clone, Default)]
pub struct CatalogState {
    pub movies: Vec<Value>,
    pub list_status: Option<u16>,
    pub broken_details: HashSet<i64>,
    /// Delay applied to each detail response
    pub detail_delay_ms: u64,
    pub list_hits: Arc<AtomicUsize>,
    pub detail_hits: Arc<AtomicUsize>,
    pub in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl CatalogState {
    pub fn with_movies(movies: Vec<Value>) -> Self {
        Self {
            movies,
            ..Self::default()
        }
    }
}

async fn list_movies(
    State(state): State<CatalogState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.list_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(status) = state.list_status {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, "catalog unavailable").into_response();
    }

    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let page_size: usize = params
        .get("page_size")
        .and_then(|p| p.parse().ok())
        .unwrap_or(20);
    let total = state.movies.len();
    let total_pages = total.div_ceil(page_size);

    let data: Vec<Value> = state
        .movies
        .iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .map(|m| {
            json!({
                "id": m["id"],
                "title": m["title"],
                "release_date": m["release_date"],
                "popularity": m["popularity"],
                "poster_url": m["poster_url"]
            })
        })
        .collect();

    Json(json!({
        "page": page,
        "page_size": page_size,
        "total_pages": total_pages,
        "total_results": total,
        "data": data
    }))
    .into_response()
}

async fn movie_detail(State(state): State<CatalogState>, Path(id): Path<i64>) -> Response {
    state.detail_hits.fetch_add(1, Ordering::SeqCst);
    let current = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_in_flight.fetch_max(current, Ordering::SeqCst);

    if state.detail_delay_ms > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(state.detail_delay_ms)).await;
    }

    let response = if state.broken_details.contains(&id) {
        (StatusCode::INTERNAL_SERVER_ERROR, "detail unavailable").into_response()
    } else {
        match state.movies.iter().find(|m| m["id"] == id) {
            Some(m) => Json(m.clone()).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        }
    };

    state.in_flight.fetch_sub(1, Ordering::SeqCst);
    response
}

pub async fn spawn_catalog(state: CatalogState) -> String {
    let router = Router::new()
        .route("/movies", get(list_movies))
        .route("/movies/:id", get(movie_detail))
        .with_state(state);
    serve(router).await
}

#[derive(Clone, Default)]
pub struct PreferenceState {
    pub genres: Vec<String>,
    pub status: Option<u16>,
    /// Serve a body that is not a preference profile
    pub malformed: bool,
    pub hits: Arc<AtomicUsize>,
}

async fn user_preferences(State(state): State<PreferenceState>, Path(id): Path<i64>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if let Some(status) = state.status {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, "preferences unavailable").into_response();
    }
    if state.malformed {
        return Json(json!({ "unexpected": true })).into_response();
    }

    Json(json!({
        "user_id": id,
        "preferred_genres": state.genres,
        "preferred_language": "en",
        "min_rating": 6.5
    }))
    .into_response()
}

pub async fn spawn_preferences(state: PreferenceState) -> String {
    let router = Router::new()
        .route("/users/:id/preferences", get(user_preferences))
        .with_state(state);
    serve(router).await
}

// ============================================================================
// Application under test
// ============================================================================

pub struct TestApp {
    pub router: Router,
    pub cache: Arc<InMemoryCache>,
    pub snapshots: Arc<InMemorySnapshots>,
}

pub fn build_app(catalog_url: &str, preferences_url: &str) -> TestApp {
    let cache = Arc::new(InMemoryCache::default());
    let snapshots = Arc::new(InMemorySnapshots::default());
    let router = build_router(catalog_url, preferences_url, cache.clone(), snapshots.clone());

    TestApp {
        router,
        cache,
        snapshots,
    }
}

/// Wires the real upstream clients around the given cache and snapshot store
pub fn build_router(
    catalog_url: &str,
    preferences_url: &str,
    cache: Arc<dyn CacheStore>,
    snapshots: Arc<InMemorySnapshots>,
) -> Router {
    let http_client = build_http_client(std::time::Duration::from_secs(5)).unwrap();
    let (writer, _handle) = SnapshotWriter::spawn(snapshots.clone());

    let service = RecommendationService::new(
        Arc::new(PreferenceClient::new(http_client.clone(), preferences_url)),
        Arc::new(CatalogClient::new(http_client, catalog_url, 20, 8)),
        Arc::new(StaticRules::defaults()),
        snapshots,
        cache,
        writer,
        RecommendationSettings::default(),
    );

    create_router(AppState::new(Arc::new(service)))
}

/// Accepts TCP connections and holds them open without ever replying
pub async fn spawn_silent_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("{}", addr)
}
