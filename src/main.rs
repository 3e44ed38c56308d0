use std::sync::Arc;

use recommendation_api::{
    api::{create_router, AppState},
    config::Config,
    db::{self, PgRuleStore, PgSnapshotStore, RedisCache},
    services::{
        providers::{build_http_client, CatalogClient, PreferenceClient},
        RecommendationService, RecommendationSettings, SnapshotWriter,
    },
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,recommendation_api=debug")),
        )
        .init();

    let config = Config::from_env()?;

    let db_pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&db_pool).await?;
    tracing::info!("Connected to PostgreSQL");

    let redis_client = db::create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = RedisCache::new(redis_client, config.cache_timeout());

    let http_client = build_http_client(config.upstream_timeout())?;
    let preferences = PreferenceClient::new(http_client.clone(), &config.user_preference_service_url);
    let catalog = CatalogClient::new(
        http_client,
        &config.movie_service_url,
        config.catalog_page_size,
        config.detail_fetch_concurrency,
    );

    let snapshot_store = Arc::new(PgSnapshotStore::new(db_pool.clone()));
    let (snapshot_writer, snapshot_writer_handle) = SnapshotWriter::spawn(snapshot_store.clone());

    let service = RecommendationService::new(
        Arc::new(preferences),
        Arc::new(catalog),
        Arc::new(PgRuleStore::new(db_pool.clone())),
        snapshot_store,
        Arc::new(cache),
        snapshot_writer,
        RecommendationSettings {
            prefetch_pages: config.catalog_prefetch_pages,
            cache_ttl_secs: config.cache_ttl_secs,
        },
    );

    let app = create_router(AppState::new(Arc::new(service)));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "recommendation-api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down, flushing background writers");
    snapshot_writer_handle.shutdown().await;
    cache_writer.shutdown().await;
    db_pool.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
