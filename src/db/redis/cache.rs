use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Recommendations { user_id: i64, limit: usize },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Recommendations { user_id, limit } => {
                write!(f, "recommendations:{}:{}", user_id, limit)
            }
        }
    }
}

/// Key-value cache for serialized responses
///
/// The cache is never authoritative: callers treat read errors as misses and
/// writes are fire-and-forget.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the raw cached value for `key`, if present
    async fn get(&self, key: &CacheKey) -> AppResult<Option<String>>;

    /// Queues a write of `value` under `key` with a TTL in seconds
    fn set_in_background(&self, key: &CacheKey, value: String, ttl: u64);
}

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Runs one Redis round trip, giving up once `timeout` has elapsed
async fn with_timeout<T, F>(timeout: Duration, op: &'static str, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| AppError::Internal(format!("cache {} timed out after {:?}", op, timeout)))?
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Redis-backed cache whose writes are performed by a background task
///
/// Every read and write, connection setup included, is bounded by `timeout`.
#[derive(Clone)]
pub struct RedisCache {
    redis_client: Client,
    timeout: Duration,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Signals the writer to stop and waits until queued writes are flushed
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task failed during shutdown");
        }
        tracing::info!("Cache writer stopped");
    }
}

impl RedisCache {
    /// Creates a new cache and spawns its write task
    pub fn new(redis_client: Client, timeout: Duration) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        let task = tokio::spawn(async move {
            Self::cache_writer_task(client, timeout, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            redis_client,
            timeout,
            write_tx,
        };

        (cache, CacheWriterHandle { shutdown_tx, task })
    }

    /// Drains write messages into Redis until shutdown, then flushes what is queued
    async fn cache_writer_task(
        client: Client,
        timeout: Duration,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                msg = write_rx.recv() => match msg {
                    Some(msg) => {
                        if let Err(e) = Self::write_to_redis(&client, timeout, msg).await {
                            tracing::warn!(error = %e, "Failed to write to Redis cache");
                        }
                    }
                    None => break,
                },
                Some(()) = shutdown_rx.recv() => {
                    let mut flushed = 0usize;
                    while let Ok(msg) = write_rx.try_recv() {
                        if let Err(e) = Self::write_to_redis(&client, timeout, msg).await {
                            tracing::warn!(error = %e, "Failed to flush cache write during shutdown");
                        }
                        flushed += 1;
                    }
                    tracing::info!(flushed, "Cache writer flushed pending writes");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(
        client: &Client,
        timeout: Duration,
        msg: CacheWriteMessage,
    ) -> AppResult<()> {
        with_timeout(timeout, "write", async move {
            let mut conn = client.get_multiplexed_async_connection().await?;
            let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
            Ok::<_, AppError>(())
        })
        .await
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<String>> {
        let key = key.to_string();
        with_timeout(self.timeout, "read", async {
            let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
            let cached: Option<String> = conn.get(key).await?;
            Ok::<_, AppError>(cached)
        })
        .await
    }

    fn set_in_background(&self, key: &CacheKey, value: String, ttl: u64) {
        let msg = CacheWriteMessage {
            key: key.to_string(),
            value,
            ttl,
        };

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}
