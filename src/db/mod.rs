pub mod postgres;
pub mod redis;
pub mod rules;
pub mod snapshots;

pub use postgres::{create_pool, run_migrations};
pub use redis::{create_redis_client, CacheKey, CacheStore, CacheWriterHandle, RedisCache};
pub use rules::{PgRuleStore, RuleStore};
pub use snapshots::{PgSnapshotStore, SnapshotEntry, SnapshotStore};
