use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use redis::{aio::ConnectionManager, Client};

/// Shared registry of invalidated credentials and revocation rules.
///
/// Keys are derived from token fingerprints or user/service ids, never from
/// raw tokens. An entry disappears once its expiry has passed.
#[async_trait]
pub trait InvalidationStore: Send + Sync {
    async fn put(
        &self,
        key: &str,
        value: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), anyhow::Error>;
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error>;
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

#[derive(Clone)]
pub struct RedisInvalidationStore {
    _client: Client,
    manager: ConnectionManager,
}

impl RedisInvalidationStore {
    pub async fn new(config: &crate::config::RedisConfig) -> Result<Self, anyhow::Error> {
        tracing::info!(url = %config.url, "Connecting to Redis");
        let client = Client::open(config.url.clone())?;

        // ConnectionManager reconnects on its own
        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis");

        Ok(Self {
            _client: client,
            manager,
        })
    }

    fn namespaced(key: &str) -> String {
        format!("apiml:invalidated:{}", key)
    }
}

#[async_trait]
impl InvalidationStore for RedisInvalidationStore {
    async fn put(
        &self,
        key: &str,
        value: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), anyhow::Error> {
        let ttl_seconds = (expires_at - Utc::now()).num_seconds();
        if ttl_seconds <= 0 {
            return Ok(());
        }

        let mut conn = self.manager.clone();
        redis::cmd("SET")
            .arg(Self::namespaced(key))
            .arg(value)
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to store invalidation entry: {}", e))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("GET")
            .arg(Self::namespaced(key))
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read invalidation entry: {}", e))
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))
    }
}

/// Process-local store used when no Redis is configured, and in tests.
#[derive(Debug, Default)]
pub struct InMemoryInvalidationStore {
    entries: DashMap<String, (String, DateTime<Utc>)>,
}

impl InMemoryInvalidationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl InvalidationStore for InMemoryInvalidationStore {
    async fn put(
        &self,
        key: &str,
        value: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), anyhow::Error> {
        let now = Utc::now();
        self.entries.retain(|_, (_, expiry)| *expiry > now);
        if expires_at <= now {
            return Ok(());
        }
        self.entries
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let now = Utc::now();
        let value = match self.entries.get(key) {
            Some(entry) if entry.1 > now => Some(entry.0.clone()),
            Some(_) => None,
            None => return Ok(None),
        };

        if value.is_none() {
            self.entries.remove_if(key, |_, (_, expires_at)| *expires_at <= now);
        }
        Ok(value)
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}
