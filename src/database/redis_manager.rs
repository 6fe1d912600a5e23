use std::sync::Arc;
use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};
use tracing::info;
use crate::config::environment::EnvironmentVariables;
use crate::database::store::TokenCache;

/// Redis-backed cache of `token -> user id` lookups.
/// Holds one managed connection that reconnects on its own.
#[derive(Clone)]
pub struct RedisService {
    connection: ConnectionManager,
    ttl_seconds: u64,
}

impl RedisService {
    /// Returns `None` when no `REDIS_URL` is configured
    pub async fn connect(env: Arc<EnvironmentVariables>) -> Result<Option<Self>> {
        let Some(url) = env.redis_url.as_deref() else {
            info!("REDIS_URL not set, token cache disabled");
            return Ok(None);
        };

        let client: Client = Client::open(url)
            .context("Failed to create Redis client")?;
        let mut connection: ConnectionManager = ConnectionManager::new(client).await
            .context("Failed to connect to Redis")?;

        // Simple ping to verify connection
        let _: () = redis::cmd("PING").query_async(&mut connection).await
            .context("Failed to ping Redis")?;

        info!("Redis connection established successfully");
        Ok(Some(Self { connection, ttl_seconds: env.token_cache_ttl_seconds }))
    }

    fn token_key(token: &str) -> String {
        format!("token:{}", token)
    }
}

#[async_trait]
impl TokenCache for RedisService {
    async fn cached_user_id(&self, token: &str) -> Result<Option<i64>> {
        let mut conn: ConnectionManager = self.connection.clone();

        let user_id: Option<i64> = redis::cmd("GET")
            .arg(Self::token_key(token))
            .query_async(&mut conn)
            .await
            .context("Failed to read token from Redis")?;

        Ok(user_id)
    }

    /// Caches a validated token with the configured expiration
    async fn cache_token(&self, token: &str, user_id: i64) -> Result<()> {
        let mut conn: ConnectionManager = self.connection.clone();

        let _: () = redis::cmd("SET")
            .arg(Self::token_key(token))
            .arg(user_id)
            .arg("EX")
            .arg(self.ttl_seconds)
            .query_async(&mut conn)
            .await
            .context("Failed to cache token in Redis")?;

        Ok(())
    }

    async fn shutdown(&self) {
        // The managed connection closes when the last clone is dropped
        info!("Redis service shutdown (noop)");
    }
}
