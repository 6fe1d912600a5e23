// Application state shared by every handler

use std::sync::Arc;
use anyhow::Result;
use tracing::{info, warn};

use crate::config::environment::{EnvironmentVariables, StorageBackend};
use crate::core::accounts::ensure_superuser;
use crate::core::media::MediaStorage;
use crate::database::{DatabaseService, MemoryStore, PgStore, RecipeStore, RedisService, TokenCache};

#[derive(Clone)]
pub struct AppState {
    pub environment: Arc<EnvironmentVariables>,
    pub store: Arc<dyn RecipeStore>,
    /// Optional `token -> user id` cache
    pub token_cache: Option<Arc<dyn TokenCache>>,
    pub media: MediaStorage,
}

impl AppState {
    pub fn new(
        environment: Arc<EnvironmentVariables>,
        store: Arc<dyn RecipeStore>,
        token_cache: Option<Arc<dyn TokenCache>>,
    ) -> Self {
        let media: MediaStorage = MediaStorage::new(
            environment.media_root.clone(),
            environment.media_url.to_string(),
        );

        Self {
            environment,
            store,
            token_cache,
            media,
        }
    }

    /// Connects the configured backends and bootstraps the superuser
    pub async fn from_env(environment: Arc<EnvironmentVariables>) -> Result<Self> {
        let store: Arc<dyn RecipeStore> = match environment.storage_backend {
            StorageBackend::Postgres => {
                let database: DatabaseService = DatabaseService::new(environment.clone());
                database.initialize().await?;
                Arc::new(PgStore::new(database))
            }
            StorageBackend::Memory => {
                warn!("Using the in-memory store, data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        // A broken cache must not keep the API down
        let token_cache: Option<Arc<dyn TokenCache>> = match RedisService::connect(environment.clone()).await {
            Ok(Some(redis)) => Some(Arc::new(redis)),
            Ok(None) => None,
            Err(e) => {
                warn!("Redis unavailable, token cache disabled: {:#}", e);
                None
            }
        };

        if let (Some(email), Some(password)) = (
            environment.superuser_email.as_deref(),
            environment.superuser_password.as_deref(),
        ) {
            ensure_superuser(store.as_ref(), email, password, environment.bcrypt_cost).await?;
        }

        info!("Services initialized ({:?} store)", environment.storage_backend);
        Ok(Self::new(environment, store, token_cache))
    }

    /// Gracefully closes backend connections
    pub async fn shutdown(&self) {
        self.store.shutdown().await;
        if let Some(cache) = &self.token_cache {
            cache.shutdown().await;
        }
    }
}
