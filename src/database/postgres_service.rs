// =============================================================================
// DATABASE SERVICE - PostgreSQL pool lifecycle
// =============================================================================

use std::sync::Arc;
use std::time::Duration;
use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use tokio::sync::OnceCell;
use tracing::{debug, info, log::LevelFilter, warn};

use crate::config::environment::EnvironmentVariables;

// =============================================================================
// SQL CONSTANTS
// =============================================================================

/// Single initialization SQL script
const INIT_SCHEMA_SQL: &str = include_str!("sql/schemas/schema_init.sql");

// =============================================================================
// DATABASE SERVICE
// =============================================================================

/// Database service managing the single PostgreSQL connection pool.
#[derive(Clone, Debug)]
pub struct DatabaseService {
    /// Connection pool, created by `initialize()`
    pool: Arc<OnceCell<PgPool>>,
    /// Environment configuration
    config: Arc<EnvironmentVariables>,
}

impl DatabaseService {
    /// Creates a new DatabaseService instance.
    /// Note: The pool is not initialized until `initialize()` is called.
    pub fn new(config: Arc<EnvironmentVariables>) -> Self {
        Self {
            pool: Arc::new(OnceCell::new()),
            config,
        }
    }

    /// Waits for the database, creates the pool and applies the schema.
    pub async fn initialize(&self) -> Result<()> {
        info!("Initializing DatabaseService...");

        let pool: &PgPool = self.pool.get_or_try_init(|| async {
            self.connect_with_retry().await
        }).await?;

        self.initialize_schema(pool).await?;

        info!("DatabaseService initialized successfully");
        Ok(())
    }

    /// Gracefully shuts down the service.
    pub async fn shutdown(&self) {
        info!("Initiating DatabaseService shutdown...");
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            info!("Database connection pool closed");
        } else {
            debug!("Database pool was not initialized, nothing to close");
        }
    }

    /// Returns the connection pool.
    /// Errors if the pool has not been initialized.
    pub fn get_pool(&self) -> Result<&PgPool> {
        self.pool.get().ok_or_else(|| anyhow::anyhow!("Database pool not initialized"))
    }
}

// =============================================================================
// INTERNAL HELPERS
// =============================================================================

impl DatabaseService {
    /// Retries pool creation so the service can start before the database accepts connections
    async fn connect_with_retry(&self) -> Result<PgPool> {
        let attempts: u32 = self.config.db_connect_retries.max(1);
        let delay: Duration = Duration::from_millis(self.config.db_connect_delay_ms);

        let mut attempt: u32 = 1;
        loop {
            match self.create_pool().await {
                Ok(pool) => {
                    info!("Database available after {} attempt(s)", attempt);
                    return Ok(pool);
                }
                Err(e) if attempt < attempts => {
                    warn!("Database unavailable (attempt {}/{}): {:#}", attempt, attempts, e);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e).context(format!("Database still unavailable after {attempts} attempts"));
                }
            }
        }
    }

    /// Creates the connection pool based on environment config
    async fn create_pool(&self) -> Result<PgPool> {
        let connect_options: PgConnectOptions = self.create_connect_options();

        let pool: PgPool = PgPoolOptions::new()
            .max_connections(self.config.db_max_connections)
            .min_connections(1)
            .idle_timeout(Duration::from_secs(30))
            .connect_with(connect_options)
            .await
            .context("Failed to create database connection pool")?;

        Ok(pool)
    }

    /// Creates connection options with SSL and UTC timezone
    fn create_connect_options(&self) -> PgConnectOptions {
        let mut options: PgConnectOptions = PgConnectOptions::new()
            .host(&self.config.db_host)
            .port(self.config.db_port)
            .username(&self.config.db_user)
            .password(&self.config.db_password)
            .database(&self.config.db_name)
            .log_statements(LevelFilter::Debug);

        // Always use UTC and standard app name
        options = options.options([
            ("timezone", "UTC"),
            ("application_name", "recipe-api"),
        ]);

        // Configure SSL based on environment
        if self.config.is_development() {
            options = options.ssl_mode(sqlx::postgres::PgSslMode::Prefer);
        } else {
            options = options.ssl_mode(sqlx::postgres::PgSslMode::Require);
        }

        options
    }

    /// Runs the initialization SQL
    async fn initialize_schema(&self, pool: &PgPool) -> Result<()> {
        info!("Executing schema initialization...");

        sqlx::raw_sql(INIT_SCHEMA_SQL)
            .execute(pool)
            .await
            .context("Failed to execute schema initialization SQL")?;

        info!("Schema initialization completed");
        Ok(())
    }
}
