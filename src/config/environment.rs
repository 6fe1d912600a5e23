// Start of file: /src/config/environment.rs

// * Environment configuration with a lazily loaded singleton
// * and zero-copy defaults.

use std::{borrow::Cow, collections::HashMap, path::PathBuf};
// * anyhow for convenient error handling
use anyhow::{bail, Context, Result};
// * once_cell for lazy static initialization
use once_cell::sync::Lazy;
use tracing::warn;

// ! Default values for environment variables (used if variables aren't set):
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_BODY_SIZE: usize = 2_097_152; // 2MB
const DEFAULT_MAX_UPLOAD_SIZE: usize = 10_485_760; // 10MB
const DEFAULT_TIMEOUT: u64 = 10; // 10 seconds
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432; // Default Postgres port
const DEFAULT_DB_USER: &str = "postgres";
const DEFAULT_DB_PASSWORD: &str = "postgres";
const DEFAULT_DB_NAME: &str = "recipe";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_DB_CONNECT_RETRIES: u32 = 10;
const DEFAULT_DB_CONNECT_DELAY_MS: u64 = 1_000;
const DEFAULT_TOKEN_CACHE_TTL: u64 = 3_600; // 1 hour
const DEFAULT_MEDIA_ROOT: &str = "./media";
const DEFAULT_MEDIA_URL: &str = "/static/media";

/// Which `RecipeStore` adapter backs the running service
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => bail!("Invalid STORAGE_BACKEND '{other}' (expected 'postgres' or 'memory')"),
        }
    }
}

// * A struct containing all environment variables used by the app
#[derive(Clone, Debug)]
pub struct EnvironmentVariables {
    pub environment: Cow<'static, str>,
    pub host: Cow<'static, str>,
    pub port: u16,
    pub max_request_body_size: usize,
    pub max_upload_size: usize,
    pub default_timeout_seconds: u64,
    pub storage_backend: StorageBackend,
    pub db_host: Cow<'static, str>,
    pub db_port: u16,
    pub db_user: Cow<'static, str>,
    pub db_password: Cow<'static, str>,
    pub db_name: Cow<'static, str>,
    pub db_max_connections: u32,
    pub db_connect_retries: u32,
    pub db_connect_delay_ms: u64,
    pub redis_url: Option<String>,
    pub token_cache_ttl_seconds: u64,
    pub media_root: PathBuf,
    pub media_url: Cow<'static, str>,
    pub bcrypt_cost: u32,
    pub superuser_email: Option<String>,
    pub superuser_password: Option<String>,
    pub log_ansi: bool,
}

impl EnvironmentVariables {
    // * Loads environment variables.
    // * Only reads .env if ENVIRONMENT != "production".
    pub fn load() -> Result<Self> {
        // ? In non-production environments, attempt to load .env
        if std::env::var("ENVIRONMENT").unwrap_or_default() != "production" {
            dotenv::dotenv().ok();
        }

        // * Collect all environment vars from the system and .env
        let vars: HashMap<String, String> = std::env::vars().collect();

        Self::from_map(&vars)
    }

    // * Builds the configuration from an explicit key/value map
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        // * A small helper closure to fetch a non-empty variable by key
        let get_var = |key: &str| {
            vars.get(key)
                .map(String::as_str)
                .filter(|value| !value.trim().is_empty())
        };

        Ok(Self {
            environment: get_var("ENVIRONMENT")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing ENVIRONMENT, defaulting to '{DEFAULT_ENVIRONMENT}'");
                    Cow::Borrowed(DEFAULT_ENVIRONMENT)
                }),

            host: get_var("HOST")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_HOST)),

            port: get_var("PORT")
                .map(|s| s.parse().context("Invalid PORT value"))
                .transpose()?
                .unwrap_or(DEFAULT_PORT),

            max_request_body_size: get_var("MAX_REQUEST_BODY_SIZE")
                .map(|s| s.parse().context("Invalid MAX_REQUEST_BODY_SIZE"))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_BODY_SIZE),

            max_upload_size: get_var("MAX_UPLOAD_SIZE")
                .map(|s| s.parse().context("Invalid MAX_UPLOAD_SIZE"))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE),

            default_timeout_seconds: get_var("DEFAULT_TIMEOUT_SECONDS")
                .map(|s| s.parse().context("Invalid DEFAULT_TIMEOUT_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_TIMEOUT),

            storage_backend: get_var("STORAGE_BACKEND")
                .map(StorageBackend::parse)
                .transpose()?
                .unwrap_or(StorageBackend::Postgres),

            db_host: get_var("DB_HOST")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing DB_HOST, defaulting to '{DEFAULT_DB_HOST}'");
                    Cow::Borrowed(DEFAULT_DB_HOST)
                }),

            db_port: get_var("DB_PORT")
                .map(|s| s.parse().context("Invalid DB_PORT"))
                .transpose()?
                .unwrap_or(DEFAULT_DB_PORT),

            db_user: get_var("DB_USER")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing DB_USER, defaulting to '{DEFAULT_DB_USER}'");
                    Cow::Borrowed(DEFAULT_DB_USER)
                }),

            db_password: get_var("DB_PASSWORD")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing DB_PASSWORD, defaulting to '{DEFAULT_DB_PASSWORD}'");
                    Cow::Borrowed(DEFAULT_DB_PASSWORD)
                }),

            db_name: get_var("DB_NAME")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_DB_NAME)),

            db_max_connections: get_var("DB_MAX_CONNECTIONS")
                .map(|s| s.parse().context("Invalid DB_MAX_CONNECTIONS"))
                .transpose()?
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),

            db_connect_retries: get_var("DB_CONNECT_RETRIES")
                .map(|s| s.parse().context("Invalid DB_CONNECT_RETRIES"))
                .transpose()?
                .unwrap_or(DEFAULT_DB_CONNECT_RETRIES),

            db_connect_delay_ms: get_var("DB_CONNECT_DELAY_MS")
                .map(|s| s.parse().context("Invalid DB_CONNECT_DELAY_MS"))
                .transpose()?
                .unwrap_or(DEFAULT_DB_CONNECT_DELAY_MS),

            redis_url: get_var("REDIS_URL").map(str::to_owned),

            token_cache_ttl_seconds: get_var("TOKEN_CACHE_TTL_SECONDS")
                .map(|s| s.parse().context("Invalid TOKEN_CACHE_TTL_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_TOKEN_CACHE_TTL),

            media_root: get_var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_ROOT)),

            media_url: get_var("MEDIA_URL")
                .map(|s| Cow::Owned(s.trim_end_matches('/').to_owned()))
                .unwrap_or(Cow::Borrowed(DEFAULT_MEDIA_URL)),

            bcrypt_cost: get_var("BCRYPT_COST")
                .map(|s| s.parse().context("Invalid BCRYPT_COST"))
                .transpose()?
                .unwrap_or(bcrypt::DEFAULT_COST),

            superuser_email: get_var("SUPERUSER_EMAIL").map(str::to_owned),

            superuser_password: get_var("SUPERUSER_PASSWORD").map(str::to_owned),

            log_ansi: get_var("LOG_ANSI")
                .map(|s| s.parse().context("Invalid LOG_ANSI (expected true/false)"))
                .transpose()?
                .unwrap_or(true),
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    // * Returns a reference to the lazily-initialized environment configuration
    pub fn instance() -> &'static Self {
        static INSTANCE: Lazy<Result<EnvironmentVariables, anyhow::Error>> = Lazy::new(|| {
            let config: EnvironmentVariables = EnvironmentVariables::load()?;

            if cfg!(debug_assertions) {
                tracing::debug!("Loaded environment configuration: {:#?}", config);
            }

            Ok(config)
        });

        // ! Panics if loading fails
        INSTANCE.as_ref().expect("Failed to load environment configuration")
    }
}


// End of file: /src/config/environment.rs
