pub mod memory_store;
pub mod pg_store;
pub mod postgres_service;
pub mod redis_manager;
pub mod store;

pub use memory_store::MemoryStore;
pub use pg_store::PgStore;
pub use postgres_service::DatabaseService;
pub use redis_manager::RedisService;
pub use store::{RecipeStore, StoreError, StoreResult, TokenCache};
