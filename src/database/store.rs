//! Storage port for users, tokens, tags, ingredients and recipes.
//!
//! Handlers only ever talk to `dyn RecipeStore`; `PgStore` and `MemoryStore`
//! are the two adapters. Every recipe and attribute operation is scoped to
//! the owning user, so another user's rows behave exactly like missing ones.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Attribute, AttributeKind, NewRecipe, NewUser, Recipe, RecipeFilter, RecipeUpdate, User,
    UserChanges,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested entity was not found (or belongs to someone else).
    #[error("Not found: {0}")]
    NotFound(String),

    /// A unique value (such as an email address) is already taken.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Backend failure (database, connection, ...).
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound("row".to_owned()),
            // Postgres unique_violation
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                Self::AlreadyExists(db_err.message().to_owned())
            }
            _ => Self::Storage(err.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RecipeStore: Send + Sync {
    // * Users

    /// Inserts a user; `AlreadyExists` when the email is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Applies the given changes; `NotFound` for an unknown id.
    async fn update_user(&self, id: i64, changes: UserChanges) -> StoreResult<User>;

    // * Tokens

    /// Returns the user's existing token, or stores `candidate` as the new one.
    async fn get_or_create_token(&self, user_id: i64, candidate: &str) -> StoreResult<String>;

    async fn find_user_by_token(&self, token: &str) -> StoreResult<Option<User>>;

    // * Tags and ingredients

    /// The user's attributes ordered by name descending. With `assigned_only`,
    /// only those attached to at least one recipe.
    async fn list_attributes(
        &self,
        kind: AttributeKind,
        user_id: i64,
        assigned_only: bool,
    ) -> StoreResult<Vec<Attribute>>;

    async fn create_attribute(&self, kind: AttributeKind, user_id: i64, name: &str) -> StoreResult<Attribute>;

    /// Finds the user's attribute with this exact name or creates it.
    async fn get_or_create_attribute(
        &self,
        kind: AttributeKind,
        user_id: i64,
        name: &str,
    ) -> StoreResult<Attribute>;

    // * Recipes

    /// The user's recipes, newest id first, each at most once.
    async fn list_recipes(&self, user_id: i64, filter: &RecipeFilter) -> StoreResult<Vec<Recipe>>;

    async fn get_recipe(&self, user_id: i64, id: i64) -> StoreResult<Option<Recipe>>;

    async fn create_recipe(&self, user_id: i64, recipe: NewRecipe) -> StoreResult<Recipe>;

    /// `None` when the recipe does not exist for this user.
    async fn update_recipe(&self, user_id: i64, id: i64, update: RecipeUpdate) -> StoreResult<Option<Recipe>>;

    /// Returns the deleted recipe, `None` when it does not exist for this user.
    async fn delete_recipe(&self, user_id: i64, id: i64) -> StoreResult<Option<Recipe>>;

    /// Replaces the image path; `None` when the recipe does not exist for this user.
    async fn set_recipe_image(&self, user_id: i64, id: i64, image: Option<String>) -> StoreResult<Option<Recipe>>;

    // * Lifecycle

    async fn health(&self) -> StoreResult<()>;

    async fn shutdown(&self) {}
}

/// Optional `token -> user id` lookaside cache in front of the store.
/// Failures are reported to the caller, which falls back to the store.
#[async_trait]
pub trait TokenCache: Send + Sync {
    async fn cached_user_id(&self, token: &str) -> anyhow::Result<Option<i64>>;

    async fn cache_token(&self, token: &str, user_id: i64) -> anyhow::Result<()>;

    async fn shutdown(&self) {}
}
