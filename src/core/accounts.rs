// Account creation shared by the HTTP API and the startup superuser bootstrap

use anyhow::{bail, Result};
use tracing::info;
use uuid::Uuid;

use crate::core::password::hash_password;
use crate::database::store::RecipeStore;
use crate::models::user::{normalize_email, NewUser, User};

/// Creates a regular user. The email is normalized and the password hashed.
pub async fn create_user(
    store: &dyn RecipeStore,
    email: &str,
    password: &str,
    name: &str,
    cost: u32,
) -> Result<User> {
    insert_user(store, email, password, name, cost, false).await
}

/// Creates a user with staff and superuser rights.
pub async fn create_superuser(
    store: &dyn RecipeStore,
    email: &str,
    password: &str,
    name: &str,
    cost: u32,
) -> Result<User> {
    insert_user(store, email, password, name, cost, true).await
}

async fn insert_user(
    store: &dyn RecipeStore,
    email: &str,
    password: &str,
    name: &str,
    cost: u32,
    privileged: bool,
) -> Result<User> {
    if email.trim().is_empty() {
        bail!("User must have an email address");
    }

    let user: User = store
        .create_user(NewUser {
            email: normalize_email(email),
            name: name.trim().to_owned(),
            password_hash: hash_password(password.to_owned(), cost).await?,
            is_staff: privileged,
            is_superuser: privileged,
        })
        .await?;

    Ok(user)
}

/// Creates the configured superuser unless an account with that email already exists.
pub async fn ensure_superuser(store: &dyn RecipeStore, email: &str, password: &str, cost: u32) -> Result<()> {
    if store.find_user_by_email(&normalize_email(email)).await?.is_some() {
        info!("Superuser {} already exists", email);
        return Ok(());
    }

    let user: User = create_superuser(store, email, password, "", cost).await?;
    info!("Created superuser {}", user);
    Ok(())
}

/// A fresh 40-character hex API token
pub fn generate_token() -> String {
    let first: Uuid = Uuid::new_v4();
    let second: Uuid = Uuid::new_v4();
    let mut token: String = format!("{}{}", first.simple(), second.simple());
    token.truncate(40);
    token
}
