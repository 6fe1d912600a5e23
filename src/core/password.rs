// bcrypt hashing, moved onto the blocking pool so request tasks never stall on it

use anyhow::{Context, Result};
use bcrypt::{hash, verify};

pub async fn hash_password(password: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || hash(password.as_bytes(), cost))
        .await
        .context("Password hashing task failed")?
        .context("Failed to hash password")
}

/// A malformed stored hash counts as a mismatch
pub async fn verify_password(password: String, password_hash: String) -> bool {
    tokio::task::spawn_blocking(move || verify(password.as_bytes(), &password_hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}
