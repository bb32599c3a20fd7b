use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Constant-time check of `plain` against a stored PHC hash.
/// A hash that fails to parse is an error, not a mismatch.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Hash with default parameters that matches no real account. Verifying against it
/// costs the same as a real mismatch.
pub fn dummy_hash() -> Option<&'static str> {
    lazy_static! {
        static ref DUMMY_HASH: Option<String> = hash_password("never-issued").ok();
    }
    DUMMY_HASH.as_deref()
}

/// Runs [`hash_password`] on the blocking pool.
pub async fn spawn_hash(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .context("hash task panicked")?
}

/// Burns one verification against [`dummy_hash`] on the blocking pool.
pub async fn spawn_verify_dummy(plain: String) {
    let _ = tokio::task::spawn_blocking(move || dummy_hash().map(|h| verify_password(&plain, h)))
        .await;
}

/// Runs [`verify_password`] on the blocking pool.
pub async fn spawn_verify(plain: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
        .await
        .context("verify task panicked")?
}
