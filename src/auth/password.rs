use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("stored password digest is malformed")]
    MalformedDigest,
    #[error("hashing task aborted")]
    Aborted,
}

lazy_static! {
    // Verified against when the login email is unknown, so both paths pay for one Argon2 run.
    static ref DUMMY_DIGEST: Option<String> = hash_password("tasklist-dummy-password").ok();
}

/// Argon2id with the crate's default cost parameters.
pub fn hash_password(plain: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            HashError::Hash(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// `Ok(false)` on mismatch; `Err` only if `digest` is not a PHC string.
pub fn verify_password(plain: &str, digest: &str) -> Result<bool, HashError> {
    let parsed = PasswordHash::new(digest).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        HashError::MalformedDigest
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

pub async fn hash_password_blocking(plain: String) -> Result<String, HashError> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|_| HashError::Aborted)?
}

pub async fn verify_password_blocking(plain: String, digest: String) -> Result<bool, HashError> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &digest))
        .await
        .map_err(|_| HashError::Aborted)?
}

/// Burns one verification so an unknown email costs the same as a wrong password.
/// The dummy digest is built on the blocking pool the first time it is needed.
pub async fn verify_dummy(plain: String) {
    let _ = tokio::task::spawn_blocking(move || {
        if let Some(digest) = DUMMY_DIGEST.as_ref() {
            let _ = verify_password(&plain, digest);
        }
    })
    .await;
}

/// Builds the dummy digest ahead of the first login so no request pays for it.
pub async fn warm_dummy_digest() -> Result<(), HashError> {
    let ready = tokio::task::spawn_blocking(|| DUMMY_DIGEST.is_some())
        .await
        .map_err(|_| HashError::Aborted)?;
    if ready {
        Ok(())
    } else {
        Err(HashError::Hash("dummy digest unavailable".into()))
    }
}
