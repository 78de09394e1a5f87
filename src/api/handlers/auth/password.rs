use anyhow::{Context, Result};

pub const MIN_PASSWORD_LENGTH: usize = 8;

// bcrypt with this cost takes long enough to block the async runtime, so
// hashing and verification run on the blocking pool.
const BCRYPT_COST: u32 = 12;

/// Hash a plaintext password.
/// # Errors
/// Returns an error if hashing fails or the blocking task is cancelled.
pub async fn hash_password(plaintext: String) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, BCRYPT_COST))
        .await
        .context("Password hashing task failed")?
        .context("Failed to hash password")
}

/// Verify a plaintext password against a stored digest.
/// # Errors
/// Returns an error if the digest is malformed or the blocking task is
/// cancelled. A well-formed digest that does not match yields `Ok(false)`.
pub async fn verify_password(plaintext: String, digest: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &digest))
        .await
        .context("Password verification task failed")?
        .context("Failed to verify password")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify_round_trip() {
        let digest = hash_password("longenough1".to_string()).await.unwrap();
        assert!(digest.starts_with("$2"));
        assert!(verify_password("longenough1".to_string(), digest.clone())
            .await
            .unwrap());
        assert!(!verify_password("wrong-password".to_string(), digest)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn malformed_digest_is_an_error() {
        assert!(
            verify_password("longenough1".to_string(), "not-a-bcrypt-digest".to_string())
                .await
                .is_err()
        );
    }
}
