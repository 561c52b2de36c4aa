//! bcrypt hashing, run on the blocking pool so it never stalls the async workers.

use crate::error::ApiError;

pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {e}")))
}

/// `Ok(false)` on mismatch; malformed stored hashes are internal errors.
pub async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("Password verification task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("Password verification failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum cost keeps the tests fast
    const COST: u32 = 4;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("correct horse 1".to_string(), COST)
            .await
            .expect("hash should succeed");

        assert_ne!(hash, "correct horse 1");
        assert!(verify_password("correct horse 1".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong horse 1".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_internal_error() {
        let result = verify_password("whatever1".to_string(), "not-a-hash".to_string()).await;
        assert!(matches!(result, Err(ApiError::Internal(_))));
    }
}
