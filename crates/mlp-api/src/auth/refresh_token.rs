use base64::Engine;
use chrono::Utc;
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;

use mlp_db::repositories::token as token_repo;

/// Generate a cryptographically secure random refresh token
/// Returns the token string (to send to client) and its SHA-256 hash (to store in DB)
pub fn generate_refresh_token() -> (String, String) {
    // 32 random bytes (256 bits)
    let mut token_bytes = [0u8; 32];
    rand::thread_rng().fill(&mut token_bytes);

    let token = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(token_bytes);
    let token_hash = hash_refresh_token(&token);

    (token, token_hash)
}

/// SHA-256 hex digest; only this form is ever persisted
pub fn hash_refresh_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Issue and persist a new refresh token for `user_id`
pub async fn issue_refresh_token(
    pool: &PgPool,
    user_id: Uuid,
    expiry_days: i64,
) -> Result<String, ApiError> {
    let (token, token_hash) = generate_refresh_token();
    let expires_at = Utc::now() + chrono::Duration::days(expiry_days);

    token_repo::store_refresh_token(pool, user_id, &token_hash, expires_at).await?;

    Ok(token)
}

/// Consume a refresh token and issue its replacement in one transaction.
/// Returns the owning user and the new token.
pub async fn verify_and_rotate_refresh_token(
    pool: &PgPool,
    token: &str,
    expiry_days: i64,
) -> Result<(Uuid, String), ApiError> {
    let token_hash = hash_refresh_token(token);

    let mut tx = pool.begin().await?;

    // Deleting up front means a replayed token finds nothing
    let record = token_repo::take_refresh_token(&mut *tx, &token_hash)
        .await?
        .ok_or_else(|| ApiError::Auth("Invalid refresh token".to_string()))?;

    if record.expires_at < Utc::now() {
        tx.commit().await?;
        return Err(ApiError::Auth("Refresh token expired".to_string()));
    }

    let (new_token, new_token_hash) = generate_refresh_token();
    let new_expires_at = Utc::now() + chrono::Duration::days(expiry_days);

    token_repo::store_refresh_token(&mut *tx, record.user_id, &new_token_hash, new_expires_at)
        .await?;

    tx.commit().await?;

    Ok((record.user_id, new_token))
}

/// Revoke a specific refresh token; unknown tokens are ignored.
pub async fn revoke_refresh_token(pool: &PgPool, token: &str) -> Result<bool, ApiError> {
    let rows = token_repo::delete_refresh_token(pool, &hash_refresh_token(token)).await?;
    Ok(rows > 0)
}

/// Revoke all refresh tokens for a user (logout everywhere, bans)
pub async fn revoke_all_user_tokens(pool: &PgPool, user_id: Uuid) -> Result<u64, ApiError> {
    let rows = token_repo::revoke_all_for_user(pool, user_id).await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_shape() {
        let (token, hash) = generate_refresh_token();

        // 32 bytes -> 43 base64url characters without padding
        assert_eq!(token.len(), 43);
        assert!(!token.contains('='));
        assert!(!token.contains('+') && !token.contains('/'));
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_refresh_token(&token));
    }

    #[test]
    fn test_tokens_are_unique() {
        let (a, _) = generate_refresh_token();
        let (b, _) = generate_refresh_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_is_sha256_hex() {
        assert_eq!(
            hash_refresh_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
