use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use mlp_db::models::UserRole;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id as string
    pub email: String,
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
}

/// Generate a signed HS256 access token
pub fn generate_jwt_token(
    user_id: Uuid,
    email: String,
    role: UserRole,
    jwt_secret: &str,
    expiry_hours: i64,
) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        email,
        role,
        iat: now.timestamp() as usize,
        exp: (now + chrono::Duration::hours(expiry_hours)).timestamp() as usize,
    };

    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a JWT token
pub fn verify_jwt_token(token: &str, jwt_secret: &str) -> Result<Claims, ApiError> {
    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Auth("Invalid or expired token".to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_jwt_secret_minimum_32_characters_long";

    #[test]
    fn test_generate_and_verify_jwt_token() {
        let user_id = Uuid::new_v4();
        let email = "test@example.com".to_string();

        let token = generate_jwt_token(user_id, email.clone(), UserRole::Admin, SECRET, 24)
            .expect("Failed to generate token");
        assert!(!token.is_empty(), "Token should not be empty");

        let claims = verify_jwt_token(&token, SECRET).expect("Failed to verify token");

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, email);
        assert_eq!(claims.role, UserRole::Admin);
        assert!(claims.exp > claims.iat, "Expiration should be after issued at");
    }

    #[test]
    fn test_verify_jwt_token_with_wrong_secret() {
        let token = generate_jwt_token(
            Uuid::new_v4(),
            "test@example.com".to_string(),
            UserRole::User,
            SECRET,
            24,
        )
        .expect("Failed to generate token");

        let result = verify_jwt_token(&token, "wrong_jwt_secret_minimum_32_characters_long");

        match result {
            Err(ApiError::Auth(msg)) => assert!(msg.contains("Invalid or expired token")),
            _ => panic!("Expected Auth error"),
        }
    }

    #[test]
    fn test_verify_invalid_jwt_token() {
        let result = verify_jwt_token("invalid.jwt.token", SECRET);
        assert!(matches!(result, Err(ApiError::Auth(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Well past the default 60s leeway
        let token = generate_jwt_token(
            Uuid::new_v4(),
            "test@example.com".to_string(),
            UserRole::User,
            SECRET,
            -2,
        )
        .expect("Failed to generate token");

        assert!(matches!(verify_jwt_token(&token, SECRET), Err(ApiError::Auth(_))));
    }

    #[test]
    fn test_jwt_token_expiration_follows_config() {
        let token = generate_jwt_token(
            Uuid::new_v4(),
            "test@example.com".to_string(),
            UserRole::User,
            SECRET,
            1,
        )
        .expect("Failed to generate token");

        let claims = verify_jwt_token(&token, SECRET).expect("Failed to verify token");
        let lifetime = claims.exp - claims.iat;
        assert!(
            (3590..=3610).contains(&lifetime),
            "Token should expire in about an hour, got {lifetime} seconds"
        );
    }

    #[test]
    fn test_claims_role_serialization() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: UserRole::User,
            iat: 0,
            exp: 1,
        };

        let json = serde_json::to_string(&claims).expect("Failed to serialize claims");
        assert!(json.contains(r#""role":"user""#));

        let back: Claims = serde_json::from_str(&json).expect("Failed to deserialize claims");
        assert_eq!(back.role, UserRole::User);
    }
}
