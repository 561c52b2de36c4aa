use mlp_db::{
    models::UserProfile,
    repositories::{token as token_repo, user as user_repo},
};
use serde::Serialize;
use sqlx::PgPool;

use super::{jwt, password, refresh_token as rt, validation};
use crate::{error::ApiError, metrics, normalization::normalize_email, state::AuthConfig};

/// Tokens handed back after register, login and refresh
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

/// Create an account plus its stats snapshot, then sign the user in.
pub async fn register(
    pool: &PgPool,
    auth: &AuthConfig,
    username: &str,
    email: &str,
    password: &str,
) -> Result<AuthSession, ApiError> {
    let username = username.trim();
    let email = normalize_email(email);

    validation::validate_username(username)?;
    validation::validate_email(&email)?;
    validation::validate_password(password)?;

    let password_hash = password::hash_password(password.to_string(), auth.bcrypt_cost).await?;

    let mut tx = pool.begin().await?;

    let user = user_repo::create_user(&mut *tx, username, &email, &password_hash)
        .await
        .map_err(map_signup_conflict)?;
    user_repo::create_user_stats(&mut *tx, user.id).await?;

    tx.commit().await?;

    tracing::info!(user_id = %user.id, "user registered");
    metrics::record_auth_event("register", true);

    issue_session(pool, auth, user).await
}

/// Check credentials. Unknown e-mail and wrong password share one message.
pub async fn login(
    pool: &PgPool,
    auth: &AuthConfig,
    email: &str,
    password: &str,
) -> Result<AuthSession, ApiError> {
    let email = normalize_email(email);
    let invalid = || ApiError::Auth("Invalid email or password".to_string());

    let Some(credentials) = user_repo::find_credentials_by_email(pool, &email).await? else {
        metrics::record_auth_event("login", false);
        return Err(invalid());
    };

    let matches =
        password::verify_password(password.to_string(), credentials.password_hash.clone()).await?;
    if !matches {
        metrics::record_auth_event("login", false);
        return Err(invalid());
    }

    if credentials.is_banned {
        metrics::record_auth_event("login", false);
        return Err(ApiError::Forbidden("Account is banned".to_string()));
    }

    metrics::record_auth_event("login", true);
    issue_session(pool, auth, credentials.into()).await
}

/// Rotate a refresh token and mint a fresh access token for its owner.
pub async fn refresh(
    pool: &PgPool,
    auth: &AuthConfig,
    refresh_token: &str,
) -> Result<AuthSession, ApiError> {
    let (user_id, new_refresh_token) =
        rt::verify_and_rotate_refresh_token(pool, refresh_token, auth.refresh_token_expiry_days)
            .await?;

    let user = user_repo::find_profile_by_id(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::Auth("User no longer exists".to_string()))?;

    if user.is_banned {
        token_repo::revoke_all_for_user(pool, user.id).await?;
        return Err(ApiError::Forbidden("Account is banned".to_string()));
    }

    let access_token = jwt::generate_jwt_token(
        user.id,
        user.email.clone(),
        user.role,
        &auth.jwt_secret,
        auth.jwt_expiry_hours,
    )?;

    metrics::record_auth_event("refresh", true);

    Ok(AuthSession {
        user,
        access_token,
        refresh_token: new_refresh_token,
    })
}

async fn issue_session(
    pool: &PgPool,
    auth: &AuthConfig,
    user: UserProfile,
) -> Result<AuthSession, ApiError> {
    let access_token = jwt::generate_jwt_token(
        user.id,
        user.email.clone(),
        user.role,
        &auth.jwt_secret,
        auth.jwt_expiry_hours,
    )?;
    let refresh_token = rt::issue_refresh_token(pool, user.id, auth.refresh_token_expiry_days).await?;

    Ok(AuthSession {
        user,
        access_token,
        refresh_token,
    })
}

fn map_signup_conflict(err: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.constraint() {
            Some("users_username_key") => {
                return ApiError::Conflict("Username already taken".to_string());
            }
            Some("users_email_key") => {
                return ApiError::Conflict("Email already registered".to_string());
            }
            _ => {}
        }
    }
    err.into()
}
