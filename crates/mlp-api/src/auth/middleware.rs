use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use mlp_db::{models::UserRole, repositories::user as user_repo};
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::verify_jwt_token;
use crate::{error::ApiError, state::AuthConfig};

/// Authenticated user extractor
///
/// Reads `Authorization: Bearer <jwt>`, verifies it, then reloads the user's
/// role and ban flag so that bans and promotions apply to tokens already issued.
///
/// # Example
/// ```
/// use axum::extract::State;
/// use mlp_api::{error::ApiError, auth::AuthUser, ApiState};
///
/// async fn protected_route(
///     auth_user: AuthUser,
///     State(state): State<ApiState>,
/// ) -> Result<(), ApiError> {
///     // auth_user.user_id and auth_user.role are available
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Owner of a resource, or an admin
    pub fn can_manage(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id || self.is_admin()
    }
}

async fn authenticate<S>(token: &str, state: &S) -> Result<AuthUser, ApiError>
where
    AuthConfig: FromRef<S>,
    PgPool: FromRef<S>,
{
    let auth_config = AuthConfig::from_ref(state);
    let claims = verify_jwt_token(token, &auth_config.jwt_secret)?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::Auth("Invalid user ID in token".to_string()))?;

    let pool = PgPool::from_ref(state);
    let status = user_repo::find_auth_status(&pool, user_id)
        .await?
        .ok_or_else(|| ApiError::Auth("User no longer exists".to_string()))?;

    if status.is_banned {
        return Err(ApiError::Forbidden("Account is banned".to_string()));
    }

    Ok(AuthUser {
        user_id,
        email: status.email,
        role: status.role,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    AuthConfig: FromRef<S>,
    PgPool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            <TypedHeader<Authorization<Bearer>> as FromRequestParts<S>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Auth("Not authenticated".to_string()))?;

        authenticate(bearer.token(), state).await
    }
}

/// `Option<AuthUser>`: anonymous when no `Authorization` header is sent,
/// but a header that is present must still be valid.
impl<S> OptionalFromRequestParts<S> for AuthUser
where
    AuthConfig: FromRef<S>,
    PgPool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        match <TypedHeader<Authorization<Bearer>> as FromRequestParts<S>>::from_request_parts(parts, state).await {
            Ok(TypedHeader(Authorization(bearer))) => {
                authenticate(bearer.token(), state).await.map(Some)
            }
            Err(rejection) if rejection.is_missing() => Ok(None),
            Err(_) => Err(ApiError::Auth("Malformed Authorization header".to_string())),
        }
    }
}

/// Authenticated user with the `admin` role
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    AuthConfig: FromRef<S>,
    PgPool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = <AuthUser as FromRequestParts<S>>::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }
        Ok(Self(user))
    }
}
