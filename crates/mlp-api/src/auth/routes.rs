use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use mlp_db::{
    models::{ProgressStats, UserProfile},
    repositories::{progress as progress_repo, user as user_repo},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{middleware::AuthUser, refresh_token as rt, service};
use crate::{
    ApiState, error::ApiError, middleware::rate_limit, response::ApiResponse,
    validation::ValidatedJson,
};

pub fn routes() -> Router<ApiState> {
    use crate::make_rate_limit_layer;

    // Credential endpoints get the strict limiter
    let credential_routes = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .layer(make_rate_limit_layer!(
            rate_limit::AUTH_RATE_PER_SECOND,
            rate_limit::AUTH_BURST_SIZE
        ));

    let session_routes = Router::new().route("/auth/me", get(me)).layer(
        make_rate_limit_layer!(
            rate_limit::GENERAL_RATE_PER_SECOND,
            rate_limit::GENERAL_BURST_SIZE
        ),
    );

    Router::new().merge(credential_routes).merge(session_routes)
}

#[derive(Debug, Deserialize, Validate)]
struct RegisterRequest {
    #[validate(length(min = 1, message = "is required"))]
    username: String,
    #[validate(length(min = 1, message = "is required"))]
    email: String,
    #[validate(length(min = 1, message = "is required"))]
    password: String,
}

#[derive(Debug, Deserialize, Validate)]
struct LoginRequest {
    #[validate(length(min = 1, message = "is required"))]
    email: String,
    #[validate(length(min = 1, message = "is required"))]
    password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    #[validate(length(min = 1, message = "is required"))]
    refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserProfile,
    pub stats: Option<ProgressStats>,
}

async fn register(
    State(state): State<ApiState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<ApiResponse<service::AuthSession>, ApiError> {
    let session = service::register(
        &state.pool,
        &state.auth,
        &payload.username,
        &payload.email,
        &payload.password,
    )
    .await?;

    Ok(ApiResponse::created("Registration successful", session))
}

async fn login(
    State(state): State<ApiState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<ApiResponse<service::AuthSession>, ApiError> {
    let session = service::login(&state.pool, &state.auth, &payload.email, &payload.password).await?;

    Ok(ApiResponse::ok("Login successful", session))
}

async fn refresh(
    State(state): State<ApiState>,
    ValidatedJson(payload): ValidatedJson<RefreshRequest>,
) -> Result<ApiResponse<service::AuthSession>, ApiError> {
    let session = service::refresh(&state.pool, &state.auth, &payload.refresh_token).await?;

    Ok(ApiResponse::ok("Token refreshed successfully", session))
}

async fn logout(
    State(state): State<ApiState>,
    ValidatedJson(payload): ValidatedJson<RefreshRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    // Unknown tokens are fine: logging out twice is not an error
    let revoked = rt::revoke_refresh_token(&state.pool, &payload.refresh_token).await?;
    tracing::debug!(revoked, "logout");

    Ok(ApiResponse::ok("Logged out successfully", ()))
}

async fn me(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<ApiResponse<MeResponse>, ApiError> {
    let (user, stats) = tokio::try_join!(
        user_repo::find_profile_by_id(&state.pool, auth_user.user_id),
        progress_repo::find_stats(&state.pool, auth_user.user_id),
    )?;
    let user = user.ok_or_else(|| ApiError::not_found("User"))?;

    Ok(ApiResponse::ok("Profile retrieved", MeResponse { user, stats }))
}
