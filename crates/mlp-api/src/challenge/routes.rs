use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::Utc;
use mlp_db::{
    models::{Challenge, ChallengeHistoryEntry, ChallengeProgress, ChallengeWithProgress},
    pagination::{PageParams, Pagination},
    repositories::challenge as challenge_repo,
};
use uuid::Uuid;

use super::{
    model::{
        ActiveQuery, ClaimResponse, CreateChallengeRequest, ProgressRequest, RankedEntry,
        StreakResponse, UpdateChallengeRequest, rank_rows,
    },
    service,
};
use crate::{
    ApiState,
    auth::{AdminUser, AuthUser},
    error::ApiError,
    response::ApiResponse,
    validation::{ValidatedJson, ValidatedQuery},
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/challenges", post(create_challenge))
        .route("/challenges/active", get(list_active))
        .route("/challenges/streak", get(get_streak))
        .route("/challenges/history", get(get_history))
        .route(
            "/challenges/{id}",
            get(get_challenge)
                .patch(update_challenge)
                .delete(delete_challenge),
        )
        .route("/challenges/{id}/join", post(join_challenge))
        .route("/challenges/{id}/progress", post(update_progress))
        .route("/challenges/{id}/claim", post(claim_reward))
        .route("/challenges/{id}/leaderboard", get(challenge_leaderboard))
}

async fn list_active(
    viewer: Option<AuthUser>,
    State(state): State<ApiState>,
    ValidatedQuery(query): ValidatedQuery<ActiveQuery>,
) -> Result<ApiResponse<Vec<ChallengeWithProgress>>, ApiError> {
    let challenges = challenge_repo::list_open(
        &state.pool,
        query.period,
        viewer.map(|v| v.user_id),
        Utc::now(),
    )
    .await?;

    Ok(ApiResponse::ok("Active challenges retrieved", challenges))
}

async fn get_challenge(
    viewer: Option<AuthUser>,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<ChallengeWithProgress>, ApiError> {
    let challenge = challenge_repo::find_with_progress(&state.pool, id, viewer.map(|v| v.user_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Challenge"))?;

    Ok(ApiResponse::ok("Challenge retrieved", challenge))
}

async fn create_challenge(
    AdminUser(admin): AdminUser,
    State(state): State<ApiState>,
    ValidatedJson(payload): ValidatedJson<CreateChallengeRequest>,
) -> Result<ApiResponse<Challenge>, ApiError> {
    let new_challenge = payload.into_new_challenge(admin.user_id, Utc::now())?;
    let challenge = challenge_repo::create(&state.pool, &new_challenge).await?;

    tracing::info!(challenge_id = %challenge.id, admin_id = %admin.user_id, "challenge created");

    Ok(ApiResponse::created("Challenge created", challenge))
}

async fn update_challenge(
    AdminUser(_admin): AdminUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateChallengeRequest>,
) -> Result<ApiResponse<Challenge>, ApiError> {
    let existing = challenge_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Challenge"))?;

    if let Some(ends_at) = payload.ends_at
        && ends_at <= existing.starts_at
    {
        return Err(ApiError::Validation(
            "endsAt: must be after startsAt".to_string(),
        ));
    }

    let challenge = challenge_repo::update(&state.pool, id, &payload.into_changes())
        .await?
        .ok_or_else(|| ApiError::not_found("Challenge"))?;

    Ok(ApiResponse::ok("Challenge updated", challenge))
}

async fn delete_challenge(
    AdminUser(admin): AdminUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    if !challenge_repo::delete(&state.pool, id).await? {
        return Err(ApiError::not_found("Challenge"));
    }

    tracing::info!(challenge_id = %id, admin_id = %admin.user_id, "challenge deleted");

    Ok(ApiResponse::ok("Challenge deleted", ()))
}

async fn join_challenge(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<ChallengeProgress>, ApiError> {
    let challenge = challenge_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Challenge"))?;
    if !challenge.is_open_at(Utc::now()) {
        return Err(ApiError::BadRequest("Challenge is not open".to_string()));
    }

    let progress = challenge_repo::join(&state.pool, auth_user.user_id, id, challenge.target)
        .await
        .map_err(ApiError::on_duplicate("You have already joined this challenge"))?;

    Ok(ApiResponse::created("Challenge joined", progress))
}

async fn update_progress(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ProgressRequest>,
) -> Result<ApiResponse<ChallengeProgress>, ApiError> {
    let progress = service::record_progress(&state.pool, auth_user.user_id, id, payload.amount).await?;

    Ok(ApiResponse::ok("Progress updated", progress))
}

async fn claim_reward(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<ClaimResponse>, ApiError> {
    let today = Utc::now().date_naive();
    let claim = service::claim(&state.pool, auth_user.user_id, id, today).await?;

    Ok(ApiResponse::ok("Reward claimed", claim))
}

async fn challenge_leaderboard(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    ValidatedQuery(page): ValidatedQuery<PageParams>,
) -> Result<ApiResponse<Vec<RankedEntry>>, ApiError> {
    if challenge_repo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(ApiError::not_found("Challenge"));
    }

    let page = Pagination::from(page);
    let (rows, total) = tokio::try_join!(
        challenge_repo::list_ranking(&state.pool, id, page.limit, page.offset()),
        challenge_repo::count_participants(&state.pool, id),
    )?;

    Ok(ApiResponse::paginated(
        "Challenge leaderboard retrieved",
        rank_rows(rows, page.offset()),
        page.meta(total),
    ))
}

async fn get_streak(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<ApiResponse<StreakResponse>, ApiError> {
    let (record, milestones) = tokio::try_join!(
        challenge_repo::find_streak(&state.pool, auth_user.user_id),
        challenge_repo::list_streak_milestones(&state.pool, auth_user.user_id),
    )?;

    let today = Utc::now().date_naive();
    Ok(ApiResponse::ok(
        "Streak retrieved",
        StreakResponse::build(record.as_ref(), milestones, today),
    ))
}

async fn get_history(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedQuery(page): ValidatedQuery<PageParams>,
) -> Result<ApiResponse<Vec<ChallengeHistoryEntry>>, ApiError> {
    let page = Pagination::from(page);
    let (entries, total) = tokio::try_join!(
        challenge_repo::list_history(&state.pool, auth_user.user_id, page.limit, page.offset()),
        challenge_repo::count_history(&state.pool, auth_user.user_id),
    )?;

    Ok(ApiResponse::paginated(
        "Challenge history retrieved",
        entries,
        page.meta(total),
    ))
}
