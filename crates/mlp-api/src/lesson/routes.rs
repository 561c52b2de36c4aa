use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use mlp_db::{
    models::{ActivityType, ChallengeType, Lesson, LessonFilter, StatCounter},
    pagination::{PageParams, Pagination},
    repositories::{lesson as lesson_repo, progress as progress_repo},
};
use uuid::Uuid;

use super::model::{CompletionResponse, CreateLessonRequest, UpdateLessonRequest, normalize_filter};
use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    progress::service as progress_service,
    response::ApiResponse,
    validation::{ValidatedJson, ValidatedQuery},
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/lessons", get(list_lessons).post(create_lesson))
        .route(
            "/lessons/{id}",
            get(get_lesson).patch(update_lesson).delete(delete_lesson),
        )
        .route("/lessons/{id}/complete", post(complete_lesson))
}

async fn list_lessons(
    State(state): State<ApiState>,
    ValidatedQuery(page): ValidatedQuery<PageParams>,
    ValidatedQuery(filter): ValidatedQuery<LessonFilter>,
) -> Result<ApiResponse<Vec<Lesson>>, ApiError> {
    let page = Pagination::from(page);
    let filter = normalize_filter(filter);

    let (lessons, total) = tokio::try_join!(
        lesson_repo::list_published(&state.pool, &filter, page.limit, page.offset()),
        lesson_repo::count_published(&state.pool, &filter),
    )?;

    Ok(ApiResponse::paginated(
        "Lessons retrieved",
        lessons,
        page.meta(total),
    ))
}

async fn get_lesson(
    viewer: Option<AuthUser>,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Lesson>, ApiError> {
    let mut lesson = lesson_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lesson"))?;

    // Drafts stay invisible to everyone but the author and admins
    let can_manage = viewer.as_ref().is_some_and(|v| v.can_manage(lesson.author_id));
    if !lesson.is_published && !can_manage {
        return Err(ApiError::not_found("Lesson"));
    }

    lesson.view_count = lesson_repo::increment_views(&state.pool, id).await?;

    Ok(ApiResponse::ok("Lesson retrieved", lesson))
}

async fn create_lesson(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedJson(payload): ValidatedJson<CreateLessonRequest>,
) -> Result<ApiResponse<Lesson>, ApiError> {
    let new_lesson = payload.into_new_lesson(auth_user.user_id);
    let id = lesson_repo::create(&state.pool, &new_lesson).await?;

    let lesson = lesson_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::Internal("Created lesson not found".to_string()))?;

    tracing::info!(lesson_id = %id, author_id = %auth_user.user_id, "lesson created");

    Ok(ApiResponse::created("Lesson created", lesson))
}

async fn update_lesson(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateLessonRequest>,
) -> Result<ApiResponse<Lesson>, ApiError> {
    let access = lesson_repo::find_access(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lesson"))?;
    if !auth_user.can_manage(access.author_id) {
        return Err(ApiError::Forbidden(
            "Only the author or an admin can edit this lesson".to_string(),
        ));
    }

    let changes = payload.into_changes();
    let updated = lesson_repo::update(
        &state.pool,
        id,
        auth_user.user_id,
        auth_user.is_admin(),
        &changes,
    )
    .await?;
    if !updated {
        return Err(ApiError::not_found("Lesson"));
    }

    let lesson = lesson_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lesson"))?;

    Ok(ApiResponse::ok("Lesson updated", lesson))
}

async fn delete_lesson(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    let access = lesson_repo::find_access(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lesson"))?;
    if !auth_user.can_manage(access.author_id) {
        return Err(ApiError::Forbidden(
            "Only the author or an admin can delete this lesson".to_string(),
        ));
    }

    if !lesson_repo::delete(&state.pool, id, auth_user.user_id, auth_user.is_admin()).await? {
        return Err(ApiError::not_found("Lesson"));
    }

    tracing::info!(lesson_id = %id, actor_id = %auth_user.user_id, "lesson deleted");

    Ok(ApiResponse::ok("Lesson deleted", ()))
}

async fn complete_lesson(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<CompletionResponse>, ApiError> {
    let user_id = auth_user.user_id;
    let mut tx = state.pool.begin().await?;

    let access = lesson_repo::find_access(&mut *tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lesson"))?;
    if !access.is_published {
        if auth_user.can_manage(access.author_id) {
            return Err(ApiError::BadRequest(
                "Only published lessons can be completed".to_string(),
            ));
        }
        return Err(ApiError::not_found("Lesson"));
    }

    let first_time = lesson_repo::record_completion(&mut *tx, user_id, id, access.xp_reward).await?;
    if !first_time {
        let stats = progress_repo::find_stats(&mut *tx, user_id).await?;
        tx.commit().await?;

        return Ok(ApiResponse::ok(
            "Lesson already completed",
            CompletionResponse {
                lesson_id: id,
                already_completed: true,
                xp_awarded: 0,
                total_xp: stats.as_ref().map_or(0, |s| s.total_xp),
                level: stats.as_ref().map_or(1, |s| s.level),
                leveled_up: false,
                completed_challenges: Vec::new(),
                new_milestones: Vec::new(),
            },
        ));
    }

    progress_repo::increment_counter(&mut *tx, user_id, StatCounter::LessonsCompleted, 1).await?;
    let award =
        progress_service::award_xp(&mut tx, user_id, i64::from(access.xp_reward), "lesson").await?;
    progress_service::record_activity(
        &mut tx,
        user_id,
        ActivityType::LessonCompleted,
        "Completed a lesson",
        access.xp_reward,
        Some(id),
        serde_json::json!({ "xpReward": access.xp_reward }),
    )
    .await?;

    let mut completed_challenges =
        progress_service::advance_challenges(&mut tx, user_id, ChallengeType::CompleteLessons, 1)
            .await?;
    completed_challenges.extend(
        progress_service::advance_challenges(
            &mut tx,
            user_id,
            ChallengeType::EarnXp,
            access.xp_reward,
        )
        .await?,
    );

    let new_milestones = progress_service::check_milestones(&mut tx, user_id)
        .await?
        .into_iter()
        .map(|kind| kind.as_str())
        .collect();

    tx.commit().await?;

    tracing::info!(%user_id, lesson_id = %id, xp = award.xp_awarded, "lesson completed");

    Ok(ApiResponse::ok(
        "Lesson completed",
        CompletionResponse {
            lesson_id: id,
            already_completed: false,
            xp_awarded: award.xp_awarded,
            total_xp: award.total_xp,
            level: award.level,
            leveled_up: award.leveled_up,
            completed_challenges,
            new_milestones,
        },
    ))
}
