use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use mlp_db::{
    models::{AdminUserRow, FlaggedComment, PlatformStats, UserRole},
    pagination::{PageParams, Pagination},
    repositories::{admin as admin_repo, comment as comment_repo, token as token_repo},
};
use uuid::Uuid;

use super::model::{
    BanResponse, ModerateRequest, ModerationAction, ModerationResponse, RoleResponse, UserFilter,
};
use crate::{
    ApiState,
    auth::AdminUser,
    error::ApiError,
    response::ApiResponse,
    validation::{ValidatedJson, ValidatedQuery},
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/{id}/ban", post(toggle_ban))
        .route("/admin/users/{id}/promote", post(toggle_role))
        .route("/admin/stats", get(stats))
        .route("/admin/comments/flagged", get(flagged_comments))
        .route("/admin/comments/{id}/moderate", post(moderate_comment))
}

fn reject_self(admin_id: Uuid, target_id: Uuid) -> Result<(), ApiError> {
    if admin_id == target_id {
        return Err(ApiError::BadRequest(
            "Admins cannot change their own account".to_string(),
        ));
    }
    Ok(())
}

async fn list_users(
    AdminUser(_admin): AdminUser,
    State(state): State<ApiState>,
    ValidatedQuery(page): ValidatedQuery<PageParams>,
    ValidatedQuery(filter): ValidatedQuery<UserFilter>,
) -> Result<ApiResponse<Vec<AdminUserRow>>, ApiError> {
    let page = Pagination::from(page);
    let search = filter.search_term();

    let (users, total) = tokio::try_join!(
        admin_repo::list_users(
            &state.pool,
            search,
            filter.role,
            filter.banned,
            page.limit,
            page.offset()
        ),
        admin_repo::count_users(&state.pool, search, filter.role, filter.banned),
    )?;

    Ok(ApiResponse::paginated("Users retrieved", users, page.meta(total)))
}

async fn toggle_ban(
    AdminUser(admin): AdminUser,
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
) -> Result<ApiResponse<BanResponse>, ApiError> {
    reject_self(admin.user_id, user_id)?;

    let mut tx = state.pool.begin().await?;

    let is_banned = admin_repo::toggle_ban(&mut *tx, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let revoked_sessions = if is_banned {
        token_repo::revoke_all_for_user(&mut *tx, user_id).await?
    } else {
        0
    };

    tx.commit().await?;

    tracing::info!(
        admin_id = %admin.user_id,
        user_id = %user_id,
        is_banned,
        revoked_sessions,
        "user ban toggled"
    );

    let message = if is_banned { "User banned" } else { "User unbanned" };
    Ok(ApiResponse::ok(
        message,
        BanResponse {
            user_id,
            is_banned,
            revoked_sessions,
        },
    ))
}

async fn toggle_role(
    AdminUser(admin): AdminUser,
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
) -> Result<ApiResponse<RoleResponse>, ApiError> {
    reject_self(admin.user_id, user_id)?;

    let role = admin_repo::toggle_admin(&state.pool, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    tracing::info!(admin_id = %admin.user_id, user_id = %user_id, ?role, "user role changed");

    let message = match role {
        UserRole::Admin => "User promoted to admin",
        UserRole::User => "User demoted to user",
    };
    Ok(ApiResponse::ok(message, RoleResponse { user_id, role }))
}

async fn stats(
    AdminUser(_admin): AdminUser,
    State(state): State<ApiState>,
) -> Result<ApiResponse<PlatformStats>, ApiError> {
    let stats = admin_repo::platform_stats(&state.pool).await?;
    Ok(ApiResponse::ok("Platform stats retrieved", stats))
}

async fn flagged_comments(
    AdminUser(_admin): AdminUser,
    State(state): State<ApiState>,
    ValidatedQuery(page): ValidatedQuery<PageParams>,
) -> Result<ApiResponse<Vec<FlaggedComment>>, ApiError> {
    let page = Pagination::from(page);
    let (comments, total) = tokio::try_join!(
        comment_repo::list_flagged(&state.pool, page.limit, page.offset()),
        comment_repo::count_flagged(&state.pool),
    )?;

    Ok(ApiResponse::paginated(
        "Flagged comments retrieved",
        comments,
        page.meta(total),
    ))
}

async fn moderate_comment(
    AdminUser(admin): AdminUser,
    State(state): State<ApiState>,
    Path(comment_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ModerateRequest>,
) -> Result<ApiResponse<ModerationResponse>, ApiError> {
    let comment = comment_repo::find_access(&state.pool, comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;
    if comment.is_deleted {
        return Err(ApiError::BadRequest("Comment is already deleted".to_string()));
    }

    let applied = match payload.action {
        ModerationAction::Approve => comment_repo::approve(&state.pool, comment_id).await?,
        ModerationAction::Remove => {
            comment_repo::remove_by_moderator(&state.pool, comment_id).await?
        }
    };
    if !applied {
        return Err(ApiError::BadRequest("Comment is already deleted".to_string()));
    }

    tracing::info!(
        admin_id = %admin.user_id,
        comment_id = %comment_id,
        action = payload.action.past_tense(),
        "comment moderated"
    );

    Ok(ApiResponse::ok(
        "Comment moderated",
        ModerationResponse {
            comment_id,
            action: payload.action.past_tense(),
        },
    ))
}
