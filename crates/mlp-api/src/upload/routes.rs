use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use mlp_db::{
    models::{FileMetadata, NewFileMetadata},
    pagination::{PageParams, Pagination},
    repositories::upload as upload_repo,
};
use uuid::Uuid;

use super::model::{
    PRESIGN_TTL_SECS, PresignRequest, PresignResponse, RecordUploadRequest, UpdateUploadRequest,
    file_url, is_allowed_mime, is_owned_key, local_upload_url, object_key,
};
use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    response::ApiResponse,
    validation::{ValidatedJson, ValidatedQuery},
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/uploads/presign", post(presign))
        .route("/uploads", get(list_uploads).post(record_upload))
        .route(
            "/uploads/{id}",
            get(get_upload).patch(update_upload).delete(delete_upload),
        )
}

fn check_file(state: &ApiState, content_type: &str, size: i64) -> Result<(), ApiError> {
    if !is_allowed_mime(content_type) {
        return Err(ApiError::Validation(format!(
            "contentType: {content_type} is not an allowed file type"
        )));
    }
    if size > state.uploads.max_bytes {
        return Err(ApiError::Validation(format!(
            "size: must not exceed {} bytes",
            state.uploads.max_bytes
        )));
    }
    Ok(())
}

async fn presign(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedJson(payload): ValidatedJson<PresignRequest>,
) -> Result<ApiResponse<PresignResponse>, ApiError> {
    check_file(&state, &payload.content_type, payload.size)?;

    let key = object_key(auth_user.user_id, Uuid::new_v4(), &payload.file_name);
    let base_url = &state.uploads.base_url;

    Ok(ApiResponse::ok(
        "Upload URL created",
        PresignResponse {
            upload_url: local_upload_url(base_url, &key),
            file_url: file_url(base_url, &key),
            key,
            method: "PUT",
            expires_in: PRESIGN_TTL_SECS,
        },
    ))
}

async fn record_upload(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedJson(payload): ValidatedJson<RecordUploadRequest>,
) -> Result<ApiResponse<FileMetadata>, ApiError> {
    if !is_owned_key(&payload.key, auth_user.user_id) {
        return Err(ApiError::Forbidden(
            "Upload key does not belong to you".to_string(),
        ));
    }
    check_file(&state, &payload.content_type, payload.size)?;

    let file = upload_repo::insert(
        &state.pool,
        &NewFileMetadata {
            user_id: auth_user.user_id,
            url: file_url(&state.uploads.base_url, &payload.key),
            key: payload.key,
            file_name: payload.file_name,
            size_bytes: payload.size,
            mime_type: payload.content_type.to_ascii_lowercase(),
            is_public: payload.is_public,
        },
    )
    .await
    .map_err(ApiError::on_duplicate("File already recorded"))?;

    tracing::info!(user_id = %auth_user.user_id, file_id = %file.id, size = file.size_bytes, "upload recorded");

    Ok(ApiResponse::created("Upload recorded", file))
}

async fn list_uploads(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedQuery(page): ValidatedQuery<PageParams>,
) -> Result<ApiResponse<Vec<FileMetadata>>, ApiError> {
    let page = Pagination::from(page);
    let (files, total) = tokio::try_join!(
        upload_repo::list_for_user(&state.pool, auth_user.user_id, page.limit, page.offset()),
        upload_repo::count_for_user(&state.pool, auth_user.user_id),
    )?;

    Ok(ApiResponse::paginated("Uploads retrieved", files, page.meta(total)))
}

/// Private files are reported missing to everyone but their owner.
async fn get_upload(
    viewer: Option<AuthUser>,
    State(state): State<ApiState>,
    Path(file_id): Path<Uuid>,
) -> Result<ApiResponse<FileMetadata>, ApiError> {
    let file = upload_repo::find_by_id(&state.pool, file_id)
        .await?
        .filter(|f| f.is_public || viewer.as_ref().is_some_and(|v| v.user_id == f.user_id))
        .ok_or_else(|| ApiError::not_found("File"))?;

    Ok(ApiResponse::ok("Upload retrieved", file))
}

async fn update_upload(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(file_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateUploadRequest>,
) -> Result<ApiResponse<FileMetadata>, ApiError> {
    let file = upload_repo::find_by_id(&state.pool, file_id)
        .await?
        .ok_or_else(|| ApiError::not_found("File"))?;
    if file.user_id != auth_user.user_id {
        return Err(ApiError::Forbidden(
            "Only the owner can change this file".to_string(),
        ));
    }

    let file = upload_repo::set_visibility(&state.pool, file_id, auth_user.user_id, payload.is_public)
        .await?
        .ok_or_else(|| ApiError::not_found("File"))?;

    Ok(ApiResponse::ok("Upload updated", file))
}

async fn delete_upload(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(file_id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    let file = upload_repo::find_by_id(&state.pool, file_id)
        .await?
        .ok_or_else(|| ApiError::not_found("File"))?;
    if !auth_user.can_manage(file.user_id) {
        return Err(ApiError::Forbidden(
            "You cannot delete this file".to_string(),
        ));
    }

    if !upload_repo::delete(&state.pool, file_id, auth_user.user_id, auth_user.is_admin()).await? {
        return Err(ApiError::not_found("File"));
    }

    Ok(ApiResponse::ok("Upload deleted", ()))
}
