use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use mlp_db::{
    models::{NewTtsLibraryItem, TtsLibraryItem},
    pagination::{PageParams, Pagination},
    repositories::{lesson as lesson_repo, tts as tts_repo},
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{
    client::{SpeechRequest, TtsClient},
    cost,
    model::{
        BatchOutcome, BatchRequest, BatchResponse, Estimate, EstimateRequest, GenerateRequest,
        GeneratedAudio, LibraryFilter, VoicesResponse, library_title,
    },
};
use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    middleware::rate_limit,
    response::ApiResponse,
    validation::{ValidatedJson, ValidatedQuery},
};

pub fn routes() -> Router<ApiState> {
    use crate::make_rate_limit_layer;

    // Provider calls cost money, so they get their own limiter
    let synthesis_routes = Router::new()
        .route("/tts/generate", post(generate))
        .route("/tts/batch", post(batch))
        .layer(make_rate_limit_layer!(
            rate_limit::TTS_RATE_PER_SECOND,
            rate_limit::TTS_BURST_SIZE
        ));

    let catalog_routes = Router::new()
        .route("/tts/voices", get(voices))
        .route("/tts/estimate", post(estimate))
        .route("/tts/library", get(list_library))
        .route("/tts/library/{id}", get(get_library_item).delete(delete_library_item))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_RATE_PER_SECOND,
            rate_limit::GENERAL_BURST_SIZE
        ));

    Router::new().merge(synthesis_routes).merge(catalog_routes)
}

fn client(state: &ApiState) -> Result<&TtsClient, ApiError> {
    state.tts.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Text-to-speech is not configured".to_string())
    })
}

async fn voices() -> ApiResponse<VoicesResponse> {
    ApiResponse::ok("Voices retrieved", VoicesResponse::catalog())
}

async fn estimate(
    _auth_user: AuthUser,
    ValidatedJson(payload): ValidatedJson<EstimateRequest>,
) -> ApiResponse<Estimate> {
    let characters = cost::character_count(&payload.text);
    ApiResponse::ok(
        "Estimate calculated",
        Estimate {
            characters,
            model: payload.model,
            estimated_cost: cost::estimate_cost(characters, payload.model),
            estimated_duration_seconds: cost::estimate_duration_secs(&payload.text, payload.speed),
        },
    )
}

/// Synthesise one item and, when asked, store it in the caller's library.
async fn synthesize_item(
    pool: &PgPool,
    client: &TtsClient,
    user_id: Uuid,
    req: &GenerateRequest,
) -> Result<GeneratedAudio, ApiError> {
    // Fail before paying for audio we could not store
    if req.save
        && let Some(lesson_id) = req.lesson_id
        && !lesson_repo::exists(pool, lesson_id).await?
    {
        return Err(ApiError::not_found("Lesson"));
    }

    let audio = client
        .synthesize(&SpeechRequest {
            input: &req.text,
            voice: req.voice,
            model: req.model,
            format: req.format,
            speed: req.speed,
        })
        .await?;

    let characters = cost::character_count(&req.text);
    let mut generated = GeneratedAudio {
        audio_url: req.format.data_url(&audio),
        voice: req.voice,
        model: req.model,
        format: req.format,
        speed: req.speed,
        characters,
        cost: cost::estimate_cost(characters, req.model),
        duration_seconds: cost::estimate_duration_secs(&req.text, req.speed),
        library_item_id: None,
    };

    if req.save {
        let item = tts_repo::insert(
            pool,
            &NewTtsLibraryItem {
                user_id,
                lesson_id: req.lesson_id,
                title: library_title(req.title.as_deref(), &req.text),
                text: req.text.clone(),
                voice: req.voice.as_str().to_string(),
                model: req.model.as_str().to_string(),
                format: req.format.as_str().to_string(),
                speed: req.speed,
                characters: i32::try_from(characters)
                    .map_err(|_| ApiError::Validation("text: too long".to_string()))?,
                cost: generated.cost,
                duration_seconds: generated.duration_seconds,
                audio_url: generated.audio_url.clone(),
            },
        )
        .await?;
        generated.library_item_id = Some(item.id);
    }

    Ok(generated)
}

async fn generate(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedJson(payload): ValidatedJson<GenerateRequest>,
) -> Result<ApiResponse<GeneratedAudio>, ApiError> {
    let client = client(&state)?;
    let generated = synthesize_item(&state.pool, client, auth_user.user_id, &payload).await?;

    tracing::info!(
        user_id = %auth_user.user_id,
        characters = generated.characters,
        model = payload.model.as_str(),
        saved = generated.library_item_id.is_some(),
        "audio generated"
    );

    Ok(ApiResponse::ok("Audio generated", generated))
}

async fn batch(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedJson(payload): ValidatedJson<BatchRequest>,
) -> Result<ApiResponse<BatchResponse>, ApiError> {
    let client = client(&state)?;

    let mut outcomes = Vec::with_capacity(payload.items.len());
    for (index, item) in payload.items.iter().enumerate() {
        let result = match item.validate() {
            Ok(()) => synthesize_item(&state.pool, client, auth_user.user_id, item).await,
            Err(errors) => Err(errors.into()),
        };
        outcomes.push(match result {
            Ok(result) => BatchOutcome::Success { index, result },
            Err(err) => BatchOutcome::Failure {
                index,
                error: err.to_string(),
            },
        });
    }

    let response = BatchResponse::from_outcomes(outcomes);
    tracing::info!(
        user_id = %auth_user.user_id,
        succeeded = response.succeeded,
        failed = response.failed,
        "batch audio generated"
    );

    Ok(ApiResponse::ok("Batch processed", response))
}

async fn list_library(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedQuery(page): ValidatedQuery<PageParams>,
    ValidatedQuery(filter): ValidatedQuery<LibraryFilter>,
) -> Result<ApiResponse<Vec<TtsLibraryItem>>, ApiError> {
    let page = Pagination::from(page);
    let (items, total) = tokio::try_join!(
        tts_repo::list_for_user(
            &state.pool,
            auth_user.user_id,
            filter.lesson_id,
            page.limit,
            page.offset()
        ),
        tts_repo::count_for_user(&state.pool, auth_user.user_id, filter.lesson_id),
    )?;

    Ok(ApiResponse::paginated("Library retrieved", items, page.meta(total)))
}

async fn owned_item(
    pool: &PgPool,
    auth_user: &AuthUser,
    item_id: Uuid,
) -> Result<TtsLibraryItem, ApiError> {
    let item = tts_repo::find_by_id(pool, item_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Audio"))?;
    if item.user_id != auth_user.user_id {
        return Err(ApiError::Forbidden(
            "You do not have access to this audio".to_string(),
        ));
    }
    Ok(item)
}

async fn get_library_item(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(item_id): Path<Uuid>,
) -> Result<ApiResponse<TtsLibraryItem>, ApiError> {
    let item = owned_item(&state.pool, &auth_user, item_id).await?;
    Ok(ApiResponse::ok("Audio retrieved", item))
}

async fn delete_library_item(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(item_id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    owned_item(&state.pool, &auth_user, item_id).await?;

    if !tts_repo::delete_owned(&state.pool, item_id, auth_user.user_id).await? {
        return Err(ApiError::not_found("Audio"));
    }

    Ok(ApiResponse::ok("Audio deleted", ()))
}
