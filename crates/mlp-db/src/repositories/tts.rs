use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{NewTtsLibraryItem, TtsLibraryItem};

pub async fn insert<'e, E>(executor: E, item: &NewTtsLibraryItem) -> Result<TtsLibraryItem, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO tts_library_items (user_id, lesson_id, title, text, voice, model, format, speed,
                                           characters, cost, duration_seconds, audio_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, user_id, lesson_id, title, text, voice, model, format, speed, characters,
                      cost, duration_seconds, audio_url, created_at
        "#,
    )
    .bind(item.user_id)
    .bind(item.lesson_id)
    .bind(&item.title)
    .bind(&item.text)
    .bind(&item.voice)
    .bind(&item.model)
    .bind(&item.format)
    .bind(item.speed)
    .bind(item.characters)
    .bind(item.cost)
    .bind(item.duration_seconds)
    .bind(&item.audio_url)
    .fetch_one(executor)
    .await
}

pub async fn list_for_user<'e, E>(
    executor: E,
    user_id: Uuid,
    lesson_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<Vec<TtsLibraryItem>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, lesson_id, title, text, voice, model, format, speed, characters,
                   cost, duration_seconds, audio_url, created_at
            FROM tts_library_items
            WHERE user_id = $1 AND ($2::uuid IS NULL OR lesson_id = $2)
            ORDER BY created_at DESC, id
            LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user_id)
    .bind(lesson_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn count_for_user<'e, E>(
    executor: E,
    user_id: Uuid,
    lesson_id: Option<Uuid>,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM tts_library_items
            WHERE user_id = $1 AND ($2::uuid IS NULL OR lesson_id = $2)
        "#,
    )
    .bind(user_id)
    .bind(lesson_id)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id<'e, E>(executor: E, item_id: Uuid) -> Result<Option<TtsLibraryItem>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, lesson_id, title, text, voice, model, format, speed, characters,
                   cost, duration_seconds, audio_url, created_at
            FROM tts_library_items
            WHERE id = $1
        "#,
    )
    .bind(item_id)
    .fetch_optional(executor)
    .await
}

pub async fn delete_owned<'e, E>(executor: E, item_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM tts_library_items
            WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(item_id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
