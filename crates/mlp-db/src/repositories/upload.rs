use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{FileMetadata, NewFileMetadata};

pub async fn insert<'e, E>(executor: E, file: &NewFileMetadata) -> Result<FileMetadata, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO file_metadata (user_id, key, file_name, url, size_bytes, mime_type, is_public)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, key, file_name, url, size_bytes, mime_type, is_public, created_at
        "#,
    )
    .bind(file.user_id)
    .bind(&file.key)
    .bind(&file.file_name)
    .bind(&file.url)
    .bind(file.size_bytes)
    .bind(&file.mime_type)
    .bind(file.is_public)
    .fetch_one(executor)
    .await
}

pub async fn list_for_user<'e, E>(
    executor: E,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<FileMetadata>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, key, file_name, url, size_bytes, mime_type, is_public, created_at
            FROM file_metadata
            WHERE user_id = $1
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn count_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM file_metadata
            WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id<'e, E>(executor: E, file_id: Uuid) -> Result<Option<FileMetadata>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, key, file_name, url, size_bytes, mime_type, is_public, created_at
            FROM file_metadata
            WHERE id = $1
        "#,
    )
    .bind(file_id)
    .fetch_optional(executor)
    .await
}

pub async fn set_visibility<'e, E>(
    executor: E,
    file_id: Uuid,
    owner_id: Uuid,
    is_public: bool,
) -> Result<Option<FileMetadata>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE file_metadata
            SET is_public = $3
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, key, file_name, url, size_bytes, mime_type, is_public, created_at
        "#,
    )
    .bind(file_id)
    .bind(owner_id)
    .bind(is_public)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e, E>(
    executor: E,
    file_id: Uuid,
    actor_id: Uuid,
    is_admin: bool,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM file_metadata
            WHERE id = $1 AND (user_id = $2 OR $3)
        "#,
    )
    .bind(file_id)
    .bind(actor_id)
    .bind(is_admin)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
