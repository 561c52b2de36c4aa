use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{Lesson, LessonAccess, LessonChanges, LessonFilter, NewLesson};
use crate::repositories::contains_pattern;

pub async fn list_published<'e, E>(
    executor: E,
    filter: &LessonFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Lesson>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT l.id, l.author_id, u.username AS author_username, l.title, l.summary, l.content,
                   l.category, l.difficulty, l.duration_minutes, l.xp_reward, l.tags, l.audio_url,
                   l.is_published, l.view_count, l.created_at, l.updated_at
            FROM lessons l
            JOIN users u ON u.id = l.author_id
            WHERE l.is_published = true
                AND ($1::text IS NULL OR l.category = $1)
                AND ($2::lesson_difficulty IS NULL OR l.difficulty = $2)
                AND ($3::text IS NULL OR $3 = ANY(l.tags))
                AND ($4::text IS NULL OR l.title ILIKE $4 OR l.summary ILIKE $4)
            ORDER BY l.created_at DESC, l.id
            LIMIT $5 OFFSET $6
        "#,
    )
    .bind(filter.category.as_deref())
    .bind(filter.difficulty)
    .bind(filter.tag.as_deref())
    .bind(filter.search.as_deref().map(contains_pattern))
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn count_published<'e, E>(executor: E, filter: &LessonFilter) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM lessons l
            WHERE l.is_published = true
                AND ($1::text IS NULL OR l.category = $1)
                AND ($2::lesson_difficulty IS NULL OR l.difficulty = $2)
                AND ($3::text IS NULL OR $3 = ANY(l.tags))
                AND ($4::text IS NULL OR l.title ILIKE $4 OR l.summary ILIKE $4)
        "#,
    )
    .bind(filter.category.as_deref())
    .bind(filter.difficulty)
    .bind(filter.tag.as_deref())
    .bind(filter.search.as_deref().map(contains_pattern))
    .fetch_one(executor)
    .await
}

pub async fn find_by_id<'e, E>(executor: E, lesson_id: Uuid) -> Result<Option<Lesson>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT l.id, l.author_id, u.username AS author_username, l.title, l.summary, l.content,
                   l.category, l.difficulty, l.duration_minutes, l.xp_reward, l.tags, l.audio_url,
                   l.is_published, l.view_count, l.created_at, l.updated_at
            FROM lessons l
            JOIN users u ON u.id = l.author_id
            WHERE l.id = $1
        "#,
    )
    .bind(lesson_id)
    .fetch_optional(executor)
    .await
}

pub async fn find_access<'e, E>(
    executor: E,
    lesson_id: Uuid,
) -> Result<Option<LessonAccess>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, author_id, is_published, xp_reward
            FROM lessons
            WHERE id = $1
        "#,
    )
    .bind(lesson_id)
    .fetch_optional(executor)
    .await
}

pub async fn exists<'e, E>(executor: E, lesson_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT EXISTS(SELECT 1 FROM lessons WHERE id = $1)
        "#,
    )
    .bind(lesson_id)
    .fetch_one(executor)
    .await
}

/// Atomically bumps the view counter and returns the new value.
pub async fn increment_views<'e, E>(executor: E, lesson_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            UPDATE lessons
            SET view_count = view_count + 1
            WHERE id = $1
            RETURNING view_count
        "#,
    )
    .bind(lesson_id)
    .fetch_one(executor)
    .await
}

pub async fn create<'e, E>(executor: E, lesson: &NewLesson) -> Result<Uuid, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            INSERT INTO lessons (author_id, title, summary, content, category, difficulty,
                                 duration_minutes, xp_reward, tags, audio_url, is_published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
        "#,
    )
    .bind(lesson.author_id)
    .bind(&lesson.title)
    .bind(lesson.summary.as_deref())
    .bind(&lesson.content)
    .bind(&lesson.category)
    .bind(lesson.difficulty)
    .bind(lesson.duration_minutes)
    .bind(lesson.xp_reward)
    .bind(&lesson.tags)
    .bind(lesson.audio_url.as_deref())
    .bind(lesson.is_published)
    .fetch_one(executor)
    .await
}

/// Applies a partial update when `editor_id` is the author or `is_admin` holds.
/// Returns `false` when no row matched.
pub async fn update<'e, E>(
    executor: E,
    lesson_id: Uuid,
    editor_id: Uuid,
    is_admin: bool,
    changes: &LessonChanges,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE lessons
            SET title = COALESCE($4, title),
                summary = COALESCE($5, summary),
                content = COALESCE($6, content),
                category = COALESCE($7, category),
                difficulty = COALESCE($8, difficulty),
                duration_minutes = COALESCE($9, duration_minutes),
                xp_reward = COALESCE($10, xp_reward),
                tags = COALESCE($11, tags),
                audio_url = COALESCE($12, audio_url),
                is_published = COALESCE($13, is_published),
                updated_at = NOW()
            WHERE id = $1 AND (author_id = $2 OR $3)
        "#,
    )
    .bind(lesson_id)
    .bind(editor_id)
    .bind(is_admin)
    .bind(changes.title.as_deref())
    .bind(changes.summary.as_deref())
    .bind(changes.content.as_deref())
    .bind(changes.category.as_deref())
    .bind(changes.difficulty)
    .bind(changes.duration_minutes)
    .bind(changes.xp_reward)
    .bind(changes.tags.as_deref())
    .bind(changes.audio_url.as_deref())
    .bind(changes.is_published)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete<'e, E>(
    executor: E,
    lesson_id: Uuid,
    actor_id: Uuid,
    is_admin: bool,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM lessons
            WHERE id = $1 AND (author_id = $2 OR $3)
        "#,
    )
    .bind(lesson_id)
    .bind(actor_id)
    .bind(is_admin)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Records a first completion. Returns `false` if the user had already completed the lesson.
pub async fn record_completion<'e, E>(
    executor: E,
    user_id: Uuid,
    lesson_id: Uuid,
    xp_awarded: i32,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO lesson_completions (user_id, lesson_id, xp_awarded)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, lesson_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(lesson_id)
    .bind(xp_awarded)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
