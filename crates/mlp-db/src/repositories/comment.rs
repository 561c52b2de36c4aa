use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{Comment, CommentAccess, CommentSort, FlaggedComment};

pub const DELETED_CONTENT: &str = "[Deleted]";

pub async fn list_top_level<'e, E>(
    executor: E,
    lesson_id: Uuid,
    viewer_id: Option<Uuid>,
    sort: CommentSort,
    limit: i64,
    offset: i64,
) -> Result<Vec<Comment>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        // language=PostgreSQL
        r#"
            SELECT c.id, c.lesson_id, c.user_id, u.username AS author_username, c.parent_comment_id,
                   c.content, c.likes_count, c.is_edited, c.edited_at, c.is_deleted, c.is_flagged,
                   c.flag_count,
                   (SELECT COUNT(*) FROM comments r
                    WHERE r.parent_comment_id = c.id AND r.is_deleted = false) AS reply_count,
                   EXISTS(SELECT 1 FROM comment_likes cl
                          WHERE cl.comment_id = c.id AND cl.user_id = $2) AS is_liked,
                   c.created_at, c.updated_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.lesson_id = $1 AND c.parent_comment_id IS NULL AND c.is_deleted = false
            ORDER BY {}, c.id
            LIMIT $3 OFFSET $4
        "#,
        sort.order_by()
    );
    sqlx::query_as(&sql)
        .bind(lesson_id)
        .bind(viewer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
}

pub async fn count_top_level<'e, E>(executor: E, lesson_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM comments
            WHERE lesson_id = $1 AND parent_comment_id IS NULL AND is_deleted = false
        "#,
    )
    .bind(lesson_id)
    .fetch_one(executor)
    .await
}

/// First `per_parent` live replies (oldest first) of each parent, in one round trip.
pub async fn list_reply_previews<'e, E>(
    executor: E,
    parent_ids: &[Uuid],
    viewer_id: Option<Uuid>,
    per_parent: i64,
) -> Result<Vec<Comment>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT t.*
            FROM (
                SELECT c.id, c.lesson_id, c.user_id, u.username AS author_username, c.parent_comment_id,
                       c.content, c.likes_count, c.is_edited, c.edited_at, c.is_deleted, c.is_flagged,
                       c.flag_count, 0::BIGINT AS reply_count,
                       EXISTS(SELECT 1 FROM comment_likes cl
                              WHERE cl.comment_id = c.id AND cl.user_id = $2) AS is_liked,
                       c.created_at, c.updated_at,
                       ROW_NUMBER() OVER (PARTITION BY c.parent_comment_id ORDER BY c.created_at, c.id) AS rn
                FROM comments c
                JOIN users u ON u.id = c.user_id
                WHERE c.parent_comment_id = ANY($1) AND c.is_deleted = false
            ) t
            WHERE t.rn <= $3
            ORDER BY t.parent_comment_id, t.created_at, t.id
        "#,
    )
    .bind(parent_ids)
    .bind(viewer_id)
    .bind(per_parent)
    .fetch_all(executor)
    .await
}

pub async fn list_replies<'e, E>(
    executor: E,
    parent_id: Uuid,
    viewer_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Comment>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT c.id, c.lesson_id, c.user_id, u.username AS author_username, c.parent_comment_id,
                   c.content, c.likes_count, c.is_edited, c.edited_at, c.is_deleted, c.is_flagged,
                   c.flag_count, 0::BIGINT AS reply_count,
                   EXISTS(SELECT 1 FROM comment_likes cl
                          WHERE cl.comment_id = c.id AND cl.user_id = $2) AS is_liked,
                   c.created_at, c.updated_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.parent_comment_id = $1 AND c.is_deleted = false
            ORDER BY c.created_at, c.id
            LIMIT $3 OFFSET $4
        "#,
    )
    .bind(parent_id)
    .bind(viewer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn count_replies<'e, E>(executor: E, parent_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM comments
            WHERE parent_comment_id = $1 AND is_deleted = false
        "#,
    )
    .bind(parent_id)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id<'e, E>(
    executor: E,
    comment_id: Uuid,
    viewer_id: Option<Uuid>,
) -> Result<Option<Comment>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT c.id, c.lesson_id, c.user_id, u.username AS author_username, c.parent_comment_id,
                   c.content, c.likes_count, c.is_edited, c.edited_at, c.is_deleted, c.is_flagged,
                   c.flag_count,
                   (SELECT COUNT(*) FROM comments r
                    WHERE r.parent_comment_id = c.id AND r.is_deleted = false) AS reply_count,
                   EXISTS(SELECT 1 FROM comment_likes cl
                          WHERE cl.comment_id = c.id AND cl.user_id = $2) AS is_liked,
                   c.created_at, c.updated_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.id = $1
        "#,
    )
    .bind(comment_id)
    .bind(viewer_id)
    .fetch_optional(executor)
    .await
}

pub async fn find_access<'e, E>(
    executor: E,
    comment_id: Uuid,
) -> Result<Option<CommentAccess>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, lesson_id, user_id, parent_comment_id, is_deleted
            FROM comments
            WHERE id = $1
        "#,
    )
    .bind(comment_id)
    .fetch_optional(executor)
    .await
}

pub async fn create<'e, E>(
    executor: E,
    lesson_id: Uuid,
    user_id: Uuid,
    parent_comment_id: Option<Uuid>,
    content: &str,
) -> Result<Uuid, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            INSERT INTO comments (lesson_id, user_id, parent_comment_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id
        "#,
    )
    .bind(lesson_id)
    .bind(user_id)
    .bind(parent_comment_id)
    .bind(content)
    .fetch_one(executor)
    .await
}

/// Edits a live comment owned by `author_id`. Returns `false` when no row matched.
pub async fn update_content<'e, E>(
    executor: E,
    comment_id: Uuid,
    author_id: Uuid,
    content: &str,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE comments
            SET content = $3, is_edited = true, edited_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND is_deleted = false
        "#,
    )
    .bind(comment_id)
    .bind(author_id)
    .bind(content)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Soft delete by the author, or by anyone when `is_admin` holds.
pub async fn soft_delete<'e, E>(
    executor: E,
    comment_id: Uuid,
    actor_id: Uuid,
    is_admin: bool,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE comments
            SET is_deleted = true, deleted_at = NOW(), content = $4, updated_at = NOW()
            WHERE id = $1 AND (user_id = $2 OR $3) AND is_deleted = false
        "#,
    )
    .bind(comment_id)
    .bind(actor_id)
    .bind(is_admin)
    .bind(DELETED_CONTENT)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

// --- Likes ---

/// Returns `true` when the like was newly recorded.
pub async fn insert_like<'e, E>(executor: E, comment_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO comment_likes (comment_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (comment_id, user_id) DO NOTHING
        "#,
    )
    .bind(comment_id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_like<'e, E>(executor: E, comment_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM comment_likes
            WHERE comment_id = $1 AND user_id = $2
        "#,
    )
    .bind(comment_id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Adds `delta` to the like counter in place and returns the new value.
pub async fn adjust_likes<'e, E>(executor: E, comment_id: Uuid, delta: i32) -> Result<i32, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            UPDATE comments
            SET likes_count = GREATEST(likes_count + $2, 0)
            WHERE id = $1
            RETURNING likes_count
        "#,
    )
    .bind(comment_id)
    .bind(delta)
    .fetch_one(executor)
    .await
}

// --- Reports & moderation ---

pub async fn insert_report<'e, E>(
    executor: E,
    comment_id: Uuid,
    user_id: Uuid,
    reason: &str,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO comment_reports (comment_id, user_id, reason)
            VALUES ($1, $2, $3)
        "#,
    )
    .bind(comment_id)
    .bind(user_id)
    .bind(reason)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn flag<'e, E>(executor: E, comment_id: Uuid) -> Result<i32, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            UPDATE comments
            SET flag_count = flag_count + 1, is_flagged = true
            WHERE id = $1
            RETURNING flag_count
        "#,
    )
    .bind(comment_id)
    .fetch_one(executor)
    .await
}

pub async fn list_flagged<'e, E>(
    executor: E,
    limit: i64,
    offset: i64,
) -> Result<Vec<FlaggedComment>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT c.id, c.lesson_id, l.title AS lesson_title, c.user_id, u.username AS author_username,
                   c.content, c.flag_count,
                   (SELECT cr.reason FROM comment_reports cr
                    WHERE cr.comment_id = c.id
                    ORDER BY cr.created_at DESC
                    LIMIT 1) AS latest_reason,
                   c.created_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            JOIN lessons l ON l.id = c.lesson_id
            WHERE c.is_flagged = true AND c.is_deleted = false
            ORDER BY c.flag_count DESC, c.created_at DESC
            LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn count_flagged<'e, E>(executor: E) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM comments
            WHERE is_flagged = true AND is_deleted = false
        "#,
    )
    .fetch_one(executor)
    .await
}

/// Clears moderation flags after an admin review.
pub async fn approve<'e, E>(executor: E, comment_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE comments
            SET is_flagged = false, flag_count = 0, moderated_at = NOW()
            WHERE id = $1 AND is_deleted = false
        "#,
    )
    .bind(comment_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove_by_moderator<'e, E>(executor: E, comment_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE comments
            SET is_deleted = true, deleted_at = NOW(), content = $2, is_flagged = false,
                moderated_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND is_deleted = false
        "#,
    )
    .bind(comment_id)
    .bind(DELETED_CONTENT)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
