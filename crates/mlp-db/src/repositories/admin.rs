use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{AdminUserRow, PlatformStats, UserRole};
use crate::repositories::contains_pattern;

pub async fn list_users<'e, E>(
    executor: E,
    search: Option<&str>,
    role: Option<UserRole>,
    banned: Option<bool>,
    limit: i64,
    offset: i64,
) -> Result<Vec<AdminUserRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT u.id, u.username, u.email, u.role, u.is_banned, u.banned_at, u.created_at,
                   COALESCE(ps.total_xp, 0) AS total_xp, COALESCE(ps.level, 1) AS level
            FROM users u
            LEFT JOIN progress_stats ps ON ps.user_id = u.id
            WHERE ($1::text IS NULL OR u.username ILIKE $1 OR u.email ILIKE $1)
                AND ($2::user_role IS NULL OR u.role = $2)
                AND ($3::boolean IS NULL OR u.is_banned = $3)
            ORDER BY u.created_at DESC, u.id
            LIMIT $4 OFFSET $5
        "#,
    )
    .bind(search.map(contains_pattern))
    .bind(role)
    .bind(banned)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn count_users<'e, E>(
    executor: E,
    search: Option<&str>,
    role: Option<UserRole>,
    banned: Option<bool>,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM users u
            WHERE ($1::text IS NULL OR u.username ILIKE $1 OR u.email ILIKE $1)
                AND ($2::user_role IS NULL OR u.role = $2)
                AND ($3::boolean IS NULL OR u.is_banned = $3)
        "#,
    )
    .bind(search.map(contains_pattern))
    .bind(role)
    .bind(banned)
    .fetch_one(executor)
    .await
}

/// Flips the ban flag in place and returns the new value.
pub async fn toggle_ban<'e, E>(executor: E, user_id: Uuid) -> Result<Option<bool>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            UPDATE users
            SET is_banned = NOT is_banned,
                banned_at = CASE WHEN is_banned THEN NULL ELSE NOW() END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING is_banned
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Flips the role between `user` and `admin` and returns the new role.
pub async fn toggle_admin<'e, E>(executor: E, user_id: Uuid) -> Result<Option<UserRole>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            UPDATE users
            SET role = CASE WHEN role = 'admin' THEN 'user'::user_role ELSE 'admin'::user_role END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING role
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn platform_stats<'e, E>(executor: E) -> Result<PlatformStats, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM users WHERE is_banned = true) AS banned_users,
                (SELECT COUNT(*) FROM users WHERE role = 'admin') AS admins,
                (SELECT COUNT(*) FROM lessons) AS lessons,
                (SELECT COUNT(*) FROM lessons WHERE is_published = true) AS published_lessons,
                (SELECT COUNT(*) FROM comments WHERE is_deleted = false) AS comments,
                (SELECT COUNT(*) FROM comments WHERE is_flagged = true AND is_deleted = false) AS flagged_comments,
                (SELECT COUNT(*) FROM challenges WHERE is_active = true AND ends_at > NOW()) AS active_challenges,
                (SELECT COUNT(*) FROM progress_shares) AS shares,
                (SELECT COUNT(*) FROM tts_library_items) AS tts_items,
                (SELECT COUNT(*) FROM file_metadata) AS files
        "#,
    )
    .fetch_one(executor)
    .await
}
