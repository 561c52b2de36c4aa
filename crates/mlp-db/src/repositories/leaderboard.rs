use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{LeaderboardRow, LeaderboardSort};

pub async fn list<'e, E>(
    executor: E,
    sort: LeaderboardSort,
    limit: i64,
    offset: i64,
) -> Result<Vec<LeaderboardRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        // language=PostgreSQL
        r#"
            SELECT u.id AS user_id, u.username, ps.total_xp, ps.level, ps.current_streak, ps.lessons_completed
            FROM progress_stats ps
            JOIN users u ON u.id = ps.user_id
            WHERE u.is_banned = false
            ORDER BY {}, u.id
            LIMIT $1 OFFSET $2
        "#,
        sort.order_by()
    );
    sqlx::query_as(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
}

pub async fn count<'e, E>(executor: E) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM progress_stats ps
            JOIN users u ON u.id = ps.user_id
            WHERE u.is_banned = false
        "#,
    )
    .fetch_one(executor)
    .await
}

/// Number of ranked users with strictly more XP than `user_id`.
pub async fn count_ahead_by_xp<'e, E>(executor: E, user_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM progress_stats ps
            JOIN users u ON u.id = ps.user_id
            WHERE u.is_banned = false
                AND ps.total_xp > (SELECT total_xp FROM progress_stats WHERE user_id = $1)
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
}
