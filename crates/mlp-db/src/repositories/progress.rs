use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{ActivityEntry, ActivityType, Milestone, ProgressStats, StatCounter, StatsRecount};

// --- Stats snapshot ---

pub async fn find_stats<'e, E>(executor: E, user_id: Uuid) -> Result<Option<ProgressStats>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT user_id, total_xp, level, current_streak, longest_streak, lessons_completed,
                   challenges_completed, shares_count, comments_count, last_activity_at, updated_at
            FROM progress_stats
            WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Adds XP (creating the snapshot row if missing) and returns the updated total.
pub async fn add_xp<'e, E>(executor: E, user_id: Uuid, xp: i64) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            INSERT INTO progress_stats (user_id, total_xp, last_activity_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET
                total_xp = progress_stats.total_xp + $2,
                last_activity_at = NOW(),
                updated_at = NOW()
            RETURNING total_xp
        "#,
    )
    .bind(user_id)
    .bind(xp)
    .fetch_one(executor)
    .await
}

pub async fn set_level<'e, E>(executor: E, user_id: Uuid, level: i32) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE progress_stats
            SET level = $2, updated_at = NOW()
            WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(level)
    .execute(executor)
    .await?;
    Ok(())
}

/// Bumps one counter column by `delta` and returns the refreshed snapshot.
pub async fn increment_counter<'e, E>(
    executor: E,
    user_id: Uuid,
    counter: StatCounter,
    delta: i32,
) -> Result<ProgressStats, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let column = counter.column();
    let sql = format!(
        // language=PostgreSQL
        r#"
            INSERT INTO progress_stats (user_id, {column}, last_activity_at)
            VALUES ($1, GREATEST($2, 0), NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET
                {column} = GREATEST(progress_stats.{column} + $2, 0),
                last_activity_at = NOW(),
                updated_at = NOW()
            RETURNING user_id, total_xp, level, current_streak, longest_streak, lessons_completed,
                      challenges_completed, shares_count, comments_count, last_activity_at, updated_at
        "#
    );
    sqlx::query_as(&sql)
        .bind(user_id)
        .bind(delta)
        .fetch_one(executor)
        .await
}

pub async fn set_streak<'e, E>(
    executor: E,
    user_id: Uuid,
    current_streak: i32,
    longest_streak: i32,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE progress_stats
            SET current_streak = $2,
                longest_streak = GREATEST(longest_streak, $3),
                updated_at = NOW()
            WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(current_streak)
    .bind(longest_streak)
    .execute(executor)
    .await?;
    Ok(())
}

/// Recomputes every snapshot field from the tables that own the underlying facts.
///
/// XP and completion counts come from the activity ledger: lesson and challenge
/// rows cascade away with their parent, but earned XP stays earned.
pub async fn recount<'e, E>(executor: E, user_id: Uuid) -> Result<StatsRecount, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT
                COALESCE((SELECT SUM(xp_earned) FROM activity_feed WHERE user_id = $1), 0)::BIGINT AS total_xp,
                (SELECT COUNT(*) FROM activity_feed
                 WHERE user_id = $1 AND activity_type = 'lesson_completed')::INTEGER AS lessons_completed,
                (SELECT COUNT(*) FROM activity_feed
                 WHERE user_id = $1 AND activity_type = 'challenge_completed')::INTEGER AS challenges_completed,
                (SELECT COUNT(*) FROM progress_shares WHERE user_id = $1)::INTEGER AS shares_count,
                (SELECT COUNT(*) FROM comments WHERE user_id = $1 AND is_deleted = false)::INTEGER AS comments_count,
                COALESCE((SELECT current_streak FROM challenge_streaks WHERE user_id = $1), 0) AS current_streak,
                COALESCE((SELECT longest_streak FROM challenge_streaks WHERE user_id = $1), 0) AS longest_streak
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
}

pub async fn store_recount<'e, E>(
    executor: E,
    user_id: Uuid,
    recount: &StatsRecount,
    level: i32,
) -> Result<ProgressStats, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO progress_stats (user_id, total_xp, level, current_streak, longest_streak,
                                        lessons_completed, challenges_completed, shares_count, comments_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id)
            DO UPDATE SET
                total_xp = $2,
                level = $3,
                current_streak = $4,
                longest_streak = $5,
                lessons_completed = $6,
                challenges_completed = $7,
                shares_count = $8,
                comments_count = $9,
                updated_at = NOW()
            RETURNING user_id, total_xp, level, current_streak, longest_streak, lessons_completed,
                      challenges_completed, shares_count, comments_count, last_activity_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(recount.total_xp)
    .bind(level)
    .bind(recount.current_streak)
    .bind(recount.longest_streak)
    .bind(recount.lessons_completed)
    .bind(recount.challenges_completed)
    .bind(recount.shares_count)
    .bind(recount.comments_count)
    .fetch_one(executor)
    .await
}

// --- Activity feed ---

pub async fn insert_activity<'e, E>(
    executor: E,
    user_id: Uuid,
    activity_type: ActivityType,
    description: &str,
    xp_earned: i32,
    reference_id: Option<Uuid>,
    metadata: &serde_json::Value,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO activity_feed (user_id, activity_type, description, xp_earned, reference_id, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(activity_type)
    .bind(description)
    .bind(xp_earned)
    .bind(reference_id)
    .bind(metadata)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list_activity<'e, E>(
    executor: E,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<ActivityEntry>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, activity_type, description, xp_earned, reference_id, metadata, created_at
            FROM activity_feed
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

pub async fn count_activity<'e, E>(executor: E, user_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM activity_feed
            WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
}

// --- Milestones ---

/// Awards a milestone once per user. Returns `true` on the first award.
pub async fn award_milestone<'e, E>(
    executor: E,
    user_id: Uuid,
    milestone_type: &str,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO progress_milestones (user_id, milestone_type)
            VALUES ($1, $2)
            ON CONFLICT ON CONSTRAINT progress_milestones_user_type_key DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(milestone_type)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_milestones<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Milestone>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, milestone_type, achieved_at
            FROM progress_milestones
            WHERE user_id = $1
            ORDER BY achieved_at, milestone_type
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}
