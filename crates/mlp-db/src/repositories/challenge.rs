use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{
    Challenge, ChallengeChanges, ChallengeHistoryEntry, ChallengePeriod, ChallengeProgress,
    ChallengeRankingRow, ChallengeType, ChallengeWithProgress, NewChallenge, PendingChallenge,
    StreakMilestone, StreakRecord,
};

// --- Challenge definitions ---

/// Challenges open at `now`, with `viewer_id`'s progress joined in when present.
pub async fn list_open<'e, E>(
    executor: E,
    period: Option<ChallengePeriod>,
    viewer_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<Vec<ChallengeWithProgress>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT c.id, c.title, c.description, c.challenge_type, c.period, c.difficulty, c.target,
                   c.reward_xp, c.reward_badge, c.starts_at, c.ends_at, c.is_active, c.created_by,
                   c.created_at, c.updated_at,
                   cp.id IS NOT NULL AS joined,
                   cp.progress, cp.is_completed, cp.is_claimed
            FROM challenges c
            LEFT JOIN challenge_progress cp ON cp.challenge_id = c.id AND cp.user_id = $2
            WHERE c.is_active = true
                AND c.starts_at <= $3 AND c.ends_at > $3
                AND ($1::challenge_period IS NULL OR c.period = $1)
            ORDER BY c.ends_at, c.created_at
        "#,
    )
    .bind(period)
    .bind(viewer_id)
    .bind(now)
    .fetch_all(executor)
    .await
}

pub async fn find_with_progress<'e, E>(
    executor: E,
    challenge_id: Uuid,
    viewer_id: Option<Uuid>,
) -> Result<Option<ChallengeWithProgress>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT c.id, c.title, c.description, c.challenge_type, c.period, c.difficulty, c.target,
                   c.reward_xp, c.reward_badge, c.starts_at, c.ends_at, c.is_active, c.created_by,
                   c.created_at, c.updated_at,
                   cp.id IS NOT NULL AS joined,
                   cp.progress, cp.is_completed, cp.is_claimed
            FROM challenges c
            LEFT JOIN challenge_progress cp ON cp.challenge_id = c.id AND cp.user_id = $2
            WHERE c.id = $1
        "#,
    )
    .bind(challenge_id)
    .bind(viewer_id)
    .fetch_optional(executor)
    .await
}

pub async fn find_by_id<'e, E>(executor: E, challenge_id: Uuid) -> Result<Option<Challenge>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, title, description, challenge_type, period, difficulty, target, reward_xp,
                   reward_badge, starts_at, ends_at, is_active, created_by, created_at, updated_at
            FROM challenges
            WHERE id = $1
        "#,
    )
    .bind(challenge_id)
    .fetch_optional(executor)
    .await
}

pub async fn create<'e, E>(executor: E, challenge: &NewChallenge) -> Result<Challenge, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO challenges (title, description, challenge_type, period, difficulty, target,
                                    reward_xp, reward_badge, starts_at, ends_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, title, description, challenge_type, period, difficulty, target, reward_xp,
                      reward_badge, starts_at, ends_at, is_active, created_by, created_at, updated_at
        "#,
    )
    .bind(&challenge.title)
    .bind(&challenge.description)
    .bind(challenge.challenge_type)
    .bind(challenge.period)
    .bind(challenge.difficulty)
    .bind(challenge.target)
    .bind(challenge.reward_xp)
    .bind(challenge.reward_badge.as_deref())
    .bind(challenge.starts_at)
    .bind(challenge.ends_at)
    .bind(challenge.created_by)
    .fetch_one(executor)
    .await
}

pub async fn update<'e, E>(
    executor: E,
    challenge_id: Uuid,
    changes: &ChallengeChanges,
) -> Result<Option<Challenge>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE challenges
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                reward_xp = COALESCE($4, reward_xp),
                reward_badge = COALESCE($5, reward_badge),
                ends_at = COALESCE($6, ends_at),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, challenge_type, period, difficulty, target, reward_xp,
                      reward_badge, starts_at, ends_at, is_active, created_by, created_at, updated_at
        "#,
    )
    .bind(challenge_id)
    .bind(changes.title.as_deref())
    .bind(changes.description.as_deref())
    .bind(changes.reward_xp)
    .bind(changes.reward_badge.as_deref())
    .bind(changes.ends_at)
    .bind(changes.is_active)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e, E>(executor: E, challenge_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM challenges
            WHERE id = $1
        "#,
    )
    .bind(challenge_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Marks challenges whose window has ended as inactive.
pub async fn expire_ended<'e, E>(executor: E, now: DateTime<Utc>) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE challenges
            SET is_active = false, updated_at = NOW()
            WHERE is_active = true AND ends_at <= $1
        "#,
    )
    .bind(now)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

// --- Per-user progress ---

pub async fn join<'e, E>(
    executor: E,
    user_id: Uuid,
    challenge_id: Uuid,
    target: i32,
) -> Result<ChallengeProgress, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO challenge_progress (user_id, challenge_id, target)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, challenge_id, progress, target, is_completed, completed_at,
                      is_claimed, claimed_at, xp_awarded, joined_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(challenge_id)
    .bind(target)
    .fetch_one(executor)
    .await
}

/// Locks the progress row for the rest of the transaction.
pub async fn find_progress_for_update<'e, E>(
    executor: E,
    user_id: Uuid,
    challenge_id: Uuid,
) -> Result<Option<ChallengeProgress>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, challenge_id, progress, target, is_completed, completed_at,
                   is_claimed, claimed_at, xp_awarded, joined_at, updated_at
            FROM challenge_progress
            WHERE user_id = $1 AND challenge_id = $2
            FOR UPDATE
        "#,
    )
    .bind(user_id)
    .bind(challenge_id)
    .fetch_optional(executor)
    .await
}

/// Joined, open, uncompleted challenges of one type, locked for update.
pub async fn list_pending_for_type<'e, E>(
    executor: E,
    user_id: Uuid,
    challenge_type: ChallengeType,
    now: DateTime<Utc>,
) -> Result<Vec<PendingChallenge>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT cp.id AS progress_id, c.id AS challenge_id, c.period, cp.progress, cp.target
            FROM challenge_progress cp
            JOIN challenges c ON c.id = cp.challenge_id
            WHERE cp.user_id = $1
                AND cp.is_completed = false
                AND c.challenge_type = $2
                AND c.is_active = true
                AND c.starts_at <= $3 AND c.ends_at > $3
            ORDER BY cp.joined_at
            FOR UPDATE OF cp
        "#,
    )
    .bind(user_id)
    .bind(challenge_type)
    .bind(now)
    .fetch_all(executor)
    .await
}

/// Stores new progress; `completed_at` is only set the first time `completed` holds.
pub async fn save_progress<'e, E>(
    executor: E,
    progress_id: Uuid,
    progress: i32,
    completed: bool,
) -> Result<ChallengeProgress, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE challenge_progress
            SET progress = $2,
                is_completed = $3,
                completed_at = CASE WHEN $3 THEN COALESCE(completed_at, NOW()) ELSE NULL END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, challenge_id, progress, target, is_completed, completed_at,
                      is_claimed, claimed_at, xp_awarded, joined_at, updated_at
        "#,
    )
    .bind(progress_id)
    .bind(progress)
    .bind(completed)
    .fetch_one(executor)
    .await
}

/// Marks a completed progress row as claimed. Returns `None` if it was already claimed.
pub async fn mark_claimed<'e, E>(
    executor: E,
    progress_id: Uuid,
    xp_awarded: i32,
) -> Result<Option<ChallengeProgress>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE challenge_progress
            SET is_claimed = true, claimed_at = NOW(), xp_awarded = $2, updated_at = NOW()
            WHERE id = $1 AND is_completed = true AND is_claimed = false
            RETURNING id, user_id, challenge_id, progress, target, is_completed, completed_at,
                      is_claimed, claimed_at, xp_awarded, joined_at, updated_at
        "#,
    )
    .bind(progress_id)
    .bind(xp_awarded)
    .fetch_optional(executor)
    .await
}

pub async fn list_ranking<'e, E>(
    executor: E,
    challenge_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<ChallengeRankingRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT cp.user_id, u.username, cp.progress, cp.target, cp.is_completed, cp.completed_at
            FROM challenge_progress cp
            JOIN users u ON u.id = cp.user_id
            WHERE cp.challenge_id = $1
            ORDER BY cp.progress DESC, cp.completed_at ASC NULLS LAST, cp.joined_at ASC
            LIMIT $2 OFFSET $3
        "#,
    )
    .bind(challenge_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn count_participants<'e, E>(executor: E, challenge_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM challenge_progress
            WHERE challenge_id = $1
        "#,
    )
    .bind(challenge_id)
    .fetch_one(executor)
    .await
}

pub async fn list_history<'e, E>(
    executor: E,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<ChallengeHistoryEntry>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT cp.challenge_id, c.title, c.challenge_type, c.period, c.reward_xp, cp.progress,
                   cp.target, cp.is_completed, cp.completed_at, cp.is_claimed, cp.xp_awarded,
                   cp.joined_at
            FROM challenge_progress cp
            JOIN challenges c ON c.id = cp.challenge_id
            WHERE cp.user_id = $1
            ORDER BY cp.joined_at DESC
            LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn count_history<'e, E>(executor: E, user_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM challenge_progress
            WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
}

// --- Streaks ---

pub async fn find_streak<'e, E>(executor: E, user_id: Uuid) -> Result<Option<StreakRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT user_id, current_streak, longest_streak, multiplier, last_completed_on, updated_at
            FROM challenge_streaks
            WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn find_streak_for_update<'e, E>(
    executor: E,
    user_id: Uuid,
) -> Result<Option<StreakRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT user_id, current_streak, longest_streak, multiplier, last_completed_on, updated_at
            FROM challenge_streaks
            WHERE user_id = $1
            FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn upsert_streak<'e, E>(
    executor: E,
    user_id: Uuid,
    current_streak: i32,
    longest_streak: i32,
    multiplier: f64,
    last_completed_on: Option<NaiveDate>,
) -> Result<StreakRecord, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO challenge_streaks (user_id, current_streak, longest_streak, multiplier, last_completed_on)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id)
            DO UPDATE SET
                current_streak = $2,
                longest_streak = $3,
                multiplier = $4,
                last_completed_on = $5,
                updated_at = NOW()
            RETURNING user_id, current_streak, longest_streak, multiplier, last_completed_on, updated_at
        "#,
    )
    .bind(user_id)
    .bind(current_streak)
    .bind(longest_streak)
    .bind(multiplier)
    .bind(last_completed_on)
    .fetch_one(executor)
    .await
}

/// Logs a streak milestone once. Returns `true` the first time.
pub async fn record_streak_milestone<'e, E>(
    executor: E,
    user_id: Uuid,
    streak_value: i32,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO streak_milestones (user_id, streak_value)
            VALUES ($1, $2)
            ON CONFLICT (user_id, streak_value) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(streak_value)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_streak_milestones<'e, E>(
    executor: E,
    user_id: Uuid,
) -> Result<Vec<StreakMilestone>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT streak_value, reached_at
            FROM streak_milestones
            WHERE user_id = $1
            ORDER BY streak_value
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Resets streaks whose last claim is older than `cutoff` and mirrors the reset
/// into `progress_stats`. Returns how many streaks were reset.
pub async fn decay_streaks<'e, E>(executor: E, cutoff: NaiveDate) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            WITH decayed AS (
                UPDATE challenge_streaks
                SET current_streak = 0, multiplier = 1.0, updated_at = NOW()
                WHERE current_streak > 0 AND last_completed_on < $1
                RETURNING user_id
            ), synced AS (
                UPDATE progress_stats ps
                SET current_streak = 0, updated_at = NOW()
                FROM decayed d
                WHERE ps.user_id = d.user_id
                RETURNING ps.user_id
            )
            SELECT COUNT(*) FROM decayed
        "#,
    )
    .bind(cutoff)
    .fetch_one(executor)
    .await
}
