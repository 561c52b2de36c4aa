//! Gamification side effects shared by lessons, comments, shares and challenges.
//!
//! Every function takes a connection so callers can run it inside the same
//! transaction as the event that triggered it.

use chrono::Utc;
use mlp_db::{
    models::{ActivityType, ChallengeType, ProgressStats, StatCounter},
    repositories::{challenge as challenge_repo, progress as progress_repo},
};
use mlp_game::{MilestoneKind, ProgressSnapshot, apply_progress, level_for_xp};
use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::metrics;

/// Outcome of adding XP to a user's snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XpAward {
    pub xp_awarded: i64,
    pub total_xp: i64,
    pub level: i32,
    pub leveled_up: bool,
}

/// Add XP and keep the stored level in sync with `level_for_xp`.
pub async fn award_xp(
    conn: &mut PgConnection,
    user_id: Uuid,
    xp: i64,
    source: &'static str,
) -> Result<XpAward, sqlx::Error> {
    let xp = xp.max(0);
    let total_xp = progress_repo::add_xp(&mut *conn, user_id, xp).await?;
    let level = level_for_xp(total_xp);
    let leveled_up = level > level_for_xp(total_xp - xp);

    progress_repo::set_level(&mut *conn, user_id, level).await?;
    metrics::record_xp_awarded(source, xp);

    if leveled_up {
        tracing::info!(%user_id, level, "user leveled up");
    }

    Ok(XpAward {
        xp_awarded: xp,
        total_xp,
        level,
        leveled_up,
    })
}

pub async fn record_activity(
    conn: &mut PgConnection,
    user_id: Uuid,
    activity_type: ActivityType,
    description: &str,
    xp_earned: i32,
    reference_id: Option<Uuid>,
    metadata: serde_json::Value,
) -> Result<(), sqlx::Error> {
    progress_repo::insert_activity(
        conn,
        user_id,
        activity_type,
        description,
        xp_earned,
        reference_id,
        &metadata,
    )
    .await
}

fn snapshot(stats: &ProgressStats) -> ProgressSnapshot {
    ProgressSnapshot {
        total_xp: stats.total_xp,
        level: stats.level,
        lessons_completed: stats.lessons_completed,
        challenges_completed: stats.challenges_completed,
        shares_count: stats.shares_count,
        longest_streak: stats.longest_streak,
    }
}

/// Award every milestone the current stats satisfy. Returns only the new ones.
pub async fn check_milestones(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Vec<MilestoneKind>, sqlx::Error> {
    let Some(stats) = progress_repo::find_stats(&mut *conn, user_id).await? else {
        return Ok(Vec::new());
    };

    let mut awarded = Vec::new();
    for kind in mlp_game::reached_milestones(&snapshot(&stats)) {
        // The unique (user, milestone) key makes repeats a no-op
        if !progress_repo::award_milestone(&mut *conn, user_id, kind.as_str()).await? {
            continue;
        }

        record_activity(
            conn,
            user_id,
            ActivityType::MilestoneReached,
            kind.title(),
            0,
            None,
            serde_json::json!({ "milestone": kind.as_str() }),
        )
        .await?;
        awarded.push(kind);
    }

    if !awarded.is_empty() {
        tracing::info!(%user_id, count = awarded.len(), "milestones awarded");
    }

    Ok(awarded)
}

/// Push `amount` of progress into every open, joined, uncompleted challenge
/// of `challenge_type`. Returns the ids of challenges completed by this event.
pub async fn advance_challenges(
    conn: &mut PgConnection,
    user_id: Uuid,
    challenge_type: ChallengeType,
    amount: i32,
) -> Result<Vec<Uuid>, sqlx::Error> {
    if amount <= 0 {
        return Ok(Vec::new());
    }

    let pending =
        challenge_repo::list_pending_for_type(&mut *conn, user_id, challenge_type, Utc::now())
            .await?;

    let mut completed = Vec::new();
    for item in pending {
        let update = apply_progress(item.progress, amount, item.target, false);
        challenge_repo::save_progress(&mut *conn, item.progress_id, update.progress, update.completed)
            .await?;

        if update.newly_completed {
            complete_challenge(conn, user_id, item.challenge_id).await?;
            completed.push(item.challenge_id);
        }
    }

    Ok(completed)
}

/// Book-keeping for a challenge that just reached its target.
pub async fn complete_challenge(
    conn: &mut PgConnection,
    user_id: Uuid,
    challenge_id: Uuid,
) -> Result<(), sqlx::Error> {
    progress_repo::increment_counter(&mut *conn, user_id, StatCounter::ChallengesCompleted, 1)
        .await?;
    record_activity(
        conn,
        user_id,
        ActivityType::ChallengeCompleted,
        "Completed a challenge",
        0,
        Some(challenge_id),
        serde_json::Value::Null,
    )
    .await?;

    tracing::debug!(%user_id, %challenge_id, "challenge completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stats() -> ProgressStats {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        ProgressStats {
            user_id: Uuid::new_v4(),
            total_xp: 1200,
            level: 4,
            current_streak: 2,
            longest_streak: 8,
            lessons_completed: 11,
            challenges_completed: 1,
            shares_count: 0,
            comments_count: 3,
            last_activity_at: Some(at),
            updated_at: at,
        }
    }

    #[test]
    fn test_snapshot_copies_milestone_counters() {
        let s = snapshot(&stats());
        assert_eq!(s.total_xp, 1200);
        assert_eq!(s.level, 4);
        assert_eq!(s.lessons_completed, 11);
        assert_eq!(s.challenges_completed, 1);
        assert_eq!(s.shares_count, 0);
        // Streak milestones follow the best streak, not the current one
        assert_eq!(s.longest_streak, 8);
    }

    #[test]
    fn test_snapshot_milestones() {
        let reached = mlp_game::reached_milestones(&snapshot(&stats()));
        assert!(reached.contains(&MilestoneKind::FirstLesson));
        assert!(reached.contains(&MilestoneKind::Lessons10));
        assert!(reached.contains(&MilestoneKind::Xp1000));
        assert!(reached.contains(&MilestoneKind::Streak7));
        assert!(reached.contains(&MilestoneKind::FirstChallenge));
        assert!(!reached.contains(&MilestoneKind::FirstShare));
        assert!(!reached.contains(&MilestoneKind::Level5));
    }
}
