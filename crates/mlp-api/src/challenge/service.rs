use chrono::{NaiveDate, Utc};
use mlp_db::{
    models::{ActivityType, ChallengePeriod, ChallengeProgress},
    repositories::{challenge as challenge_repo, progress as progress_repo},
};
use mlp_game::{apply_progress, reward_with_multiplier, streak::milestone_crossed};
use sqlx::PgPool;
use uuid::Uuid;

use super::model::{ClaimResponse, to_streak};
use crate::{error::ApiError, progress::service as progress_service};

fn not_joined() -> ApiError {
    ApiError::NotFound("You have not joined this challenge".to_string())
}

/// Manual progress on a joined, open challenge.
pub(crate) async fn record_progress(
    pool: &PgPool,
    user_id: Uuid,
    challenge_id: Uuid,
    amount: i32,
) -> Result<ChallengeProgress, ApiError> {
    let mut tx = pool.begin().await?;

    let challenge = challenge_repo::find_by_id(&mut *tx, challenge_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Challenge"))?;
    let progress = challenge_repo::find_progress_for_update(&mut *tx, user_id, challenge_id)
        .await?
        .ok_or_else(not_joined)?;

    if !challenge.is_open_at(Utc::now()) {
        return Err(ApiError::BadRequest("Challenge is not open".to_string()));
    }

    let update = apply_progress(progress.progress, amount, progress.target, progress.is_completed);
    let saved =
        challenge_repo::save_progress(&mut *tx, progress.id, update.progress, update.completed)
            .await?;

    if update.newly_completed {
        progress_service::complete_challenge(&mut tx, user_id, challenge_id).await?;
        progress_service::check_milestones(&mut tx, user_id).await?;
    }

    tx.commit().await?;

    Ok(saved)
}

/// Pay out a completed challenge.
///
/// Daily claims move the streak first, so the claim that extends a streak
/// already earns the higher multiplier. Weekly claims use the streak as it
/// stands today without changing it.
pub(crate) async fn claim(
    pool: &PgPool,
    user_id: Uuid,
    challenge_id: Uuid,
    today: NaiveDate,
) -> Result<ClaimResponse, ApiError> {
    let mut tx = pool.begin().await?;

    let challenge = challenge_repo::find_by_id(&mut *tx, challenge_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Challenge"))?;
    let progress = challenge_repo::find_progress_for_update(&mut *tx, user_id, challenge_id)
        .await?
        .ok_or_else(not_joined)?;

    if !progress.is_completed {
        return Err(ApiError::BadRequest("Challenge is not completed yet".to_string()));
    }
    if progress.is_claimed {
        return Err(ApiError::BadRequest("Reward already claimed".to_string()));
    }

    let stored = challenge_repo::find_streak_for_update(&mut *tx, user_id)
        .await?
        .as_ref()
        .map(to_streak)
        .unwrap_or_default();

    let (streak, streak_milestone) = match challenge.period {
        ChallengePeriod::Daily => {
            let previous = stored.decayed(today);
            let (next, outcome) = stored.record_completion(today);
            challenge_repo::upsert_streak(
                &mut *tx,
                user_id,
                next.current,
                next.longest,
                next.multiplier(),
                next.last_completed_on,
            )
            .await?;
            progress_repo::set_streak(&mut *tx, user_id, next.current, next.longest).await?;
            tracing::debug!(%user_id, ?outcome, streak = next.current, "streak updated");

            let mut crossed = None;
            if let Some(value) = milestone_crossed(previous.current, next.current) {
                if challenge_repo::record_streak_milestone(&mut *tx, user_id, value).await? {
                    progress_service::record_activity(
                        &mut tx,
                        user_id,
                        ActivityType::MilestoneReached,
                        &format!("Reached a {value} day streak"),
                        0,
                        None,
                        serde_json::json!({ "streak": value }),
                    )
                    .await?;
                    crossed = Some(value);
                }
            }
            (next, crossed)
        }
        ChallengePeriod::Weekly => (stored.decayed(today), None),
    };

    let multiplier = streak.multiplier();
    let reward = reward_with_multiplier(challenge.reward_xp, multiplier);
    let reward_i32 = i32::try_from(reward)
        .map_err(|_| ApiError::Internal(format!("reward {reward} out of range")))?;

    challenge_repo::mark_claimed(&mut *tx, progress.id, reward_i32)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Reward already claimed".to_string()))?;

    let award = progress_service::award_xp(&mut tx, user_id, reward, "challenge").await?;
    progress_service::record_activity(
        &mut tx,
        user_id,
        ActivityType::ChallengeClaimed,
        &format!("Claimed reward for \"{}\"", challenge.title),
        reward_i32,
        Some(challenge_id),
        serde_json::json!({ "multiplier": multiplier, "baseXp": challenge.reward_xp }),
    )
    .await?;
    let new_milestones = progress_service::check_milestones(&mut tx, user_id)
        .await?
        .into_iter()
        .map(|kind| kind.as_str())
        .collect();

    tx.commit().await?;

    tracing::info!(%user_id, %challenge_id, reward, multiplier, "challenge reward claimed");

    Ok(ClaimResponse {
        challenge_id,
        base_xp: challenge.reward_xp,
        multiplier,
        xp_awarded: reward,
        total_xp: award.total_xp,
        level: award.level,
        leveled_up: award.leveled_up,
        current_streak: streak.current,
        streak_milestone,
        new_milestones,
    })
}
