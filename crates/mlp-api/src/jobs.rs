//! Periodic maintenance: expired refresh tokens, stale streaks and finished challenges.

use std::time::Duration;

use chrono::{Days, NaiveDate, Utc};
use mlp_db::repositories::{challenge as challenge_repo, token as token_repo};
use sqlx::PgPool;
use tokio::{task::JoinHandle, time::interval};

const TOKEN_CLEANUP_EVERY: Duration = Duration::from_secs(6 * 60 * 60);
const STREAK_DECAY_EVERY: Duration = Duration::from_secs(24 * 60 * 60);
const CHALLENGE_EXPIRY_EVERY: Duration = Duration::from_secs(60 * 60);

/// Spawn every maintenance loop. Handles can be aborted on shutdown.
pub fn start_background_jobs(pool: PgPool) -> Vec<JoinHandle<()>> {
    vec![
        tokio::spawn(token_cleanup_job(pool.clone())),
        tokio::spawn(streak_decay_job(pool.clone())),
        tokio::spawn(challenge_expiry_job(pool)),
    ]
}

async fn token_cleanup_job(pool: PgPool) {
    // Stay out of the way of startup traffic
    tokio::time::sleep(Duration::from_secs(3600)).await;

    let mut interval = interval(TOKEN_CLEANUP_EVERY);
    loop {
        interval.tick().await;

        match token_repo::cleanup_expired_refresh_tokens(&pool).await {
            Ok(0) => tracing::debug!("token cleanup: nothing expired"),
            Ok(removed) => tracing::info!(removed, "expired refresh tokens removed"),
            Err(e) => tracing::error!(error = %e, "token cleanup failed"),
        }
    }
}

async fn streak_decay_job(pool: PgPool) {
    let mut interval = interval(STREAK_DECAY_EVERY);
    loop {
        interval.tick().await;

        match decay_streaks(&pool, Utc::now().date_naive()).await {
            Ok(0) => tracing::debug!("streak decay: no broken streaks"),
            Ok(reset) => tracing::info!(reset, "broken streaks reset"),
            Err(e) => tracing::error!(error = %e, "streak decay failed"),
        }
    }
}

async fn challenge_expiry_job(pool: PgPool) {
    let mut interval = interval(CHALLENGE_EXPIRY_EVERY);
    loop {
        interval.tick().await;

        match challenge_repo::expire_ended(&pool, Utc::now()).await {
            Ok(0) => tracing::debug!("challenge expiry: nothing ended"),
            Ok(expired) => tracing::info!(expired, "ended challenges deactivated"),
            Err(e) => tracing::error!(error = %e, "challenge expiry failed"),
        }
    }
}

/// A streak survives as long as its last claim was yesterday or later.
pub fn decay_cutoff(today: NaiveDate) -> NaiveDate {
    today.checked_sub_days(Days::new(1)).unwrap_or(today)
}

/// Reset every streak broken as of `today`.
pub async fn decay_streaks(pool: &PgPool, today: NaiveDate) -> Result<i64, sqlx::Error> {
    challenge_repo::decay_streaks(pool, decay_cutoff(today)).await
}
