use chrono::{DateTime, Duration, NaiveDate, Utc};
use mlp_db::models::{
    ChallengeChanges, ChallengeDifficulty, ChallengePeriod, ChallengeRankingRow, ChallengeType,
    NewChallenge, StreakMilestone, StreakRecord,
};
use mlp_game::Streak;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{error::ApiError, validation::non_blank};

const fn default_period() -> ChallengePeriod {
    ChallengePeriod::Daily
}

const fn default_difficulty() -> ChallengeDifficulty {
    ChallengeDifficulty::Easy
}

/// Length of a challenge window when no end is given
pub(crate) fn period_length(period: ChallengePeriod) -> Duration {
    match period {
        ChallengePeriod::Daily => Duration::days(1),
        ChallengePeriod::Weekly => Duration::days(7),
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateChallengeRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    #[serde(rename = "type")]
    pub challenge_type: ChallengeType,
    #[serde(default = "default_period")]
    pub period: ChallengePeriod,
    #[serde(default = "default_difficulty")]
    pub difficulty: ChallengeDifficulty,
    #[validate(range(min = 1, max = 100000))]
    pub target: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 10000))]
    pub reward_xp: i32,
    #[validate(length(max = 100))]
    pub reward_badge: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl CreateChallengeRequest {
    /// Fill in the window (`now` and one period by default) and check `ends_at > starts_at`.
    pub fn into_new_challenge(
        self,
        created_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<NewChallenge, ApiError> {
        let starts_at = self.starts_at.unwrap_or(now);
        let ends_at = self
            .ends_at
            .unwrap_or_else(|| starts_at + period_length(self.period));

        if ends_at <= starts_at {
            return Err(ApiError::Validation(
                "endsAt: must be after startsAt".to_string(),
            ));
        }

        Ok(NewChallenge {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            challenge_type: self.challenge_type,
            period: self.period,
            difficulty: self.difficulty,
            target: self.target,
            reward_xp: self.reward_xp,
            reward_badge: non_blank(self.reward_badge),
            starts_at,
            ends_at,
            created_by,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateChallengeRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 0, max = 10000))]
    pub reward_xp: Option<i32>,
    #[validate(length(max = 100))]
    pub reward_badge: Option<String>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

impl UpdateChallengeRequest {
    pub fn into_changes(self) -> ChallengeChanges {
        ChallengeChanges {
            title: self.title.map(|t| t.trim().to_string()),
            description: self.description.map(|d| d.trim().to_string()),
            reward_xp: self.reward_xp,
            reward_badge: non_blank(self.reward_badge),
            ends_at: self.ends_at,
            is_active: self.is_active,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ActiveQuery {
    pub period: Option<ChallengePeriod>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProgressRequest {
    #[validate(range(min = 1, max = 1000))]
    pub amount: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub rank: i64,
    #[serde(flatten)]
    pub entry: ChallengeRankingRow,
}

/// Attach 1-based ranks to a page of rows starting at `offset`.
pub(crate) fn rank_rows(rows: Vec<ChallengeRankingRow>, offset: i64) -> Vec<RankedEntry> {
    rows.into_iter()
        .zip(offset + 1..)
        .map(|(entry, rank)| RankedEntry { rank, entry })
        .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakResponse {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub multiplier: f64,
    pub last_completed_on: Option<NaiveDate>,
    /// False once a day has been skipped
    pub is_active: bool,
    pub milestones: Vec<StreakMilestone>,
}

impl StreakResponse {
    /// Report the streak as it stands today, even if the nightly decay has not run yet.
    pub fn build(record: Option<&StreakRecord>, milestones: Vec<StreakMilestone>, today: NaiveDate) -> Self {
        let streak = record.map(to_streak).unwrap_or_default().decayed(today);
        Self {
            current_streak: streak.current,
            longest_streak: streak.longest,
            multiplier: streak.multiplier(),
            last_completed_on: streak.last_completed_on,
            is_active: streak.current > 0,
            milestones,
        }
    }
}

pub(crate) const fn to_streak(record: &StreakRecord) -> Streak {
    Streak {
        current: record.current_streak,
        longest: record.longest_streak,
        last_completed_on: record.last_completed_on,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub challenge_id: Uuid,
    pub base_xp: i32,
    pub multiplier: f64,
    pub xp_awarded: i64,
    pub total_xp: i64,
    pub level: i32,
    pub leveled_up: bool,
    pub current_streak: i32,
    pub streak_milestone: Option<i32>,
    pub new_milestones: Vec<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    fn create_request(value: serde_json::Value) -> CreateChallengeRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_default_window_follows_period() {
        let now = at(10, 8);
        let daily = create_request(serde_json::json!({
            "title": "Read two lessons",
            "type": "complete_lessons",
            "target": 2
        }))
        .into_new_challenge(Uuid::nil(), now)
        .unwrap();
        assert_eq!(daily.period, ChallengePeriod::Daily);
        assert_eq!(daily.starts_at, now);
        assert_eq!(daily.ends_at, at(11, 8));

        let weekly = create_request(serde_json::json!({
            "title": "Earn 500 XP",
            "type": "earn_xp",
            "period": "weekly",
            "target": 500,
            "rewardXp": 100
        }))
        .into_new_challenge(Uuid::nil(), now)
        .unwrap();
        assert_eq!(weekly.ends_at, at(17, 8));
        assert_eq!(weekly.reward_xp, 100);
    }

    #[test]
    fn test_window_must_be_positive() {
        let err = create_request(serde_json::json!({
            "title": "Backwards",
            "type": "post_comments",
            "target": 1,
            "startsAt": at(10, 8),
            "endsAt": at(10, 8)
        }))
        .into_new_challenge(Uuid::nil(), at(1, 0))
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_target_must_be_positive() {
        let req = create_request(serde_json::json!({
            "title": "Nothing to do",
            "type": "share_progress",
            "target": 0
        }));
        assert!(req.validate().unwrap_err().field_errors().contains_key("target"));
    }

    #[test]
    fn test_rank_rows_offset() {
        let row = |name: &str, progress| ChallengeRankingRow {
            user_id: Uuid::new_v4(),
            username: name.to_string(),
            progress,
            target: 5,
            is_completed: progress >= 5,
            completed_at: None,
        };
        let ranked = rank_rows(vec![row("a", 5), row("b", 3)], 20);
        assert_eq!(ranked[0].rank, 21);
        assert_eq!(ranked[1].rank, 22);
        assert_eq!(ranked[1].entry.username, "b");

        let json = serde_json::to_value(&ranked[0]).unwrap();
        assert_eq!(json["rank"], 21);
        assert_eq!(json["username"], "a");
        assert_eq!(json["isCompleted"], true);
    }

    #[test]
    fn test_streak_response_decays_lapsed_streak() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap();
        let record = StreakRecord {
            user_id: Uuid::nil(),
            current_streak: 4,
            longest_streak: 9,
            multiplier: 1.3,
            last_completed_on: Some(day(10)),
            updated_at: at(10, 8),
        };

        let alive = StreakResponse::build(Some(&record), Vec::new(), day(11));
        assert_eq!(alive.current_streak, 4);
        assert!((alive.multiplier - 1.3).abs() < 1e-9);
        assert!(alive.is_active);

        let lapsed = StreakResponse::build(Some(&record), Vec::new(), day(13));
        assert_eq!(lapsed.current_streak, 0);
        assert_eq!(lapsed.longest_streak, 9);
        assert!((lapsed.multiplier - 1.0).abs() < 1e-9);
        assert!(!lapsed.is_active);
    }

    #[test]
    fn test_streak_response_without_record() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let empty = StreakResponse::build(None, Vec::new(), today);
        assert_eq!(empty.current_streak, 0);
        assert!((empty.multiplier - 1.0).abs() < 1e-9);
        assert_eq!(empty.last_completed_on, None);
    }
}
