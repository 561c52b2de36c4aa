//! Progress milestones awarded once per user.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Counters a milestone can be measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub total_xp: i64,
    pub level: i32,
    pub lessons_completed: i32,
    pub challenges_completed: i32,
    pub shares_count: i32,
    pub longest_streak: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MilestoneKind {
    FirstLesson,
    Lessons10,
    Lessons50,
    Xp1000,
    Xp5000,
    Level5,
    Level10,
    Streak7,
    Streak30,
    FirstShare,
    FirstChallenge,
}

impl MilestoneKind {
    pub const ALL: [Self; 11] = [
        Self::FirstLesson,
        Self::Lessons10,
        Self::Lessons50,
        Self::Xp1000,
        Self::Xp5000,
        Self::Level5,
        Self::Level10,
        Self::Streak7,
        Self::Streak30,
        Self::FirstShare,
        Self::FirstChallenge,
    ];

    /// Stable identifier stored in the database
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FirstLesson => "first_lesson",
            Self::Lessons10 => "lessons_10",
            Self::Lessons50 => "lessons_50",
            Self::Xp1000 => "xp_1000",
            Self::Xp5000 => "xp_5000",
            Self::Level5 => "level_5",
            Self::Level10 => "level_10",
            Self::Streak7 => "streak_7",
            Self::Streak30 => "streak_30",
            Self::FirstShare => "first_share",
            Self::FirstChallenge => "first_challenge",
        }
    }

    /// Human readable title used in the activity feed
    pub const fn title(&self) -> &'static str {
        match self {
            Self::FirstLesson => "Completed your first lesson",
            Self::Lessons10 => "Completed 10 lessons",
            Self::Lessons50 => "Completed 50 lessons",
            Self::Xp1000 => "Earned 1,000 XP",
            Self::Xp5000 => "Earned 5,000 XP",
            Self::Level5 => "Reached level 5",
            Self::Level10 => "Reached level 10",
            Self::Streak7 => "Kept a 7 day streak",
            Self::Streak30 => "Kept a 30 day streak",
            Self::FirstShare => "Shared your progress",
            Self::FirstChallenge => "Completed your first challenge",
        }
    }

    pub const fn is_reached(&self, s: &ProgressSnapshot) -> bool {
        match self {
            Self::FirstLesson => s.lessons_completed >= 1,
            Self::Lessons10 => s.lessons_completed >= 10,
            Self::Lessons50 => s.lessons_completed >= 50,
            Self::Xp1000 => s.total_xp >= 1000,
            Self::Xp5000 => s.total_xp >= 5000,
            Self::Level5 => s.level >= 5,
            Self::Level10 => s.level >= 10,
            Self::Streak7 => s.longest_streak >= 7,
            Self::Streak30 => s.longest_streak >= 30,
            Self::FirstShare => s.shares_count >= 1,
            Self::FirstChallenge => s.challenges_completed >= 1,
        }
    }
}

impl fmt::Display for MilestoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown milestone type: {0}")]
pub struct UnknownMilestone(pub String);

impl FromStr for MilestoneKind {
    type Err = UnknownMilestone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownMilestone(s.to_string()))
    }
}

/// Every milestone the snapshot satisfies, in declaration order.
///
/// Callers insert all of them and rely on the (user, milestone) uniqueness
/// to find which ones are new.
pub fn reached_milestones(snapshot: &ProgressSnapshot) -> Vec<MilestoneKind> {
    MilestoneKind::ALL
        .into_iter()
        .filter(|kind| kind.is_reached(snapshot))
        .collect()
}
