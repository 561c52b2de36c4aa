//! Gamification rules for the Microlearn platform
//!
//! This crate holds the arithmetic behind XP, levels, daily streaks,
//! milestones and challenge progress. It has no I/O: callers load the
//! current state from the database, apply these rules and persist the result.

pub mod challenge;
pub mod level;
pub mod milestone;
pub mod streak;

pub use challenge::{ProgressUpdate, apply_progress};
pub use level::{LevelProgress, level_for_xp, level_progress, xp_for_level};
pub use milestone::{MilestoneKind, ProgressSnapshot, reached_milestones};
pub use streak::{Streak, StreakOutcome, multiplier_for, reward_with_multiplier};
