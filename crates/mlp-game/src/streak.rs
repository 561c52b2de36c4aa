//! Daily streak bookkeeping.
//!
//! A streak counts consecutive UTC days on which the user claimed a daily
//! challenge reward. Claiming again on the same day changes nothing, claiming
//! the next day extends the streak and any gap restarts it at 1.

use chrono::NaiveDate;

/// Hard cap on the reward multiplier
pub const MAX_MULTIPLIER: f64 = 3.0;

/// Multiplier gained per consecutive day after the first
pub const MULTIPLIER_STEP: f64 = 0.1;

/// Streak lengths that are recorded as milestones
pub const STREAK_MILESTONES: &[i32] = &[3, 7, 14, 30, 60, 100, 365];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Streak {
    pub current: i32,
    pub longest: i32,
    pub last_completed_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakOutcome {
    /// No previous completion
    Started,
    /// Completed the day after the previous completion
    Extended,
    /// A day or more was skipped, streak restarted at 1
    Reset,
    /// Already completed today
    AlreadyCounted,
}

impl Streak {
    /// Apply a completion on `today` and return the new state.
    pub fn record_completion(self, today: NaiveDate) -> (Self, StreakOutcome) {
        let (current, outcome) = match self.last_completed_on {
            None => (1, StreakOutcome::Started),
            Some(last) if last >= today => (self.current.max(1), StreakOutcome::AlreadyCounted),
            Some(last) if last.succ_opt() == Some(today) => {
                (self.current + 1, StreakOutcome::Extended)
            }
            Some(_) => (1, StreakOutcome::Reset),
        };

        let last_completed_on = match self.last_completed_on {
            Some(last) if last > today => Some(last),
            _ => Some(today),
        };

        (
            Self {
                current,
                longest: self.longest.max(current),
                last_completed_on,
            },
            outcome,
        )
    }

    /// Whether the streak has lapsed as of `today`.
    ///
    /// A streak stays alive through the day after the last completion.
    pub fn is_broken(&self, today: NaiveDate) -> bool {
        match self.last_completed_on {
            Some(last) => today.signed_duration_since(last).num_days() > 1,
            None => false,
        }
    }

    /// Return the streak with `current` reset to zero if it has lapsed.
    pub fn decayed(self, today: NaiveDate) -> Self {
        if self.is_broken(today) {
            Self { current: 0, ..self }
        } else {
            self
        }
    }

    pub fn multiplier(&self) -> f64 {
        multiplier_for(self.current)
    }
}

/// Reward multiplier for a streak length: `min(1 + 0.1 * (streak - 1), 3.0)`.
pub fn multiplier_for(streak: i32) -> f64 {
    if streak <= 1 {
        return 1.0;
    }
    let raw = 1.0 + f64::from(streak - 1) * MULTIPLIER_STEP;
    ((raw * 100.0).round() / 100.0).min(MAX_MULTIPLIER)
}

/// Apply a multiplier to a base XP reward, rounding to the nearest point.
pub fn reward_with_multiplier(base_xp: i32, multiplier: f64) -> i64 {
    (f64::from(base_xp.max(0)) * multiplier).round() as i64
}

/// The highest milestone crossed when a streak moves from `previous` to `current`.
pub fn milestone_crossed(previous: i32, current: i32) -> Option<i32> {
    STREAK_MILESTONES
        .iter()
        .rev()
        .copied()
        .find(|&m| previous < m && current >= m)
}
