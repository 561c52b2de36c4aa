//! XP to level conversion.
//!
//! Levels grow quadratically: reaching level `n` requires `100 * (n - 1)^2`
//! total XP, so level 2 starts at 100 XP, level 3 at 400, level 5 at 1600.

/// XP unit used by the level curve
pub const XP_PER_LEVEL_UNIT: i64 = 100;

/// Compute the level for an accumulated XP total.
///
/// `level = floor(sqrt(total_xp / 100)) + 1`. Negative totals are treated as zero.
pub fn level_for_xp(total_xp: i64) -> i32 {
    let units = (total_xp.max(0) / XP_PER_LEVEL_UNIT) as u64;
    units.isqrt() as i32 + 1
}

/// Total XP needed to reach `level`.
pub fn xp_for_level(level: i32) -> i64 {
    let steps = i64::from(level.max(1) - 1);
    XP_PER_LEVEL_UNIT * steps * steps
}

/// Position of a user inside their current level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelProgress {
    pub level: i32,
    /// XP at which the current level started
    pub level_floor_xp: i64,
    /// XP needed for the next level
    pub next_level_xp: i64,
    /// Percentage of the way to the next level, 0.0 to 100.0
    pub percent: f64,
}

pub fn level_progress(total_xp: i64) -> LevelProgress {
    let level = level_for_xp(total_xp);
    let level_floor_xp = xp_for_level(level);
    let next_level_xp = xp_for_level(level + 1);
    let span = (next_level_xp - level_floor_xp) as f64;
    let into_level = (total_xp.max(0) - level_floor_xp) as f64;

    LevelProgress {
        level,
        level_floor_xp,
        next_level_xp,
        percent: (into_level / span * 1000.0).round() / 10.0,
    }
}
