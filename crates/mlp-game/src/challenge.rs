//! Challenge progress arithmetic.

/// Result of adding progress to a challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// New progress value, never above the target
    pub progress: i32,
    pub completed: bool,
    /// True only for the update that crossed the target
    pub newly_completed: bool,
}

/// Add `amount` to `current` progress towards `target`.
///
/// Progress is capped at the target. Non-positive amounts and already
/// completed challenges leave the state untouched.
pub fn apply_progress(current: i32, amount: i32, target: i32, already_completed: bool) -> ProgressUpdate {
    if already_completed || amount <= 0 {
        return ProgressUpdate {
            progress: current,
            completed: already_completed,
            newly_completed: false,
        };
    }

    let progress = current.saturating_add(amount).min(target);
    let completed = progress >= target;

    ProgressUpdate {
        progress,
        completed,
        newly_completed: completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_progress() {
        let update = apply_progress(1, 1, 3, false);
        assert_eq!(update.progress, 2);
        assert!(!update.completed);
        assert!(!update.newly_completed);
    }

    #[test]
    fn test_completion_caps_at_target() {
        let update = apply_progress(2, 10, 3, false);
        assert_eq!(update.progress, 3);
        assert!(update.completed);
        assert!(update.newly_completed);
    }

    #[test]
    fn test_completed_challenge_is_frozen() {
        let update = apply_progress(3, 1, 3, true);
        assert_eq!(update.progress, 3);
        assert!(update.completed);
        assert!(!update.newly_completed);
    }

    #[test]
    fn test_non_positive_amount_is_ignored() {
        assert_eq!(apply_progress(1, 0, 3, false).progress, 1);
        assert_eq!(apply_progress(1, -5, 3, false).progress, 1);
    }

    #[test]
    fn test_saturating_add() {
        let update = apply_progress(i32::MAX - 1, 10, i32::MAX, false);
        assert_eq!(update.progress, i32::MAX);
        assert!(update.completed);
    }
}
