//! Property tests for the leveling curve and streak milestones.

use ascend_core::leveling::{level_for_xp, xp_progress, xp_required_for_level, MAX_LEVEL};
use ascend_core::streak::{check_milestones, STREAK_MILESTONES};
use proptest::prelude::*;

proptest! {
    #[test]
    fn level_is_at_least_one_and_progress_is_bounded(xp in any::<u64>()) {
        let progress = xp_progress(xp);
        prop_assert!(level_for_xp(xp) >= 1);
        prop_assert_eq!(progress.level, level_for_xp(xp));
        prop_assert!((0.0..=100.0).contains(&progress.progress_percent));
    }

    #[test]
    fn thresholds_strictly_increase(level in 1u32..MAX_LEVEL) {
        prop_assert!(xp_required_for_level(level + 1) > xp_required_for_level(level));
    }

    #[test]
    fn more_xp_never_lowers_level(a in 0u64..10_000_000, extra in 0u64..10_000_000) {
        prop_assert!(level_for_xp(a + extra) >= level_for_xp(a));
    }

    #[test]
    fn milestones_cover_exactly_the_crossed_range(old in 0u32..150, gain in 0u32..150) {
        let new = old + gain;
        let fired: Vec<u32> = check_milestones(old, new).iter().map(|r| r.milestone).collect();
        let expected: Vec<u32> = STREAK_MILESTONES
            .iter()
            .copied()
            .filter(|m| old < *m && *m <= new)
            .collect();
        prop_assert_eq!(fired, expected);
    }
}

#[test]
fn milestone_check_without_change_is_empty() {
    assert!(check_milestones(7, 7).is_empty());
    let fired: Vec<u32> = check_milestones(2, 8).iter().map(|r| r.milestone).collect();
    assert_eq!(fired, vec![3, 7]);
}
