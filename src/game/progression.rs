//! Progression Resolver
//!
//! Keeps the tier index consistent with the point total and computes the
//! progress-within-tier percentage shown on the level bar.
//!
//! ## Stepping
//!
//! [`resolve_step`] moves at most one tier per call: promote when the next
//! threshold is reached, otherwise demote when the current floor is no longer
//! met. [`resolve`] repeats that until nothing changes, which is what the
//! session uses after every mutation so a large one-shot delta still lands
//! on the right tier.

use serde::{Deserialize, Serialize};

use crate::core::tier::TierTable;

/// One tier boundary crossed during resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTransition {
    /// Tier index before the step
    pub from: usize,
    /// Tier index after the step
    pub to: usize,
}

impl TierTransition {
    /// Whether this step moved up the ladder.
    #[inline]
    pub fn is_promotion(&self) -> bool {
        self.to > self.from
    }
}

/// Evaluate a single tier boundary.
///
/// An index past the end of the table is treated as the terminal tier.
pub fn resolve_step(table: &TierTable, points: u64, tier_index: usize) -> Option<TierTransition> {
    let current = tier_index.min(table.last_index());

    if let Some(next) = table.next_after(current) {
        if points >= next.min_points {
            return Some(TierTransition {
                from: current,
                to: current + 1,
            });
        }
    }

    if current > 0 && points < table.tier_at(current).min_points {
        return Some(TierTransition {
            from: current,
            to: current - 1,
        });
    }

    None
}

/// Repeat [`resolve_step`] until stable.
///
/// Returns the settled index and every transition taken on the way.
pub fn resolve(table: &TierTable, points: u64, tier_index: usize) -> (usize, Vec<TierTransition>) {
    let mut current = tier_index.min(table.last_index());
    let mut transitions = Vec::new();

    // Each step moves strictly towards the settled tier, so this terminates
    // within `count` iterations.
    while let Some(step) = resolve_step(table, points, current) {
        current = step.to;
        transitions.push(step);
    }

    (current, transitions)
}

/// Progress towards the next tier as a percentage in `0.0..=100.0`.
///
/// Only the terminal tier reports exactly 100; any other tier stays strictly
/// below it, even when rounding of very large thresholds would reach it.
pub fn progress_percent(table: &TierTable, points: u64, tier_index: usize) -> f64 {
    let current = table.tier_at(tier_index);
    let Some(next) = table.next_after(tier_index) else {
        return 100.0;
    };

    let span = (next.min_points - current.min_points) as f64;
    let earned = points.saturating_sub(current.min_points) as f64;
    (earned / span * 100.0).clamp(0.0, below_full())
}

/// Largest `f64` below 100.
#[inline]
fn below_full() -> f64 {
    f64::from_bits(100.0_f64.to_bits() - 1)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn three_tiers() -> TierTable {
        TierTable::from_pairs([("Bronze", 0), ("Silver", 5000), ("Gold", 25000)]).unwrap()
    }

    #[test]
    fn test_step_promotes_at_threshold() {
        let table = three_tiers();
        assert_eq!(resolve_step(&table, 4999, 0), None);
        assert_eq!(
            resolve_step(&table, 5000, 0),
            Some(TierTransition { from: 0, to: 1 })
        );
    }

    #[test]
    fn test_step_moves_one_tier_only() {
        let table = three_tiers();
        // 30k skips Silver entirely, but a single step only reaches Silver
        let step = resolve_step(&table, 30_000, 0).unwrap();
        assert_eq!(step.to, 1);
        assert!(step.is_promotion());

        let (settled, transitions) = resolve(&table, 30_000, 0);
        assert_eq!(settled, 2);
        assert_eq!(transitions.len(), 2);
    }

    #[test]
    fn test_demotion_from_silver_in_one_pass() {
        let table = three_tiers();
        let step = resolve_step(&table, 100, 1).unwrap();
        assert_eq!(step, TierTransition { from: 1, to: 0 });
        assert!(!step.is_promotion());
        assert_eq!(resolve_step(&table, 100, 0), None);
    }

    #[test]
    fn test_floor_tier_never_demotes() {
        let table = three_tiers();
        assert_eq!(resolve_step(&table, 0, 0), None);
    }

    #[test]
    fn test_out_of_range_index_is_clamped() {
        let table = three_tiers();
        let (settled, _) = resolve(&table, 30_000, 17);
        assert_eq!(settled, 2);

        let (settled, transitions) = resolve(&table, 10, 17);
        assert_eq!(settled, 0);
        assert_eq!(transitions.first().map(|t| t.from), Some(2));
    }

    #[test]
    fn test_single_tier_table_is_noop() {
        let table = TierTable::from_pairs([("Only", 0)]).unwrap();
        assert_eq!(resolve(&table, u64::MAX, 0), (0, Vec::new()));
        assert_eq!(progress_percent(&table, 12, 0), 100.0);
    }

    #[test]
    fn test_progress_percent() {
        let table = three_tiers();
        assert_eq!(progress_percent(&table, 0, 0), 0.0);
        assert_eq!(progress_percent(&table, 2500, 0), 50.0);
        assert_eq!(progress_percent(&table, 15_000, 1), 50.0);
        // Not yet resolved: clamps just short of full instead of overflowing
        let pct = progress_percent(&table, 9000, 0);
        assert!(pct > 99.999 && pct < 100.0);
        assert_eq!(progress_percent(&table, 100, 1), 0.0);
        // Terminal tier
        assert_eq!(progress_percent(&table, 25_000, 2), 100.0);
    }

    #[test]
    fn test_huge_thresholds_never_round_to_full() {
        let table = TierTable::from_pairs([("Low", 0), ("High", 1 << 60)]).unwrap();
        let pct = progress_percent(&table, (1 << 60) - 1, 0);
        assert!(pct < 100.0);
        assert!(pct > 99.0);
        assert_eq!(progress_percent(&table, 1 << 60, 1), 100.0);
    }

    #[test]
    fn test_standard_ladder_restore() {
        let table = TierTable::standard();
        let (settled, _) = resolve(&table, 22_749_365, 6);
        assert_eq!(table.tier_at(settled).name, "Legendary");
    }

    proptest! {
        #[test]
        fn prop_resolution_settles_in_bracket(points in 0u64..3_000_000_000, start in 0usize..12) {
            let table = TierTable::standard();
            let (i, _) = resolve(&table, points, start);

            prop_assert!(i < table.count());
            prop_assert!(table.tier_at(i).min_points <= points || i == 0);
            if let Some(next) = table.next_after(i) {
                prop_assert!(points < next.min_points);
            }
            prop_assert_eq!(resolve_step(&table, points, i), None);
        }

        #[test]
        fn prop_progress_is_bounded(points in 0u64..3_000_000_000, start in 0usize..10) {
            let table = TierTable::standard();
            let (i, _) = resolve(&table, points, start);
            let pct = progress_percent(&table, points, i);

            prop_assert!((0.0..=100.0).contains(&pct));
            if table.is_terminal(i) {
                prop_assert_eq!(pct, 100.0);
            } else {
                prop_assert!(pct < 100.0);
            }
        }
    }
}
