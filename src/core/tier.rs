//! Tier Table
//!
//! Static, ordered ladder of named levels and their minimum point thresholds.
//! Ordering is significant: adjacency in the table defines which tiers a
//! player can be promoted or demoted into.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// TIER DEFINITION
// =============================================================================

/// One named bracket of the point scale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDefinition {
    /// Display name ("Bronze", "Silver", ...)
    pub name: String,
    /// Minimum points required to hold this tier
    pub min_points: u64,
}

impl TierDefinition {
    /// Create a tier definition.
    pub fn new(name: impl Into<String>, min_points: u64) -> Self {
        Self {
            name: name.into(),
            min_points,
        }
    }
}

/// Errors raised when building a tier table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TierTableError {
    /// Table has no tiers at all.
    #[error("tier table is empty")]
    Empty,
    /// First tier must start at zero points.
    #[error("first tier must start at 0 points, found {0}")]
    NonZeroFloor(u64),
    /// Thresholds must be strictly increasing.
    #[error("tier {index} threshold {min_points} does not exceed previous threshold {previous}")]
    NotIncreasing {
        /// Offending tier index
        index: usize,
        /// Its threshold
        min_points: u64,
        /// Threshold of the tier before it
        previous: u64,
    },
}

// =============================================================================
// TIER TABLE
// =============================================================================

/// Ten-tier ladder used by the live game.
const STANDARD_TIERS: [(&str, u64); 10] = [
    ("Bronze", 0),
    ("Silver", 5_000),
    ("Gold", 25_000),
    ("Platinum", 100_000),
    ("Diamond", 1_000_000),
    ("Epic", 2_000_000),
    ("Legendary", 10_000_000),
    ("Master", 50_000_000),
    ("GrandMaster", 100_000_000),
    ("Dungeon Master", 1_000_000_000),
];

/// Validated, immutable tier ladder.
///
/// Invariants (checked in [`TierTable::new`]):
/// - at least one tier
/// - first tier has `min_points == 0`
/// - `min_points` strictly increasing
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TierTable {
    tiers: Vec<TierDefinition>,
}

impl TierTable {
    /// Build a table, validating its ordering invariants.
    pub fn new(tiers: Vec<TierDefinition>) -> Result<Self, TierTableError> {
        let first = tiers.first().ok_or(TierTableError::Empty)?;
        if first.min_points != 0 {
            return Err(TierTableError::NonZeroFloor(first.min_points));
        }

        for (index, pair) in tiers.windows(2).enumerate() {
            if pair[1].min_points <= pair[0].min_points {
                return Err(TierTableError::NotIncreasing {
                    index: index + 1,
                    min_points: pair[1].min_points,
                    previous: pair[0].min_points,
                });
            }
        }

        Ok(Self { tiers })
    }

    /// Build a table from `(name, min_points)` pairs.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, TierTableError>
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, min)| TierDefinition::new(name, min))
                .collect(),
        )
    }

    /// The standard Bronze..Dungeon Master ladder.
    pub fn standard() -> Self {
        Self {
            tiers: STANDARD_TIERS
                .iter()
                .map(|(name, min)| TierDefinition::new(*name, *min))
                .collect(),
        }
    }

    /// Number of tiers.
    #[inline]
    pub fn count(&self) -> usize {
        self.tiers.len()
    }

    /// Index of the terminal (highest) tier.
    #[inline]
    pub fn last_index(&self) -> usize {
        self.tiers.len() - 1
    }

    /// Checked lookup.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&TierDefinition> {
        self.tiers.get(index)
    }

    /// Tier at `index`, clamped to the terminal tier.
    pub fn tier_at(&self, index: usize) -> &TierDefinition {
        &self.tiers[index.min(self.last_index())]
    }

    /// Tier following `index`, if one exists.
    pub fn next_after(&self, index: usize) -> Option<&TierDefinition> {
        index.checked_add(1).and_then(|next| self.tiers.get(next))
    }

    /// Whether `index` is the terminal tier (or beyond it).
    #[inline]
    pub fn is_terminal(&self, index: usize) -> bool {
        index >= self.last_index()
    }

    /// Iterate tiers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &TierDefinition> {
        self.tiers.iter()
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self::standard()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_is_valid() {
        let table = TierTable::standard();
        assert_eq!(table.count(), 10);
        assert_eq!(table.tier_at(0).name, "Bronze");
        assert_eq!(table.tier_at(9).name, "Dungeon Master");
        assert_eq!(TierTable::new(table.iter().cloned().collect()), Ok(table));
    }

    #[test]
    fn test_rejects_empty_table() {
        assert_eq!(TierTable::new(Vec::new()), Err(TierTableError::Empty));
    }

    #[test]
    fn test_rejects_nonzero_floor() {
        let result = TierTable::from_pairs([("Bronze", 10), ("Silver", 20)]);
        assert_eq!(result, Err(TierTableError::NonZeroFloor(10)));
    }

    #[test]
    fn test_rejects_non_increasing_thresholds() {
        let result = TierTable::from_pairs([("Bronze", 0), ("Silver", 500), ("Gold", 500)]);
        assert_eq!(
            result,
            Err(TierTableError::NotIncreasing {
                index: 2,
                min_points: 500,
                previous: 500,
            })
        );
    }

    #[test]
    fn test_lookup_helpers() {
        let table = TierTable::from_pairs([("Bronze", 0), ("Silver", 5000), ("Gold", 25000)]).unwrap();

        assert_eq!(table.last_index(), 2);
        assert_eq!(table.next_after(0).map(|t| t.min_points), Some(5000));
        assert!(table.next_after(2).is_none());
        assert!(table.get(3).is_none());

        // Out-of-range clamps to the top
        assert_eq!(table.tier_at(42).name, "Gold");
        assert!(table.is_terminal(2));
        assert!(!table.is_terminal(1));
    }
}
