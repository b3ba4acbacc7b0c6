//! Session State Definitions
//!
//! The single owned cell of mutable game state plus the read-only views
//! handed out to the host shell.

use serde::{Deserialize, Serialize};

// =============================================================================
// SESSION STATE
// =============================================================================

/// Point total and tier index for one play session.
///
/// Created at session start (from a cache, a remote pull or defaults) and
/// superseded by the next session. Only the [`Session`](crate::game::Session)
/// mutates it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionState {
    /// Accumulated coins
    pub points: u64,
    /// Index into the tier table
    pub tier_index: usize,
}

impl SessionState {
    /// Create a state.
    pub const fn new(points: u64, tier_index: usize) -> Self {
        Self { points, tier_index }
    }
}

/// Where a point-total change came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointSource {
    /// A user tap
    Tap,
    /// An idle accrual tick
    Idle,
    /// Balance pulled from the remote store at session start
    RemotePull,
    /// Explicit overwrite by the host
    Restore,
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Read-only view of a session for display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Current point total
    pub points: u64,
    /// Current tier index
    pub tier_index: usize,
    /// Name of the current tier
    pub tier_name: String,
    /// Number of tiers in the ladder
    pub tier_count: usize,
    /// Progress towards the next tier, 0..=100
    pub progress_percent: f64,
    /// Tap effects still on screen
    pub active_effects: usize,
}

impl SessionSnapshot {
    /// The plain state behind this snapshot.
    pub fn state(&self) -> SessionState {
        SessionState::new(self.points, self.tier_index)
    }
}
