//! Engine Events
//!
//! Emitted by the session for every observable change, so the host shell and
//! the synchronizer can react without polling.

use serde::{Deserialize, Serialize};

use crate::game::effects::{TapCoordinates, TapEffectId};
use crate::game::state::PointSource;

/// Something that changed in the session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Point total changed
    PointsChanged {
        /// Total before the change
        old_points: u64,
        /// Total after the change
        new_points: u64,
        /// What caused it
        source: PointSource,
    },

    /// Tier index moved by one step
    TierChanged {
        /// Previous index
        from: usize,
        /// New index
        to: usize,
        /// Name of the new tier
        tier_name: String,
    },

    /// A tap effect appeared
    EffectSpawned {
        /// Effect id
        id: TapEffectId,
        /// Where it appeared
        origin: TapCoordinates,
    },

    /// A tap effect finished
    EffectExpired {
        /// Effect id
        id: TapEffectId,
    },
}

impl EngineEvent {
    /// Whether this event changed persisted state.
    pub fn is_state_change(&self) -> bool {
        matches!(
            self,
            EngineEvent::PointsChanged { .. } | EngineEvent::TierChanged { .. }
        )
    }
}
