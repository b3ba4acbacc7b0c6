//! Game Session
//!
//! Owns the session state and applies every mutation in order: taps, idle
//! ticks and overwrites all go through [`Session::commit`], which re-resolves
//! the tier and reports what changed as [`EngineEvent`]s.

use tracing::info;

use crate::core::tier::TierTable;
use crate::game::effects::{EffectQueue, TapCoordinates, TapEffect, TapEffectId};
use crate::game::events::EngineEvent;
use crate::game::progression::{progress_percent, resolve};
use crate::game::state::{PointSource, SessionSnapshot, SessionState};
use crate::game::tap::TapProcessor;

/// Result of a tap applied to the session.
#[derive(Debug)]
pub struct TapResult {
    /// Effect spawned for the tap
    pub effect: TapEffect,
    /// Events produced, in order
    pub events: Vec<EngineEvent>,
}

/// One play session.
#[derive(Debug)]
pub struct Session {
    table: TierTable,
    state: SessionState,
    effects: EffectQueue,
    taps: TapProcessor,
}

impl Session {
    /// Start a session from an initial state.
    ///
    /// The tier index is settled against the points silently; a restored
    /// state is not a transition.
    pub fn new(table: TierTable, initial: SessionState) -> Self {
        let (tier_index, _) = resolve(&table, initial.points, initial.tier_index);
        Self {
            table,
            state: SessionState::new(initial.points, tier_index),
            effects: EffectQueue::new(),
            taps: TapProcessor::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Tier ladder in use.
    pub fn table(&self) -> &TierTable {
        &self.table
    }

    /// In-flight tap effects.
    pub fn effects(&self) -> &EffectQueue {
        &self.effects
    }

    /// Apply a tap now.
    pub fn tap(&mut self, coordinates: TapCoordinates, increment: u64) -> TapResult {
        let outcome = self
            .taps
            .process_tap(self.state.points, coordinates, increment, &mut self.effects);
        self.finish_tap(outcome.effect, outcome.new_points)
    }

    /// Apply a tap at an explicit timestamp (milliseconds).
    pub fn tap_at(&mut self, now_ms: u64, coordinates: TapCoordinates, increment: u64) -> TapResult {
        let outcome = self.taps.process_tap_at(
            now_ms,
            self.state.points,
            coordinates,
            increment,
            &mut self.effects,
        );
        self.finish_tap(outcome.effect, outcome.new_points)
    }

    fn finish_tap(&mut self, effect: TapEffect, new_points: u64) -> TapResult {
        let mut events = vec![EngineEvent::EffectSpawned {
            id: effect.id,
            origin: effect.origin,
        }];
        events.extend(self.commit(new_points, PointSource::Tap));
        TapResult { effect, events }
    }

    /// Apply one idle tick. Zero increments change nothing.
    pub fn accrue(&mut self, increment: u64) -> Vec<EngineEvent> {
        if increment == 0 {
            return Vec::new();
        }
        let new_points = self.state.points.saturating_add(increment);
        self.commit(new_points, PointSource::Idle)
    }

    /// Replace the point total outright (remote pull, restore).
    pub fn overwrite_points(&mut self, points: u64, source: PointSource) -> Vec<EngineEvent> {
        self.commit(points, source)
    }

    /// Remove a finished tap effect. Unknown ids produce no event.
    pub fn expire_effect(&mut self, id: TapEffectId) -> Option<EngineEvent> {
        self.effects
            .expire(id)
            .then_some(EngineEvent::EffectExpired { id })
    }

    /// Progress towards the next tier, 0..=100.
    pub fn progress_percent(&self) -> f64 {
        progress_percent(&self.table, self.state.points, self.state.tier_index)
    }

    /// Display view of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            points: self.state.points,
            tier_index: self.state.tier_index,
            tier_name: self.table.tier_at(self.state.tier_index).name.clone(),
            tier_count: self.table.count(),
            progress_percent: self.progress_percent(),
            active_effects: self.effects.len(),
        }
    }

    /// Write the new total and settle the tier.
    fn commit(&mut self, new_points: u64, source: PointSource) -> Vec<EngineEvent> {
        let old_points = self.state.points;
        if new_points == old_points {
            return Vec::new();
        }

        self.state.points = new_points;
        let mut events = vec![EngineEvent::PointsChanged {
            old_points,
            new_points,
            source,
        }];

        let (tier_index, transitions) = resolve(&self.table, new_points, self.state.tier_index);
        self.state.tier_index = tier_index;

        for step in transitions {
            let tier_name = self.table.tier_at(step.to).name.clone();
            info!(
                "Tier {} -> {} ({}) at {} points",
                step.from, step.to, tier_name, new_points
            );
            events.push(EngineEvent::TierChanged {
                from: step.from,
                to: step.to,
                tier_name,
            });
        }

        events
    }
}

// =============================================================================
// TESTS
// =============================================================================
