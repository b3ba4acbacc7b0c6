//! Tap Processor
//!
//! Turns one tap into a point increment and a floating effect token.
//! There is no rate limiting: every tap is honored.

use chrono::Utc;

use crate::game::effects::{EffectQueue, TapCoordinates, TapEffect, TapEffectId};

/// Result of processing a tap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TapOutcome {
    /// Point total once the increment is committed
    pub new_points: u64,
    /// Effect that was enqueued
    pub effect: TapEffect,
}

/// Issues tap effects with collision-free, timestamp-derived ids.
#[derive(Clone, Debug, Default)]
pub struct TapProcessor {
    last_id: Option<u64>,
}

impl TapProcessor {
    /// Create a processor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a tap at the current wall-clock time.
    pub fn process_tap(
        &mut self,
        current_points: u64,
        coordinates: TapCoordinates,
        increment: u64,
        queue: &mut EffectQueue,
    ) -> TapOutcome {
        let now_ms = Utc::now().timestamp_millis().max(0) as u64;
        self.process_tap_at(now_ms, current_points, coordinates, increment, queue)
    }

    /// Process a tap at an explicit time (milliseconds since the epoch).
    ///
    /// The effect is enqueued; committing `new_points` is the caller's job.
    pub fn process_tap_at(
        &mut self,
        now_ms: u64,
        current_points: u64,
        coordinates: TapCoordinates,
        increment: u64,
        queue: &mut EffectQueue,
    ) -> TapOutcome {
        let effect = TapEffect {
            id: self.allocate_id(now_ms),
            origin: coordinates,
        };
        queue.enqueue(effect);

        TapOutcome {
            new_points: current_points.saturating_add(increment),
            effect,
        }
    }

    /// Timestamp id, bumped past the previous one on same-millisecond taps
    /// or a clock that stepped backwards.
    fn allocate_id(&mut self, now_ms: u64) -> TapEffectId {
        let id = match self.last_id {
            Some(last) if now_ms <= last => last + 1,
            _ => now_ms,
        };
        self.last_id = Some(id);
        TapEffectId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tap_adds_increment_and_enqueues() {
        let mut taps = TapProcessor::new();
        let mut queue = EffectQueue::new();

        let outcome = taps.process_tap_at(1_000, 4990, TapCoordinates::new(1.0, 2.0), 5, &mut queue);

        assert_eq!(outcome.new_points, 4995);
        assert_eq!(outcome.effect.id, TapEffectId(1_000));
        assert!(queue.contains(outcome.effect.id));
    }

    #[test]
    fn test_consecutive_millis_give_distinct_ids() {
        let mut taps = TapProcessor::new();
        let mut queue = EffectQueue::new();

        let first = taps.process_tap_at(5_000, 0, TapCoordinates::default(), 5, &mut queue);
        let second = taps.process_tap_at(5_001, 5, TapCoordinates::default(), 5, &mut queue);
        assert_ne!(first.effect.id, second.effect.id);

        assert!(queue.expire(first.effect.id));
        assert!(queue.contains(second.effect.id));
    }

    #[test]
    fn test_same_millisecond_taps_do_not_collide() {
        let mut taps = TapProcessor::new();
        let mut queue = EffectQueue::new();

        for _ in 0..10 {
            taps.process_tap_at(7_000, 0, TapCoordinates::default(), 5, &mut queue);
        }
        // Clock stepping backwards must not collide either
        taps.process_tap_at(6_000, 0, TapCoordinates::default(), 5, &mut queue);

        assert_eq!(queue.len(), 11);
    }

    #[test]
    fn test_points_saturate() {
        let mut taps = TapProcessor::new();
        let mut queue = EffectQueue::new();
        let outcome = taps.process_tap_at(1, u64::MAX - 1, TapCoordinates::default(), 5, &mut queue);
        assert_eq!(outcome.new_points, u64::MAX);
    }

    #[test]
    fn test_wall_clock_tap() {
        let mut taps = TapProcessor::new();
        let mut queue = EffectQueue::new();
        let a = taps.process_tap(0, TapCoordinates::default(), 5, &mut queue);
        let b = taps.process_tap(a.new_points, TapCoordinates::default(), 5, &mut queue);
        assert!(b.effect.id > a.effect.id);
        assert_eq!(b.new_points, 10);
    }
}
