//! Effect Queue
//!
//! Tracks the floating "+N" tap effects currently on screen. Each effect is
//! removed when its presentation layer reports the animation finished; the
//! queue itself keeps no timers.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Serialize};

/// Identifier of a tap effect, derived from its creation time in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TapEffectId(pub u64);

impl TapEffectId {
    /// Raw millisecond value.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TapEffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Screen position of a tap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TapCoordinates {
    /// Horizontal page coordinate
    pub x: f32,
    /// Vertical page coordinate
    pub y: f32,
}

impl TapCoordinates {
    /// Create coordinates.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Transient visual token for one tap.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TapEffect {
    /// Unique id within the session
    pub id: TapEffectId,
    /// Where the tap landed
    pub origin: TapCoordinates,
}

/// Open set of in-flight tap effects, ordered by creation.
#[derive(Clone, Debug, Default)]
pub struct EffectQueue {
    effects: BTreeMap<TapEffectId, TapEffect>,
}

impl EffectQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an effect to the open set.
    pub fn enqueue(&mut self, effect: TapEffect) {
        self.effects.insert(effect.id, effect);
    }

    /// Remove an effect by id.
    ///
    /// Unknown ids are ignored; returns whether anything was removed.
    pub fn expire(&mut self, id: TapEffectId) -> bool {
        self.effects.remove(&id).is_some()
    }

    /// Whether `id` is still on screen.
    pub fn contains(&self, id: TapEffectId) -> bool {
        self.effects.contains_key(&id)
    }

    /// Number of in-flight effects.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// True when nothing is on screen.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Iterate effects oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TapEffect> {
        self.effects.values()
    }
}
