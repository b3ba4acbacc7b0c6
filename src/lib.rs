//! # Tapcoin Engine
//!
//! Progression and idle-accrual engine for a single-screen tap-to-earn game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TAPCOIN ENGINE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Pure primitives                          │
//! │  ├── tier.rs      - Tier ladder and thresholds               │
//! │  └── format.rs    - Point and rate labels                    │
//! │                                                              │
//! │  game/            - Game logic (synchronous)                 │
//! │  ├── state.rs     - Session state and snapshot               │
//! │  ├── progression.rs - Tier resolution, progress bar          │
//! │  ├── tap.rs       - Tap processing                           │
//! │  ├── effects.rs   - In-flight tap effects                    │
//! │  ├── accrual.rs   - Idle-income clock                        │
//! │  ├── events.rs    - Engine events                            │
//! │  └── session.rs   - Ordered mutation of the state            │
//! │                                                              │
//! │  persistence/     - Storage (may suspend, never fails)       │
//! │  ├── identity.rs  - Host-supplied player identity            │
//! │  ├── protocol.rs  - Remote store JSON bodies                 │
//! │  ├── local.rs     - Local cache                              │
//! │  ├── remote.rs    - Remote coin store                        │
//! │  └── sync.rs      - State synchronizer                       │
//! │                                                              │
//! │  engine.rs        - Single-task session driver               │
//! │  config.rs        - Engine configuration                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency
//!
//! The in-memory point total is the only authority. Every mutation (tap,
//! idle tick, remote pull) is applied in dispatch order on one task; the
//! persisted copy is a best-effort replica that may lag or drop writes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod persistence;
pub mod config;
pub mod engine;

// Re-export commonly used types
pub use crate::core::tier::{TierDefinition, TierTable};
pub use game::state::{SessionState, SessionSnapshot};
pub use game::effects::{TapCoordinates, TapEffect, TapEffectId};
pub use game::events::EngineEvent;
pub use config::EngineConfig;
pub use engine::{Engine, EngineHandle, EngineSnapshot, EngineError};
pub use persistence::{Identity, PersistenceMode, StateSynchronizer};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Seconds in an hour, for rate conversion.
pub const SECONDS_PER_HOUR: u64 = 3600;

/// Points added per tap.
pub const DEFAULT_TAP_INCREMENT: u64 = 5;

/// Idle income per hour.
pub const DEFAULT_PROFIT_PER_HOUR: u64 = 593_043;
