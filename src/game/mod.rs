//! Game Logic Module
//!
//! Point state, tier progression, taps and idle income.
//!
//! ## Module Structure
//!
//! - `state`: Session state and display snapshot
//! - `progression`: Tier resolution and progress bar
//! - `tap`: Tap processing and effect ids
//! - `effects`: In-flight tap effects
//! - `accrual`: Idle-income clock
//! - `events`: Engine events
//! - `session`: Ordered application of every mutation

pub mod state;
pub mod progression;
pub mod tap;
pub mod effects;
pub mod accrual;
pub mod events;
pub mod session;

// Re-export key types
pub use state::{SessionState, SessionSnapshot, PointSource};
pub use progression::{resolve, resolve_step, progress_percent, TierTransition};
pub use tap::{TapProcessor, TapOutcome};
pub use effects::{EffectQueue, TapEffect, TapEffectId, TapCoordinates};
pub use accrual::{AccrualClock, per_second};
pub use events::EngineEvent;
pub use session::{Session, TapResult};
