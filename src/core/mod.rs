//! Core primitives.
//!
//! Pure, side-effect free building blocks shared by the game logic and the
//! host shell: the tier ladder and display formatting.

pub mod tier;
pub mod format;

// Re-export core types
pub use tier::{TierDefinition, TierTable, TierTableError};
pub use format::{format_points, format_profit_per_hour, tier_badge};
