//! Engine Configuration
//!
//! Defaults match the live game; every field can be overridden from
//! `TAPCOIN_*` environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::game::state::SessionState;
use crate::persistence::sync::PersistenceMode;
use crate::{DEFAULT_PROFIT_PER_HOUR, DEFAULT_TAP_INCREMENT};

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Taps would never earn anything.
    #[error("tap increment must be positive")]
    ZeroTapIncrement,
    /// Idle income rate must be positive.
    #[error("profit per hour must be positive")]
    ZeroProfitRate,
    /// A period of zero would spin.
    #[error("{0} must be non-zero")]
    ZeroDuration(&'static str),
    /// Remote mode needs somewhere to talk to.
    #[error("remote persistence requires a store url")]
    MissingRemoteUrl,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Points added per tap.
    pub tap_increment: u64,
    /// Idle income per hour.
    pub profit_per_hour: u64,
    /// Period of the accrual clock.
    pub tick_period: Duration,
    /// How long a tap effect stays on screen.
    pub effect_lifetime: Duration,
    /// Persistence strategy.
    pub persistence_mode: PersistenceMode,
    /// Base URL of the remote coin store.
    pub remote_base_url: String,
    /// Per-request timeout for the remote store.
    pub request_timeout: Duration,
    /// Local cache file.
    pub state_path: PathBuf,
    /// Points when nothing is persisted.
    pub default_points: u64,
    /// Tier index when nothing is persisted.
    pub default_tier_index: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tap_increment: DEFAULT_TAP_INCREMENT,
            profit_per_hour: DEFAULT_PROFIT_PER_HOUR,
            tick_period: Duration::from_secs(1),
            effect_lifetime: Duration::from_secs(1),
            persistence_mode: PersistenceMode::Local,
            remote_base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout: Duration::from_secs(10),
            state_path: PathBuf::from("tapcoin-state.json"),
            default_points: 0,
            default_tier_index: 0,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup, starting from defaults.
    ///
    /// Values that fail to parse are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "TAPCOIN_TAP_INCREMENT") {
            config.tap_increment = v;
        }
        if let Some(v) = parse_var(&lookup, "TAPCOIN_PROFIT_PER_HOUR") {
            config.profit_per_hour = v;
        }
        if let Some(v) = parse_var(&lookup, "TAPCOIN_PERSISTENCE") {
            config.persistence_mode = v;
        }
        if let Some(v) = lookup("TAPCOIN_REMOTE_URL") {
            config.remote_base_url = v;
        }
        if let Some(v) = lookup("TAPCOIN_STATE_PATH") {
            config.state_path = PathBuf::from(v);
        }
        if let Some(v) = parse_var(&lookup, "TAPCOIN_DEFAULT_POINTS") {
            config.default_points = v;
        }
        if let Some(v) = parse_var(&lookup, "TAPCOIN_DEFAULT_LEVEL") {
            config.default_tier_index = v;
        }

        config
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tap_increment == 0 {
            return Err(ConfigError::ZeroTapIncrement);
        }
        if self.profit_per_hour == 0 {
            return Err(ConfigError::ZeroProfitRate);
        }
        if self.tick_period.is_zero() {
            return Err(ConfigError::ZeroDuration("tick period"));
        }
        if self.effect_lifetime.is_zero() {
            return Err(ConfigError::ZeroDuration("effect lifetime"));
        }
        if self.persistence_mode == PersistenceMode::Remote && self.remote_base_url.trim().is_empty() {
            return Err(ConfigError::MissingRemoteUrl);
        }
        Ok(())
    }

    /// Built-in starting state.
    pub fn initial_state(&self) -> SessionState {
        SessionState::new(self.default_points, self.default_tier_index)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}
