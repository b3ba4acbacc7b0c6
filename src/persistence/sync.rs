//! State Synchronizer
//!
//! Bridges the in-memory point total to its persisted replica. The strategy
//! is picked per session:
//!
//! - **Local**: read the cached entries once, then write both on every change.
//! - **Remote**: pull the balance once via `CreateOrFetchUser`, then push each
//!   change with `UpdateCoins`, fire-and-forget.
//!
//! ```text
//! Uninitialized ──► Pulling ──► Ready
//!       │              │
//!       │              └──────► Fallback   (pull failed)
//!       └─────────────────────► Fallback   (remote mode, no identity)
//! ```
//!
//! Failures never reach the caller: the local value stays authoritative.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::game::state::SessionState;
use crate::persistence::identity::Identity;
use crate::persistence::local::{load_saved_state, save_state, LocalStore};
use crate::persistence::remote::RemoteStore;

// =============================================================================
// MODES & STATES
// =============================================================================

/// Persistence strategy for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
    /// Local cache only (guest / offline)
    #[default]
    Local,
    /// Remote coin store is the authority
    Remote,
}

/// Unrecognized persistence mode string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown persistence mode: {0}")]
pub struct UnknownModeError(pub String);

impl FromStr for PersistenceMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(PersistenceMode::Local),
            "remote" => Ok(PersistenceMode::Remote),
            other => Err(UnknownModeError(other.to_string())),
        }
    }
}

impl fmt::Display for PersistenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceMode::Local => write!(f, "local"),
            PersistenceMode::Remote => write!(f, "remote"),
        }
    }
}

/// Synchronizer lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Nothing loaded yet.
    Uninitialized,
    /// Remote pull in flight.
    Pulling,
    /// Loaded; every change is persisted.
    Ready,
    /// No persisted value available; running on defaults, nothing pushed.
    Fallback,
}

/// Clamp a pulled balance to a valid point total.
#[inline]
pub fn clamp_pulled(coins: i64) -> u64 {
    coins.max(0) as u64
}

// =============================================================================
// PENDING PULL
// =============================================================================

/// A remote pull that has been started but not yet run.
///
/// Detached from the synchronizer so the caller can await it without
/// blocking mutations; hand the result back with
/// [`StateSynchronizer::finish_pull`].
pub struct PendingPull {
    store: Arc<dyn RemoteStore>,
    identity: Identity,
}

impl PendingPull {
    /// Fetch the balance. Errors are logged and reported as `None`.
    pub async fn run(self) -> Option<u64> {
        match self.store.create_or_fetch_user(&self.identity).await {
            Ok(coins) => {
                if coins < 0 {
                    warn!(
                        "Remote balance for {} is negative ({}), clamping to 0",
                        self.identity.external_id, coins
                    );
                }
                Some(clamp_pulled(coins))
            }
            Err(e) => {
                warn!("Remote pull for {} failed: {}", self.identity.external_id, e);
                None
            }
        }
    }
}

impl fmt::Debug for PendingPull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingPull")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// SYNCHRONIZER
// =============================================================================

enum Backend {
    Local(Box<dyn LocalStore>),
    Remote {
        store: Arc<dyn RemoteStore>,
        identity: Option<Identity>,
    },
}

/// Reconciles the session state with its persisted replica.
pub struct StateSynchronizer {
    backend: Backend,
    state: SyncState,
}

impl StateSynchronizer {
    /// Local-cache strategy.
    pub fn local(store: impl LocalStore + 'static) -> Self {
        Self {
            backend: Backend::Local(Box::new(store)),
            state: SyncState::Uninitialized,
        }
    }

    /// Remote-authority strategy. A `None` identity is a guest session.
    pub fn remote(store: Arc<dyn RemoteStore>, identity: Option<Identity>) -> Self {
        Self {
            backend: Backend::Remote { store, identity },
            state: SyncState::Uninitialized,
        }
    }

    /// Strategy in use.
    pub fn mode(&self) -> PersistenceMode {
        match self.backend {
            Backend::Local(_) => PersistenceMode::Local,
            Backend::Remote { .. } => PersistenceMode::Remote,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Signed-in player, if any.
    pub fn identity(&self) -> Option<&Identity> {
        match &self.backend {
            Backend::Remote { identity, .. } => identity.as_ref(),
            Backend::Local(_) => None,
        }
    }

    /// Load the starting state. Runs at most once per session.
    ///
    /// Local mode reads the cache and is `Ready` immediately. Remote mode
    /// returns `defaults` together with a [`PendingPull`] to run; its result
    /// overwrites the points once it arrives.
    pub fn initialize(&mut self, defaults: SessionState) -> (SessionState, Option<PendingPull>) {
        if self.state != SyncState::Uninitialized {
            debug!("Synchronizer already initialized ({:?}), ignoring", self.state);
            return (defaults, None);
        }

        match &self.backend {
            Backend::Local(store) => {
                let loaded = load_saved_state(store.as_ref(), defaults);
                self.state = SyncState::Ready;
                info!("Loaded local state: {} points, tier {}", loaded.points, loaded.tier_index);
                (loaded, None)
            }
            Backend::Remote { identity: None, .. } => {
                self.state = SyncState::Fallback;
                info!("Guest session, remote sync disabled");
                (defaults, None)
            }
            Backend::Remote { store, identity: Some(identity) } => {
                self.state = SyncState::Pulling;
                let pull = PendingPull {
                    store: store.clone(),
                    identity: identity.clone(),
                };
                (defaults, Some(pull))
            }
        }
    }

    /// Complete a pull started by [`initialize`](Self::initialize).
    pub fn finish_pull(&mut self, pulled: Option<u64>) {
        if self.state != SyncState::Pulling {
            debug!("Pull result arrived in state {:?}, ignoring", self.state);
            return;
        }
        self.state = match pulled {
            Some(coins) => {
                info!("Remote balance restored: {} coins", coins);
                SyncState::Ready
            }
            None => {
                warn!("Remote balance unavailable, keeping local value");
                SyncState::Fallback
            }
        };
    }

    /// Initialize and, in remote mode, await the pull in place.
    ///
    /// The returned state carries the pulled points with the tier index
    /// still to be resolved by the caller.
    pub async fn pull(&mut self, defaults: SessionState) -> SessionState {
        let (mut state, pending) = self.initialize(defaults);
        if let Some(pending) = pending {
            let pulled = pending.run().await;
            if let Some(points) = pulled {
                state.points = points;
            }
            self.finish_pull(pulled);
        }
        state
    }

    /// Persist a committed change. Returns whether anything was written or sent.
    ///
    /// Remote pushes are spawned and never awaited; several may be in flight
    /// at once and the last to land wins.
    pub fn record(&mut self, state: &SessionState) -> bool {
        if self.state != SyncState::Ready {
            return false;
        }

        match &mut self.backend {
            Backend::Local(store) => {
                if let Err(e) = save_state(store.as_mut(), state) {
                    warn!("Failed to save local state: {}", e);
                }
                true
            }
            Backend::Remote { store, identity } => {
                let Some(identity) = identity else {
                    return false;
                };
                let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                    warn!("No async runtime, dropping push of {} coins", state.points);
                    return false;
                };

                let store = store.clone();
                let external_id = identity.external_id.clone();
                let SessionState { points, tier_index } = *state;

                runtime.spawn(async move {
                    match store.update_coins(&external_id, points, tier_index).await {
                        Ok(()) => debug!("Pushed {} coins for {}", points, external_id),
                        Err(e) => warn!("Push of {} coins for {} failed: {}", points, external_id, e),
                    }
                });
                true
            }
        }
    }
}

impl fmt::Debug for StateSynchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSynchronizer")
            .field("mode", &self.mode())
            .field("state", &self.state)
            .field("identity", &self.identity())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
