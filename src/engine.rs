//! Engine Driver
//!
//! Runs one session on a single task. Taps, idle ticks, effect expiries and
//! the remote pull result all arrive as commands on one channel and are
//! applied in the order they were dispatched, so the session state never
//! needs a lock. The accrual clock, the pull and each effect timer are
//! separate tasks that only ever send commands back.

use std::sync::Arc;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::{ConfigError, EngineConfig};
use crate::core::tier::TierTable;
use crate::game::accrual::AccrualClock;
use crate::game::effects::{TapCoordinates, TapEffect, TapEffectId};
use crate::game::events::EngineEvent;
use crate::game::session::Session;
use crate::game::state::{PointSource, SessionSnapshot};
use crate::persistence::identity::Identity;
use crate::persistence::local::FileStore;
use crate::persistence::remote::{HttpRemoteStore, RemoteError};
use crate::persistence::sync::{PersistenceMode, StateSynchronizer, SyncState};

/// Capacity of the event broadcast channel.
const EVENT_CAPACITY: usize = 256;

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Remote store client could not be built.
    #[error("remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// The session task is gone.
    #[error("engine is not running")]
    Stopped,

    /// The session task panicked.
    #[error("engine task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Session view plus synchronizer status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Session state for display
    pub session: SessionSnapshot,
    /// Where persistence stands
    pub sync_state: SyncState,
    /// Configured idle income per hour
    pub profit_per_hour: u64,
}

enum Command {
    Tap {
        coordinates: TapCoordinates,
        reply: oneshot::Sender<TapEffect>,
    },
    ExpireEffect(TapEffectId),
    IdleTick(u64),
    RemotePulled(Option<u64>),
    Snapshot(oneshot::Sender<EngineSnapshot>),
    Shutdown,
}

/// Build the synchronizer the configuration asks for.
pub fn synchronizer_for(
    config: &EngineConfig,
    identity: Option<Identity>,
) -> Result<StateSynchronizer, EngineError> {
    match config.persistence_mode {
        PersistenceMode::Local => Ok(StateSynchronizer::local(FileStore::open(&config.state_path))),
        PersistenceMode::Remote => {
            let store = HttpRemoteStore::new(&config.remote_base_url, config.request_timeout)?;
            Ok(StateSynchronizer::remote(Arc::new(store), identity))
        }
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// A configured, not yet running session.
pub struct Engine {
    config: EngineConfig,
    table: TierTable,
    sync: StateSynchronizer,
}

impl Engine {
    /// Validate the configuration and prepare a session.
    pub fn new(config: EngineConfig, table: TierTable, sync: StateSynchronizer) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config, table, sync })
    }

    /// Start the session task. Must be called within a tokio runtime.
    pub fn spawn(self) -> EngineHandle {
        let (commands, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let task = tokio::spawn(self.run(commands.clone(), rx, events.clone()));

        EngineHandle {
            commands,
            events,
            task: Some(task),
        }
    }

    async fn run(
        self,
        commands: mpsc::UnboundedSender<Command>,
        mut rx: mpsc::UnboundedReceiver<Command>,
        events: broadcast::Sender<EngineEvent>,
    ) -> SessionSnapshot {
        let Engine { config, table, mut sync } = self;

        let (initial, pending) = sync.initialize(config.initial_state());
        let mut session = Session::new(table, initial);
        info!(
            "Session started: {} points, tier {} ({}), sync {:?}",
            session.state().points,
            session.state().tier_index,
            session.table().tier_at(session.state().tier_index).name,
            sync.state()
        );

        if let Some(pull) = pending {
            let tx = commands.clone();
            tokio::spawn(async move {
                let pulled = pull.run().await;
                let _ = tx.send(Command::RemotePulled(pulled));
            });
        }

        let mut clock = AccrualClock::new(config.tick_period);
        {
            let tx = commands.clone();
            clock.start(config.profit_per_hour, move |increment| {
                let _ = tx.send(Command::IdleTick(increment));
            });
        }

        while let Some(command) = rx.recv().await {
            match command {
                Command::Tap { coordinates, reply } => {
                    let result = session.tap(coordinates, config.tap_increment);
                    schedule_expiry(&commands, result.effect.id, config.effect_lifetime);
                    publish(&events, &mut sync, &session, result.events);
                    let _ = reply.send(result.effect);
                }
                Command::ExpireEffect(id) => {
                    if let Some(event) = session.expire_effect(id) {
                        let _ = events.send(event);
                    }
                }
                Command::IdleTick(increment) => {
                    let changes = session.accrue(increment);
                    publish(&events, &mut sync, &session, changes);
                }
                Command::RemotePulled(pulled) => {
                    if let Some(points) = pulled {
                        let changes = session.overwrite_points(points, PointSource::RemotePull);
                        publish(&events, &mut sync, &session, changes);
                    }
                    sync.finish_pull(pulled);
                }
                Command::Snapshot(reply) => {
                    let _ = reply.send(EngineSnapshot {
                        session: session.snapshot(),
                        sync_state: sync.state(),
                        profit_per_hour: config.profit_per_hour,
                    });
                }
                Command::Shutdown => break,
            }
        }

        clock.stop();
        let snapshot = session.snapshot();
        info!(
            "Session ended: {} points, tier {} ({})",
            snapshot.points, snapshot.tier_index, snapshot.tier_name
        );
        snapshot
    }
}

/// Forward events and persist the state if any of them changed it.
fn publish(
    events: &broadcast::Sender<EngineEvent>,
    sync: &mut StateSynchronizer,
    session: &Session,
    changes: Vec<EngineEvent>,
) {
    let changed = changes.iter().any(EngineEvent::is_state_change);
    for event in changes {
        // No subscribers is fine
        let _ = events.send(event);
    }
    if changed {
        sync.record(&session.state());
    }
}

/// One-shot timer standing in for the effect's animation-end callback.
fn schedule_expiry(commands: &mpsc::UnboundedSender<Command>, id: TapEffectId, lifetime: Duration) {
    let tx = commands.clone();
    tokio::spawn(async move {
        tokio::time::sleep(lifetime).await;
        let _ = tx.send(Command::ExpireEffect(id));
    });
}

// =============================================================================
// HANDLE
// =============================================================================

/// Control surface of a running session.
///
/// Dropping the handle ends the session.
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<EngineEvent>,
    task: Option<JoinHandle<SessionSnapshot>>,
}

impl EngineHandle {
    /// Register a tap and return the effect it spawned.
    pub async fn tap(&self, coordinates: TapCoordinates) -> Result<TapEffect, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Tap { coordinates, reply })?;
        rx.await.map_err(|_| EngineError::Stopped)
    }

    /// Report that an effect's animation finished. Unknown ids are ignored.
    pub fn expire(&self, id: TapEffectId) -> Result<(), EngineError> {
        self.send(Command::ExpireEffect(id))
    }

    /// Current state of the session.
    pub async fn snapshot(&self) -> Result<EngineSnapshot, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply))?;
        rx.await.map_err(|_| EngineError::Stopped)
    }

    /// Subscribe to events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// End the session, stop the clock and return the final state.
    pub async fn shutdown(mut self) -> Result<SessionSnapshot, EngineError> {
        let _ = self.commands.send(Command::Shutdown);
        let task = self.task.take().ok_or(EngineError::Stopped)?;
        Ok(task.await?)
    }

    fn send(&self, command: Command) -> Result<(), EngineError> {
        self.commands.send(command).map_err(|_| EngineError::Stopped)
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            debug!("Engine handle dropped, ending session");
            let _ = self.commands.send(Command::Shutdown);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
